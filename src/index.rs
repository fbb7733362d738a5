//! Vector index builder
//!
//! Embeds every chunk and writes a fresh index. A build either replaces the
//! live index completely or leaves it untouched.

use crate::chunk::Chunk;
use crate::config::EmbeddingConfig;
use crate::embed::{embed_in_batches, Embedder};
use crate::error::{Error, Result};
use crate::progress::{advance_progress, finish_progress, start_progress_bar};
use crate::store::{ChunkPayload, IndexBuilder, IndexEntry, IndexManifest};
use std::path::Path;
use tracing::{info, warn};

/// Rows written per transaction
const INSERT_BATCH: usize = 256;

/// Embed `chunks` and atomically replace the index at `path`
pub async fn build_index(
    chunks: &[Chunk],
    embedder: &dyn Embedder,
    path: &Path,
    config: &EmbeddingConfig,
) -> Result<IndexManifest> {
    if chunks.is_empty() {
        return Err(Error::Validation(
            "No chunks to index; check the corpus directory and catalog".to_string(),
        ));
    }

    info!(
        "Embedding {} chunks with {} (batch size {})",
        chunks.len(),
        embedder.model_name(),
        config.batch_size
    );

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let pb = start_progress_bar(texts.len(), "embedding chunks");
    let embedded = embed_in_batches(
        embedder,
        &texts,
        config.batch_size,
        config.max_batch_retries,
        |done| advance_progress(&pb, done),
    )
    .await;
    let embeddings = match embedded {
        Ok(embeddings) => {
            finish_progress(pb, "embedded");
            embeddings
        }
        Err(e) => {
            finish_progress(pb, "failed");
            return Err(e);
        }
    };

    let entries: Vec<IndexEntry> = chunks
        .iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| IndexEntry {
            text: chunk.text.clone(),
            payload: ChunkPayload::from(chunk),
            embedding,
        })
        .collect();

    let mut builder = IndexBuilder::create(path, embedder.dimension(), embedder.model_name()).await?;
    for batch in entries.chunks(INSERT_BATCH) {
        if let Err(e) = builder.insert(batch).await {
            warn!("Index build failed, keeping the previous index: {}", e);
            builder.abort().await;
            return Err(e);
        }
    }

    builder.commit().await
}
