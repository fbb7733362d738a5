//! Similarity retrieval over a built index
//!
//! The retriever embeds the query, asks the store for the top `k` entries
//! (optionally restricted by a metadata filter) and applies the score
//! threshold. "Nothing indexed" and "nothing good enough" are separate
//! outcomes so callers can say which one happened.

mod filter;

pub use filter::*;

use crate::embed::{embed_one, Embedder};
use crate::error::{Error, Result};
use crate::store::{ChunkPayload, IndexStore, SearchFilter};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// One retrieved chunk
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub text: String,
    pub payload: ChunkPayload,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

#[derive(Debug, Clone)]
pub enum RetrievalOutcome {
    /// Results at or above the threshold, best first
    Found(Vec<RetrievalResult>),
    /// The index (or the filtered part of it) has no entries
    NoMatches,
    /// Candidates exist but none reach the threshold
    BelowThreshold { best_score: f32 },
}

/// Check `k` and `threshold` without clamping
pub fn validate_query_params(query: &str, k: usize, threshold: f32) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::Validation("Query must not be empty".to_string()));
    }
    if k == 0 {
        return Err(Error::Validation("k must be at least 1".to_string()));
    }
    if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
        return Err(Error::Validation(format!(
            "threshold must be between -1.0 and 1.0, got {}",
            threshold
        )));
    }
    Ok(())
}

pub struct Retriever {
    embedder: Box<dyn Embedder>,
    store: IndexStore,
}

impl Retriever {
    pub fn new(embedder: Box<dyn Embedder>, store: IndexStore) -> Self {
        let manifest = store.manifest();
        if manifest.embedding_model != embedder.model_name() {
            warn!(
                "Index was built with {} but queries use {}; scores may be meaningless",
                manifest.embedding_model,
                embedder.model_name()
            );
        }
        Self { embedder, store }
    }

    /// Open the index at `path` for querying
    pub async fn open(embedder: Box<dyn Embedder>, path: &Path) -> Result<Self> {
        let store = IndexStore::open(path).await?;
        Ok(Self::new(embedder, store))
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub async fn retrieve(
        &self,
        query: &str,
        k: usize,
        threshold: f32,
        filter: Option<&MetadataFilter>,
    ) -> Result<RetrievalOutcome> {
        validate_query_params(query, k, threshold)?;

        let query_vector = embed_one(self.embedder.as_ref(), query).await?;
        let search_filter = filter.map(SearchFilter::from);
        let hits = self
            .store
            .search(&query_vector, k, search_filter.as_ref())
            .await?;

        let Some(best_score) = hits.first().map(|h| h.score) else {
            debug!("No candidates for query");
            return Ok(RetrievalOutcome::NoMatches);
        };

        for (i, hit) in hits.iter().enumerate() {
            debug!(
                "  {}. {} ({}): {:.3}",
                i + 1,
                hit.payload.subject,
                hit.payload.source,
                hit.score
            );
        }

        let results: Vec<RetrievalResult> = hits
            .into_iter()
            .filter(|h| h.score >= threshold)
            .map(|h| RetrievalResult {
                text: h.text,
                payload: h.payload,
                score: h.score,
            })
            .collect();
        debug!("Results above threshold ({}): {}", threshold, results.len());

        if results.is_empty() {
            return Ok(RetrievalOutcome::BelowThreshold { best_score });
        }
        Ok(RetrievalOutcome::Found(results))
    }
}
