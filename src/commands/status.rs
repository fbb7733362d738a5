//! Status command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{IndexManifest, IndexStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectCount {
    pub subject: String,
    pub chunks: usize,
}

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub corpus_dir: String,
    pub index_path: String,
    pub embedding_model: String,
    pub generation_model: String,
    pub index_exists: bool,
    pub manifest: Option<IndexManifest>,
    pub chunk_count: usize,
    pub subjects: Vec<SubjectCount>,
}

/// Get system status
pub async fn cmd_status(config: &Config) -> Result<StatusInfo> {
    info!("Getting status");

    let index_path = config.index_path();
    let mut status = StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        corpus_dir: config.corpus_dir().display().to_string(),
        index_path: index_path.display().to_string(),
        embedding_model: config.embedding.model.clone(),
        generation_model: config.generation.model.clone(),
        index_exists: false,
        manifest: None,
        chunk_count: 0,
        subjects: Vec::new(),
    };

    let store = match IndexStore::open(&index_path).await {
        Ok(store) => store,
        Err(Error::IndexNotFound(path)) => {
            debug!("No index at {}", path);
            return Ok(status);
        }
        Err(e) => return Err(e),
    };

    status.index_exists = true;
    status.chunk_count = store.count().await?;
    status.subjects = store
        .count_by("subject")
        .await?
        .into_iter()
        .map(|(subject, chunks)| SubjectCount { subject, chunks })
        .collect();
    status.manifest = Some(store.manifest().clone());
    store.close().await;

    Ok(status)
}

/// Print status information
pub fn print_status(status: &StatusInfo) {
    println!("📊 motivate status\n");
    println!("Config: {}", status.config_path);
    println!("Corpus: {}", status.corpus_dir);
    println!("Index:  {}", status.index_path);
    println!("Embedding model:  {}", status.embedding_model);
    println!("Generation model: {}", status.generation_model);

    let Some(manifest) = &status.manifest else {
        println!("\n✗ No index built yet. Run 'motivate ingest'.");
        return;
    };

    println!("\n✓ Index built {}", manifest.built_at);
    println!(
        "  {} chunks, {} dimensions, {} similarity, model {}",
        status.chunk_count, manifest.dimension, manifest.metric, manifest.embedding_model
    );
    if manifest.embedding_model != status.embedding_model {
        println!(
            "  ⚠️  Configured embedding model differs from the index; re-run 'motivate ingest'"
        );
    }

    if !status.subjects.is_empty() {
        println!("\nSubjects:");
        for s in &status.subjects {
            println!("  {}: {} chunks", s.subject, s.chunks);
        }
    }
}
