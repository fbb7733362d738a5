//! Ingest command implementation

use crate::catalog::Catalog;
use crate::chunk::{split_documents, Chunk};
use crate::config::Config;
use crate::embed::{create_embedder, Embedder};
use crate::error::{Error, Result};
use crate::index::build_index;
use crate::loader::{load_documents, LoadReport, SkippedFile};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::info;

/// Size of one loaded transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub source: String,
    pub subject: String,
    pub chars: usize,
}

/// Statistics from an ingestion run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    pub corpus_dir: String,
    pub index_path: String,
    pub documents: Vec<DocumentSummary>,
    pub skipped: Vec<SkippedFile>,
    pub chunks_created: usize,
    pub chunks_per_subject: BTreeMap<String, usize>,
    pub unique_subjects: Vec<String>,
    pub unique_themes: Vec<String>,
    pub embedding_model: String,
    pub dimension: usize,
    pub built_at: String,
}

impl IngestStats {
    /// Corpus summary for a load and its chunks; index fields are left empty
    pub fn summarize(report: &LoadReport, chunks: &[Chunk]) -> Self {
        let documents = report
            .documents
            .iter()
            .map(|d| DocumentSummary {
                source: d.source.clone(),
                subject: d.metadata.subject.clone(),
                chars: d.content.chars().count(),
            })
            .collect();

        let mut chunks_per_subject = BTreeMap::new();
        let mut themes = BTreeSet::new();
        for chunk in chunks {
            *chunks_per_subject
                .entry(chunk.metadata.subject.clone())
                .or_insert(0) += 1;
            themes.extend(chunk.metadata.themes.iter().cloned());
        }

        Self {
            documents,
            skipped: report.skipped.clone(),
            chunks_created: chunks.len(),
            unique_subjects: chunks_per_subject.keys().cloned().collect(),
            chunks_per_subject,
            unique_themes: themes.into_iter().collect(),
            ..Default::default()
        }
    }
}

/// Load, chunk, embed and index the transcript corpus
pub async fn cmd_ingest(config: &Config, corpus_dir: Option<PathBuf>) -> Result<IngestStats> {
    let embedder = create_embedder(&config.embedding)?;
    ingest_with(config, corpus_dir, embedder.as_ref()).await
}

/// [`cmd_ingest`] with a caller-supplied embedder
pub async fn ingest_with(
    config: &Config,
    corpus_dir: Option<PathBuf>,
    embedder: &dyn Embedder,
) -> Result<IngestStats> {
    let corpus_dir = corpus_dir.unwrap_or_else(|| config.corpus_dir());
    let index_path = config.index_path();
    info!("Ingesting transcripts from {}", corpus_dir.display());

    let catalog = Catalog::from_optional_path(config.catalog_path().as_deref())?;
    let report = load_documents(&corpus_dir, &catalog)?;
    if report.documents.is_empty() {
        return Err(Error::Config(format!(
            "No catalogued transcripts found in {} ({} files skipped)",
            corpus_dir.display(),
            report.skipped.len()
        )));
    }
    info!("Loaded {} documents", report.documents.len());

    let chunks = split_documents(&report.documents, &config.chunk);
    info!(
        "Split {} documents into {} chunks",
        report.documents.len(),
        chunks.len()
    );

    let manifest = build_index(&chunks, embedder, &index_path, &config.embedding).await?;

    let mut stats = IngestStats::summarize(&report, &chunks);
    stats.corpus_dir = corpus_dir.display().to_string();
    stats.index_path = index_path.display().to_string();
    stats.embedding_model = manifest.embedding_model;
    stats.dimension = manifest.dimension;
    stats.built_at = manifest.built_at;
    Ok(stats)
}

/// Print ingestion statistics
pub fn print_ingest_stats(stats: &IngestStats) {
    println!("\n✓ Ingestion complete");
    println!("  Corpus: {}", stats.corpus_dir);
    println!("  Index:  {}", stats.index_path);

    println!("\n📄 Documents loaded: {}", stats.documents.len());
    for doc in &stats.documents {
        println!("  {} ({}): {} chars", doc.source, doc.subject, doc.chars);
    }

    if !stats.skipped.is_empty() {
        println!("\n⚠️  Skipped files: {}", stats.skipped.len());
        for skipped in &stats.skipped {
            println!("  {}: {}", skipped.source, skipped.reason);
        }
    }

    println!("\n📊 Chunks created: {}", stats.chunks_created);
    for (subject, count) in &stats.chunks_per_subject {
        println!("  {}: {}", subject, count);
    }

    println!("\nUnique subjects: {}", stats.unique_subjects.join(", "));
    println!("Unique themes: {}", stats.unique_themes.join(", "));
    println!(
        "\nEmbedded with {} ({} dimensions)",
        stats.embedding_model, stats.dimension
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::IndexStore;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct ConstantEmbedder;

    #[async_trait]
    impl Embedder for ConstantEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "constant"
        }
    }

    fn config(tmp: &TempDir) -> Config {
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.chunk.max_chars = 200;
        config.chunk.overlap_chars = 40;
        config
    }

    #[tokio::test]
    async fn test_ingest_builds_index_and_summary() {
        let tmp = TempDir::new().unwrap();
        let corpus = tmp.path().join("transcripts");
        std::fs::create_dir_all(&corpus).unwrap();
        std::fs::write(corpus.join("elon.md"), "Build the factory. ".repeat(40)).unwrap();
        std::fs::write(corpus.join("dyson.md"), "Five thousand prototypes.").unwrap();
        std::fs::write(corpus.join("unknown.md"), "Not in the catalog.").unwrap();

        let config = config(&tmp);
        let stats = ingest_with(&config, None, &ConstantEmbedder).await.unwrap();

        assert_eq!(stats.documents.len(), 2);
        assert_eq!(stats.skipped.len(), 1);
        assert_eq!(stats.skipped[0].source, "unknown.md");
        assert_eq!(stats.unique_subjects, vec!["Elon Musk", "James Dyson"]);
        assert_eq!(stats.chunks_per_subject["James Dyson"], 1);
        assert!(stats.chunks_per_subject["Elon Musk"] > 1);
        assert!(stats.unique_themes.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(stats.embedding_model, "constant");

        let store = IndexStore::open(&config.index_path()).await.unwrap();
        assert_eq!(store.count().await.unwrap(), stats.chunks_created);
    }

    #[tokio::test]
    async fn test_ingest_without_documents_fails() {
        let tmp = TempDir::new().unwrap();
        let corpus = tmp.path().join("transcripts");
        std::fs::create_dir_all(&corpus).unwrap();
        std::fs::write(corpus.join("unknown.md"), "Not in the catalog.").unwrap();

        let err = ingest_with(&config(&tmp), None, &ConstantEmbedder)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(!config(&tmp).index_path().exists());
    }
}
