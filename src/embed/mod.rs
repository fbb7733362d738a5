//! Embedding generation
//!
//! This module provides an abstraction over embedding services with:
//! - A trait for different embedding backends
//! - An OpenAI-compatible HTTP backend
//! - Batch processing with per-batch retries for index builds

mod http_backend;

pub use http_backend::*;

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Trait for embedding providers
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a batch of texts
    async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension
    fn dimension(&self) -> usize;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create an embedder based on configuration
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    let embedder = HttpEmbedder::new(config)?;
    Ok(Box::new(embedder))
}

/// Embed a single text, typically a query
pub async fn embed_one(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
    embedder
        .embed(vec![text.to_string()])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::Embedding("No embedding returned".to_string()))
}

/// Embed in batches, retrying a failed batch up to `max_retries` times
///
/// `on_batch` is called with the number of texts finished after each batch.
pub async fn embed_in_batches<F>(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
    max_retries: usize,
    mut on_batch: F,
) -> Result<Vec<Vec<f32>>>
where
    F: FnMut(usize),
{
    let mut all_embeddings = Vec::with_capacity(texts.len());

    for chunk in texts.chunks(batch_size.max(1)) {
        let mut attempt = 0;
        let embeddings = loop {
            match embedder.embed(chunk.to_vec()).await {
                Ok(embeddings) => break embeddings,
                Err(e) if attempt < max_retries => {
                    attempt += 1;
                    warn!(
                        "Embedding batch failed (attempt {}/{}): {}",
                        attempt,
                        max_retries + 1,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(200 * attempt as u64)).await;
                }
                Err(e) => return Err(e),
            }
        };

        if embeddings.len() != chunk.len() {
            return Err(Error::Embedding(format!(
                "Batch of {} texts returned {} embeddings",
                chunk.len(),
                embeddings.len()
            )));
        }

        all_embeddings.extend(embeddings);
        on_batch(chunk.len());
    }

    Ok(all_embeddings)
}

/// Cosine similarity; 0.0 when either vector is empty, zero, or the lengths differ
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails the first `failures` calls, then returns one-hot vectors
    struct FlakyEmbedder {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for FlakyEmbedder {
        async fn embed(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(Error::Upstream {
                    service: "embedding".to_string(),
                    message: "503".to_string(),
                });
            }
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimension(&self) -> usize {
            2
        }

        fn model_name(&self) -> &str {
            "flaky"
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text {}", i)).collect()
    }

    #[tokio::test]
    async fn test_batches_keep_order() {
        let embedder = FlakyEmbedder {
            failures: 0,
            calls: AtomicUsize::new(0),
        };
        let input = vec!["a".to_string(), "bb".to_string(), "ccc".to_string()];
        let mut progress = Vec::new();
        let out = embed_in_batches(&embedder, &input, 2, 0, |n| progress.push(n))
            .await
            .unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out[2][0], 3.0);
        assert_eq!(progress, vec![2, 1]);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_batch_retry_recovers() {
        let embedder = FlakyEmbedder {
            failures: 1,
            calls: AtomicUsize::new(0),
        };
        let out = embed_in_batches(&embedder, &texts(4), 10, 2, |_| {})
            .await
            .unwrap();
        assert_eq!(out.len(), 4);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_batch_retry_exhausted() {
        let embedder = FlakyEmbedder {
            failures: 5,
            calls: AtomicUsize::new(0),
        };
        let err = embed_in_batches(&embedder, &texts(4), 10, 1, |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_embed_one() {
        let embedder = FlakyEmbedder {
            failures: 0,
            calls: AtomicUsize::new(0),
        };
        assert_eq!(embed_one(&embedder, "abcd").await.unwrap(), vec![4.0, 1.0]);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }
}
