//! Persisted vector index on SQLite
//!
//! An index is a single SQLite file holding chunk text, a flat JSON payload
//! and a little-endian f32 embedding per entry. Builds always go to a staging
//! file that is renamed over the live index once complete, so readers see
//! either the previous index or the new one, never a partial build.

mod payload;
mod schema;

pub use payload::*;
pub use schema::*;

use crate::embed::cosine_similarity;
use crate::error::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::FromRow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Exact string-equality constraint on one payload field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub key: String,
    pub value: String,
}

impl SearchFilter {
    /// JSON path of the filtered field; the key must already be validated
    fn json_path(&self) -> String {
        format!("$.{}", self.key)
    }
}

/// A chunk with its embedding, ready to insert
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub text: String,
    pub payload: ChunkPayload,
    pub embedding: Vec<f32>,
}

/// A scored search hit
#[derive(Debug, Clone)]
pub struct SearchHit {
    /// Insertion position in the index
    pub id: i64,
    pub score: f32,
    pub text: String,
    pub payload: ChunkPayload,
}

/// Facts about a build, stored in the index itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexManifest {
    pub metric: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub built_at: String,
}

impl IndexManifest {
    fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self> {
        let map: HashMap<String, String> = pairs.into_iter().collect();
        let get = |key: &str| {
            map.get(key)
                .cloned()
                .ok_or_else(|| Error::Other(format!("Index manifest is missing '{}'", key)))
        };
        let parse_usize = |key: &str| -> Result<usize> {
            get(key)?
                .parse()
                .map_err(|_| Error::Other(format!("Index manifest has invalid '{}'", key)))
        };

        Ok(Self {
            metric: get("metric")?,
            embedding_model: get("embedding_model")?,
            dimension: parse_usize("dimension")?,
            chunk_count: parse_usize("chunk_count")?,
            built_at: get("built_at")?,
        })
    }
}

#[derive(Debug, FromRow)]
struct EntryRow {
    id: i64,
    chunk_text: String,
    payload_json: String,
    embedding: Vec<u8>,
}

/// Encode an embedding as a little-endian f32 blob
pub fn vec_to_blob(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a little-endian f32 blob
pub fn blob_to_vec(blob: &[u8]) -> Result<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return Err(Error::Other(format!(
            "Corrupt embedding blob of {} bytes",
            blob.len()
        )));
    }
    Ok(blob
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn staging_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "index.db".to_string());
    target.with_file_name(format!("{}.staging-{}", name, Uuid::new_v4().simple()))
}

/// Writes a new index into a staging file and swaps it in on commit
pub struct IndexBuilder {
    pool: SqlitePool,
    staging: PathBuf,
    target: PathBuf,
    dimension: usize,
    embedding_model: String,
    count: usize,
}

impl IndexBuilder {
    /// Start a build that will replace the index at `target`
    pub async fn create(target: &Path, dimension: usize, embedding_model: &str) -> Result<Self> {
        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let staging = staging_path_for(target);
        debug!("Building index in staging file {:?}", staging);

        let options = SqliteConnectOptions::new()
            .filename(&staging)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete)
            .synchronous(SqliteSynchronous::Full);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(SCHEMA_SQL).execute(&pool).await?;

        Ok(Self {
            pool,
            staging,
            target: target.to_path_buf(),
            dimension,
            embedding_model: embedding_model.to_string(),
            count: 0,
        })
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    /// Insert entries in one transaction
    pub async fn insert(&mut self, entries: &[IndexEntry]) -> Result<()> {
        if let Some(bad) = entries.iter().find(|e| e.embedding.len() != self.dimension) {
            return Err(Error::Embedding(format!(
                "Embedding for chunk {} has dimension {}, index expects {}",
                bad.payload.chunk_index,
                bad.embedding.len(),
                self.dimension
            )));
        }

        let mut tx = self.pool.begin().await?;
        for entry in entries {
            sqlx::query(
                "INSERT INTO entries (chunk_text, payload_json, embedding) VALUES (?, ?, ?)",
            )
            .bind(&entry.text)
            .bind(serde_json::to_string(&entry.payload)?)
            .bind(vec_to_blob(&entry.embedding))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        self.count += entries.len();
        Ok(())
    }

    /// Write the manifest and atomically replace the live index
    pub async fn commit(self) -> Result<IndexManifest> {
        let manifest = IndexManifest {
            metric: METRIC_COSINE.to_string(),
            embedding_model: self.embedding_model.clone(),
            dimension: self.dimension,
            chunk_count: self.count,
            built_at: Utc::now().to_rfc3339(),
        };

        let write = async {
            let mut tx = self.pool.begin().await?;
            for (key, value) in [
                ("metric", manifest.metric.clone()),
                ("embedding_model", manifest.embedding_model.clone()),
                ("dimension", manifest.dimension.to_string()),
                ("chunk_count", manifest.chunk_count.to_string()),
                ("built_at", manifest.built_at.clone()),
            ] {
                sqlx::query("INSERT OR REPLACE INTO index_meta (key, value) VALUES (?, ?)")
                    .bind(key)
                    .bind(value)
                    .execute(&mut *tx)
                    .await?;
            }
            tx.commit().await?;
            Ok::<(), Error>(())
        };

        if let Err(e) = write.await {
            self.abort().await;
            return Err(e);
        }

        self.pool.close().await;

        if let Err(e) = std::fs::rename(&self.staging, &self.target) {
            let _ = std::fs::remove_file(&self.staging);
            return Err(e.into());
        }

        info!(
            "Index with {} entries written to {}",
            manifest.chunk_count,
            self.target.display()
        );
        Ok(manifest)
    }

    /// Discard the staging file, leaving any live index untouched
    pub async fn abort(self) {
        self.pool.close().await;
        if let Err(e) = std::fs::remove_file(&self.staging) {
            warn!("Failed to remove staging index {:?}: {}", self.staging, e);
        }
    }
}

/// Read-only handle on a built index
pub struct IndexStore {
    pool: SqlitePool,
    path: PathBuf,
    manifest: IndexManifest,
}

impl IndexStore {
    /// Open an existing index
    pub async fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::IndexNotFound(path.display().to_string()));
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .journal_mode(SqliteJournalMode::Delete);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let pairs: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM index_meta")
            .fetch_all(&pool)
            .await?;
        let manifest = IndexManifest::from_pairs(pairs)?;
        debug!(
            "Opened index {:?}: {} entries, dimension {}",
            path, manifest.chunk_count, manifest.dimension
        );

        Ok(Self {
            pool,
            path: path.to_path_buf(),
            manifest,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    /// Number of entries
    pub async fn count(&self) -> Result<usize> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    /// Entries per distinct value of a payload field, sorted by value
    pub async fn count_by(&self, field: &str) -> Result<Vec<(String, usize)>> {
        let rows: Vec<(Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT CAST(json_extract(payload_json, ?) AS TEXT) AS value, COUNT(*)
            FROM entries
            GROUP BY value
            ORDER BY value
            "#,
        )
        .bind(format!("$.{}", field))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(value, count)| value.map(|v| (v, count as usize)))
            .collect())
    }

    /// Top `limit` entries by cosine similarity, restricted by `filter` before scoring
    ///
    /// Ties keep insertion order.
    pub async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<SearchHit>> {
        if query_vector.len() != self.manifest.dimension {
            return Err(Error::Embedding(format!(
                "Query embedding has dimension {}, index was built with {}",
                query_vector.len(),
                self.manifest.dimension
            )));
        }

        let rows: Vec<EntryRow> = match filter {
            Some(filter) => {
                sqlx::query_as::<_, EntryRow>(
                    r#"
                    SELECT id, chunk_text, payload_json, embedding
                    FROM entries
                    WHERE CAST(json_extract(payload_json, ?) AS TEXT) = ?
                    ORDER BY id
                    "#,
                )
                .bind(filter.json_path())
                .bind(&filter.value)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, EntryRow>(
                    "SELECT id, chunk_text, payload_json, embedding FROM entries ORDER BY id",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        debug!("Scoring {} candidate entries", rows.len());

        let mut hits = rows
            .into_iter()
            .map(|row| {
                let embedding = blob_to_vec(&row.embedding)?;
                Ok(SearchHit {
                    id: row.id,
                    score: cosine_similarity(query_vector, &embedding),
                    text: row.chunk_text,
                    payload: serde_json::from_str(&row.payload_json)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // stable sort: equal scores stay in id order
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(limit);

        Ok(hits)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) fn payload(source: &str, subject: &str, chunk_index: usize) -> ChunkPayload {
        ChunkPayload {
            source: source.to_string(),
            source_type: "podcast".to_string(),
            podcast_name: "Founders".to_string(),
            episode_number: if source == "dyson.md" { Some(400) } else { None },
            subject: subject.to_string(),
            company: "Co".to_string(),
            industry: "technology".to_string(),
            themes: "vision, execution".to_string(),
            key_concepts: "focus".to_string(),
            time_period: "2000s".to_string(),
            stage: "early".to_string(),
            chunk_index,
            total_chunks: 0,
            start_index: 0,
            chunk_hash: format!("hash-{}", chunk_index),
        }
    }

    pub(crate) fn entry(
        source: &str,
        subject: &str,
        chunk_index: usize,
        embedding: Vec<f32>,
    ) -> IndexEntry {
        IndexEntry {
            text: format!("{} chunk {}", subject, chunk_index),
            payload: payload(source, subject, chunk_index),
            embedding,
        }
    }

    async fn build(path: &Path, entries: Vec<IndexEntry>) -> IndexManifest {
        let mut builder = IndexBuilder::create(path, 2, "test-model").await.unwrap();
        builder.insert(&entries).await.unwrap();
        builder.commit().await.unwrap()
    }

    #[test]
    fn test_blob_round_trip() {
        let v = vec![0.25f32, -1.5, 3.0];
        assert_eq!(blob_to_vec(&vec_to_blob(&v)).unwrap(), v);
        assert!(blob_to_vec(&[1, 2, 3]).is_err());
    }

    #[tokio::test]
    async fn test_build_and_search_ordering() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.db");
        let manifest = build(
            &path,
            vec![
                entry("elon.md", "Elon Musk", 0, vec![0.6, 0.8]),
                entry("dyson.md", "James Dyson", 1, vec![1.0, 0.0]),
                entry("elon2.md", "Elon Musk", 2, vec![0.6, 0.8]),
                entry("billgates.md", "Bill Gates", 3, vec![0.0, 1.0]),
            ],
        )
        .await;
        assert_eq!(manifest.chunk_count, 4);
        assert_eq!(manifest.metric, "cosine");

        let store = IndexStore::open(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 4);
        assert_eq!(store.manifest().dimension, 2);

        let hits = store.search(&[1.0, 0.0], 10, None).await.unwrap();
        let order: Vec<usize> = hits.iter().map(|h| h.payload.chunk_index).collect();
        // 1.0, then the tied 0.6 pair in insertion order, then 0.0
        assert_eq!(order, vec![1, 0, 2, 3]);
        assert!((hits[1].score - 0.6).abs() < 1e-6);

        let top = store.search(&[1.0, 0.0], 2, None).await.unwrap();
        assert_eq!(top.len(), 2);
    }

    #[tokio::test]
    async fn test_search_prefilter() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.db");
        build(
            &path,
            vec![
                entry("dyson.md", "James Dyson", 0, vec![1.0, 0.0]),
                entry("elon.md", "Elon Musk", 1, vec![0.0, 1.0]),
                entry("elon2.md", "Elon Musk", 2, vec![0.1, 1.0]),
            ],
        )
        .await;
        let store = IndexStore::open(&path).await.unwrap();

        let filter = SearchFilter {
            key: "subject".to_string(),
            value: "Elon Musk".to_string(),
        };
        // the unfiltered best match is excluded before the top-k cut
        let hits = store.search(&[1.0, 0.0], 1, Some(&filter)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload.subject, "Elon Musk");

        let numeric = SearchFilter {
            key: "episode_number".to_string(),
            value: "400".to_string(),
        };
        let hits = store.search(&[1.0, 0.0], 5, Some(&numeric)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload.source, "dyson.md");

        let none = SearchFilter {
            key: "subject".to_string(),
            value: "elon musk".to_string(),
        };
        assert!(store.search(&[1.0, 0.0], 5, Some(&none)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_count_by_subject() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.db");
        build(
            &path,
            vec![
                entry("elon.md", "Elon Musk", 0, vec![1.0, 0.0]),
                entry("dyson.md", "James Dyson", 1, vec![1.0, 0.0]),
                entry("elon2.md", "Elon Musk", 2, vec![1.0, 0.0]),
            ],
        )
        .await;
        let store = IndexStore::open(&path).await.unwrap();
        assert_eq!(
            store.count_by("subject").await.unwrap(),
            vec![("Elon Musk".to_string(), 2), ("James Dyson".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_open_missing_index() {
        let tmp = TempDir::new().unwrap();
        let err = IndexStore::open(&tmp.path().join("index.db")).await.err().unwrap();
        assert!(matches!(err, Error::IndexNotFound(_)));
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.db");
        build(&path, vec![entry("elon.md", "Elon Musk", 0, vec![1.0, 0.0])]).await;
        let store = IndexStore::open(&path).await.unwrap();
        let err = store.search(&[1.0, 0.0, 0.0], 5, None).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn test_rebuild_replaces_and_abort_keeps_previous() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("index.db");
        build(
            &path,
            vec![
                entry("elon.md", "Elon Musk", 0, vec![1.0, 0.0]),
                entry("elon.md", "Elon Musk", 1, vec![1.0, 0.0]),
            ],
        )
        .await;

        // a failed build leaves the live index alone
        let mut builder = IndexBuilder::create(&path, 2, "test-model").await.unwrap();
        builder
            .insert(&[entry("dyson.md", "James Dyson", 0, vec![0.0, 1.0])])
            .await
            .unwrap();
        let bad = builder
            .insert(&[entry("dyson.md", "James Dyson", 1, vec![0.0, 1.0, 0.0])])
            .await;
        assert!(bad.is_err());
        let staging = builder.staging_path().to_path_buf();
        builder.abort().await;
        assert!(!staging.exists());

        let store = IndexStore::open(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 2);
        store.close().await;

        // a full rebuild leaves no stale entries
        build(&path, vec![entry("dyson.md", "James Dyson", 0, vec![0.0, 1.0])]).await;
        let store = IndexStore::open(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        let hits = store.search(&[0.0, 1.0], 5, None).await.unwrap();
        assert_eq!(hits[0].payload.subject, "James Dyson");

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("staging"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
