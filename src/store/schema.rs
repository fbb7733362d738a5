//! SQLite schema for the vector index

/// SQL schema for a freshly built index
pub const SCHEMA_SQL: &str = r#"
-- Build manifest: metric, model, dimension, counts, timestamps
CREATE TABLE IF NOT EXISTS index_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- One row per chunk; rowid order is insertion order
CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY,
    chunk_text TEXT NOT NULL,
    payload_json TEXT NOT NULL,
    embedding BLOB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_subject
    ON entries(json_extract(payload_json, '$.subject'));
CREATE INDEX IF NOT EXISTS idx_entries_source
    ON entries(json_extract(payload_json, '$.source'));
"#;

/// Similarity metric recorded in every manifest
pub const METRIC_COSINE: &str = "cosine";
