//! Default values for configuration

use std::path::PathBuf;

/// Default transcript directory (relative to the config directory)
pub fn default_corpus_dir() -> PathBuf {
    PathBuf::from("transcripts")
}

/// Default vector index file (relative to the config directory)
pub fn default_index_path() -> PathBuf {
    PathBuf::from("index.db")
}

/// Default OpenAI-compatible embedding endpoint
pub fn default_embedding_url() -> String {
    std::env::var("MOTIVATE_EMBEDDING_URL")
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

/// Default embedding dimension (text-embedding-3-small)
pub fn default_embedding_dimension() -> usize {
    1536
}

/// Environment variable holding the API key for both services
pub fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

/// Default batch size for embedding
pub fn default_embedding_batch_size() -> usize {
    64
}

/// Default embedding request timeout in seconds
pub fn default_embedding_timeout() -> u64 {
    30
}

/// Default retries for a failed embedding batch during ingestion
pub fn default_embedding_batch_retries() -> usize {
    2
}

/// Default OpenAI-compatible chat endpoint
pub fn default_generation_url() -> String {
    std::env::var("MOTIVATE_GENERATION_URL")
        .unwrap_or_else(|_| "https://api.openai.com/v1".to_string())
}

/// Default chat model
pub fn default_generation_model() -> String {
    "gpt-3.5-turbo".to_string()
}

/// Deterministic decoding
pub fn default_generation_temperature() -> f32 {
    0.0
}

/// Default generation request timeout in seconds
pub fn default_generation_timeout() -> u64 {
    60
}

/// Default maximum characters per chunk
pub fn default_chunk_max_chars() -> usize {
    1200
}

/// Default overlap characters between chunks
pub fn default_chunk_overlap() -> usize {
    250
}

/// Split points, highest priority first; "" is a raw character boundary
pub fn default_chunk_separators() -> Vec<String> {
    ["\n\n\n", "\n\n", "\n", ". ", "; ", ", ", " ", ""]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Default number of chunks retrieved per query
pub fn default_query_k() -> usize {
    10
}

/// Default minimum relevance score
pub fn default_query_threshold() -> f32 {
    0.4
}

/// Default number of queries kept by the interactive shell
pub fn default_history_size() -> usize {
    50
}
