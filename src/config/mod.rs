//! Configuration management for motivate
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! Relative paths in the file resolve against the directory holding it.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the transcript markdown files
    #[serde(default = "default_corpus_dir")]
    pub corpus_dir: PathBuf,

    /// Location of the persisted vector index
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Optional TOML metadata catalog; the bundled Founders catalog is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_path: Option<PathBuf>,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generative model configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunk: ChunkConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_embedding_url")]
    pub base_url: String,

    /// Model name/identifier
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension (must match model)
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Environment variable name for the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Batch size for embedding
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,

    /// Request timeout in seconds
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    /// Retries for a failed batch while building the index
    #[serde(default = "default_embedding_batch_retries")]
    pub max_batch_retries: usize,
}

/// Generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_generation_url")]
    pub base_url: String,

    /// Chat model name
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Environment variable name for the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Sampling temperature
    #[serde(default = "default_generation_temperature")]
    pub temperature: f32,

    /// Optional completion length cap
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Request timeout in seconds
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkConfig {
    /// Maximum characters per chunk
    #[serde(default = "default_chunk_max_chars")]
    pub max_chars: usize,

    /// Overlap characters between consecutive chunks of one document
    #[serde(default = "default_chunk_overlap")]
    pub overlap_chars: usize,

    /// Split points in priority order
    #[serde(default = "default_chunk_separators")]
    pub separators: Vec<String>,
}

/// Query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Default number of chunks to retrieve
    #[serde(default = "default_query_k")]
    pub default_k: usize,

    /// Default minimum relevance score (-1.0 - 1.0)
    #[serde(default = "default_query_threshold")]
    pub default_threshold: f32,

    /// Queries remembered by the interactive shell
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for motivate data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_dir: default_corpus_dir(),
            index_path: default_index_path(),
            catalog_path: None,
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            chunk: ChunkConfig::default(),
            query: QueryConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_embedding_url(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            api_key_env: default_api_key_env(),
            batch_size: default_embedding_batch_size(),
            timeout_secs: default_embedding_timeout(),
            max_batch_retries: default_embedding_batch_retries(),
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_generation_url(),
            model: default_generation_model(),
            api_key_env: default_api_key_env(),
            temperature: default_generation_temperature(),
            max_tokens: None,
            timeout_secs: default_generation_timeout(),
        }
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chars: default_chunk_max_chars(),
            overlap_chars: default_chunk_overlap(),
            separators: default_chunk_separators(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_k: default_query_k(),
            default_threshold: default_query_threshold(),
            history_size: default_history_size(),
        }
    }
}

/// Read an API key from the named environment variable
pub fn api_key_from_env(var: &str) -> Option<String> {
    if var.is_empty() {
        return None;
    }
    std::env::var(var).ok().filter(|k| !k.trim().is_empty())
}

impl Config {
    /// Get the default base directory for motivate (~/.motivate)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".motivate")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Resolve a configured path against the config directory
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.paths.base_dir.join(path)
        }
    }

    /// Absolute transcript directory
    pub fn corpus_dir(&self) -> PathBuf {
        self.resolve(&self.corpus_dir)
    }

    /// Absolute vector index location
    pub fn index_path(&self) -> PathBuf {
        self.resolve(&self.index_path)
    }

    /// Absolute catalog location, if one is configured
    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.catalog_path.as_deref().map(|p| self.resolve(p))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk.max_chars == 0 {
            return Err(Error::Config("chunk.max_chars must be positive".to_string()));
        }

        if self.chunk.overlap_chars >= self.chunk.max_chars {
            return Err(Error::Config(
                "chunk.overlap_chars must be < chunk.max_chars".to_string(),
            ));
        }

        if self.chunk.separators.is_empty() {
            return Err(Error::Config(
                "chunk.separators must list at least one separator".to_string(),
            ));
        }

        if self.embedding.dimension == 0 || self.embedding.batch_size == 0 {
            return Err(Error::Config(
                "embedding.dimension and embedding.batch_size must be positive".to_string(),
            ));
        }

        if self.embedding.timeout_secs == 0 || self.generation.timeout_secs == 0 {
            return Err(Error::Config("service timeouts must be positive".to_string()));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(Error::Config(
                "generation.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.query.default_k == 0 {
            return Err(Error::Config("query.default_k must be at least 1".to_string()));
        }

        if !(-1.0..=1.0).contains(&self.query.default_threshold) {
            return Err(Error::Config(
                "query.default_threshold must be between -1.0 and 1.0".to_string(),
            ));
        }

        if self.query.history_size == 0 {
            return Err(Error::Config("query.history_size must be at least 1".to_string()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chunk.max_chars, 1200);
        assert_eq!(config.chunk.overlap_chars, 250);
        assert_eq!(config.chunk.separators.len(), 8);
        assert_eq!(config.query.default_k, 10);
        assert!((config.query.default_threshold - 0.4).abs() < f32::EPSILON);
        assert_eq!(config.generation.temperature, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.embedding.model = "nomic-embed-text".to_string();
        config.embedding.dimension = 768;

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.embedding.model, "nomic-embed-text");
        assert_eq!(loaded.embedding.dimension, 768);
        assert_eq!(loaded.chunk.separators, default_chunk_separators());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "corpus_dir = \"docs\"\n\n[query]\ndefault_k = 5\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.query.default_k, 5);
        assert!((config.query.default_threshold - 0.4).abs() < f32::EPSILON);
        assert_eq!(config.corpus_dir(), tmp.path().join("docs"));
        assert_eq!(config.index_path(), tmp.path().join("index.db"));
        assert!(config.catalog_path().is_none());
    }

    #[test]
    fn test_absolute_paths_kept() {
        let mut config = Config::default();
        config.init_paths(Some(PathBuf::from("/srv/motivate")));
        config.index_path = PathBuf::from("/var/lib/motivate/index.db");
        assert_eq!(config.index_path(), PathBuf::from("/var/lib/motivate/index.db"));
        assert_eq!(
            config.corpus_dir(),
            PathBuf::from("/srv/motivate/transcripts")
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Invalid: overlap >= max
        config.chunk.overlap_chars = config.chunk.max_chars;
        assert!(config.validate().is_err());
        config.chunk.overlap_chars = 100;
        assert!(config.validate().is_ok());

        config.query.default_threshold = 1.5;
        assert!(config.validate().is_err());
        config.query.default_threshold = -0.2;
        assert!(config.validate().is_ok());

        config.query.default_k = 0;
        assert!(config.validate().is_err());
        config.query.default_k = 3;

        config.chunk.separators.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_api_key_from_env_empty_name() {
        assert!(api_key_from_env("").is_none());
    }
}
