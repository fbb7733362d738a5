//! Init command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

/// Where `init` wrote its files
#[derive(Debug, Clone)]
pub struct InitResult {
    pub config_path: PathBuf,
    pub corpus_dir: PathBuf,
}

/// Write a default config under `base_dir` and create the corpus directory
pub fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<InitResult> {
    let mut config = Config::default();
    config.init_paths(base_dir);

    if config.paths.config_file.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config.paths.config_file.display()
        )));
    }

    config.save()?;

    let corpus_dir = config.corpus_dir();
    std::fs::create_dir_all(&corpus_dir)?;
    info!("Created corpus directory {}", corpus_dir.display());

    Ok(InitResult {
        config_path: config.paths.config_file.clone(),
        corpus_dir,
    })
}
