//! Document metadata catalog
//!
//! Maps a transcript file name to the structured metadata attached to every
//! chunk cut from it. The bundled catalog covers the Founders episodes; a
//! TOML file with the same layout can replace it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

const BUILTIN_CATALOG: &str = include_str!("founders.toml");

/// Separator used when tag lists are flattened for storage
pub const TAG_DELIMITER: &str = ", ";

/// Structured metadata for one transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source_type: String,
    pub podcast_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    pub subject: String,
    pub company: String,
    pub industry: String,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub key_concepts: Vec<String>,
    pub time_period: String,
    pub stage: String,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    documents: BTreeMap<String, DocumentMetadata>,
}

/// Immutable file name → metadata lookup
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: BTreeMap<String, DocumentMetadata>,
}

impl Catalog {
    /// The bundled Founders catalog
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CATALOG)
    }

    /// Load a catalog from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading catalog from {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read catalog {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Load the configured catalog, or the bundled one when none is set
    pub fn from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    /// Parse catalog TOML
    pub fn parse(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;
        let catalog = Self {
            entries: file.documents,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        for (filename, meta) in &self.entries {
            if meta.subject.trim().is_empty() {
                return Err(Error::Config(format!(
                    "Catalog entry '{}' has an empty subject",
                    filename
                )));
            }

            let bad_tag = meta
                .themes
                .iter()
                .chain(meta.key_concepts.iter())
                .find(|tag| tag.contains(',') || tag.trim().is_empty());
            if let Some(tag) = bad_tag {
                return Err(Error::Config(format!(
                    "Catalog entry '{}' has invalid tag '{}': tags must be non-empty and comma-free",
                    filename, tag
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, filename: &str) -> Option<&DocumentMetadata> {
        self.entries.get(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// File names in sorted order
    pub fn filenames(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Flatten a tag list into the scalar form the index stores
pub fn join_tags(tags: &[String]) -> String {
    tags.join(TAG_DELIMITER)
}

/// Reverse of [`join_tags`]
pub fn split_tags(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
