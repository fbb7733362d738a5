//! Transcript loading and metadata enrichment
//!
//! Reads the top-level `*.md` files of a corpus directory and pairs each with
//! its catalog entry. Loading is best-effort: files without metadata, empty
//! files and undecodable files are skipped with a warning.

use crate::catalog::{Catalog, DocumentMetadata};
use crate::error::{Error, Result};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A transcript with its catalog metadata
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    /// File name, also the catalog key
    pub source: String,
    pub metadata: DocumentMetadata,
}

/// Why a corpus file was left out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    NotInCatalog,
    Empty,
    Unreadable(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotInCatalog => write!(f, "no metadata in catalog"),
            SkipReason::Empty => write!(f, "file is empty"),
            SkipReason::Unreadable(msg) => write!(f, "unreadable: {}", msg),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub source: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Documents loaded from a corpus directory plus the files that were skipped
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub documents: Vec<Document>,
    pub skipped: Vec<SkippedFile>,
}

/// List the markdown files directly inside `dir`, sorted by name
pub fn find_markdown_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::Config(format!(
            "Corpus directory not found: {}",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = WalkBuilder::new(dir)
        .max_depth(Some(1))
        .hidden(true)
        .git_ignore(false)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.into_path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "md"))
        .collect();

    files.sort();
    Ok(files)
}

/// Load and enrich every catalogued transcript in `dir`
pub fn load_documents(dir: &Path, catalog: &Catalog) -> Result<LoadReport> {
    let files = find_markdown_files(dir)?;
    debug!("Found {} markdown files in {}", files.len(), dir.display());

    let mut report = LoadReport::default();

    for path in files {
        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        match load_one(&path, &filename, catalog) {
            Ok(document) => {
                info!(
                    "Enriched {} with metadata ({} chars)",
                    filename,
                    document.content.chars().count()
                );
                report.documents.push(document);
            }
            Err(reason) => {
                warn!("Skipping {}: {}", filename, reason);
                report.skipped.push(SkippedFile {
                    source: filename,
                    reason,
                });
            }
        }
    }

    Ok(report)
}

fn load_one(
    path: &Path,
    filename: &str,
    catalog: &Catalog,
) -> std::result::Result<Document, SkipReason> {
    let metadata = catalog.get(filename).ok_or(SkipReason::NotInCatalog)?;

    let bytes = std::fs::read(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    let content = String::from_utf8(bytes)
        .map_err(|_| SkipReason::Unreadable("not valid UTF-8".to_string()))?;

    if content.trim().is_empty() {
        return Err(SkipReason::Empty);
    }

    Ok(Document {
        content,
        source: filename.to_string(),
        metadata: metadata.clone(),
    })
}
