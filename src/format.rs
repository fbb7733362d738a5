//! Transcript line-break formatter
//!
//! Raw transcripts often arrive as one enormous line. Breaking them into
//! paragraphs at sentence ends gives the chunker paragraph boundaries to
//! prefer.

use crate::error::{Error, Result};
use crate::loader::find_markdown_files;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Files with more line breaks than this are left alone
pub const FORMATTED_LINE_THRESHOLD: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FormatOutcome {
    AlreadyFormatted { lines: usize },
    Unchanged,
    Formatted { before_lines: usize, after_lines: usize },
    Failed { message: String },
}

impl FormatOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, FormatOutcome::Formatted { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFormat {
    pub file: String,
    #[serde(flatten)]
    pub outcome: FormatOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FormatReport {
    pub dry_run: bool,
    pub files: Vec<FileFormat>,
}

impl FormatReport {
    pub fn formatted_count(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.changed()).count()
    }
}

pub struct TranscriptFormatter {
    sentence_end: Regex,
    exclamation_end: Regex,
    blank_runs: Regex,
}

fn line_count(text: &str) -> usize {
    text.matches('\n').count()
}

impl TranscriptFormatter {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::Other(format!("Invalid pattern: {}", e)))
        };
        Ok(Self {
            sentence_end: compile(r#"\. ([A-Z"])"#)?,
            exclamation_end: compile(r#"([!?]) ([A-Z"])"#)?,
            blank_runs: compile(r"\n{3,}")?,
        })
    }

    /// Insert paragraph breaks after sentences; `None` if the text is already formatted
    pub fn format_text(&self, text: &str) -> Option<String> {
        if line_count(text) > FORMATTED_LINE_THRESHOLD {
            return None;
        }
        let text = self.sentence_end.replace_all(text, ".\n\n${1}");
        let text = self.exclamation_end.replace_all(&text, "${1}\n\n${2}");
        Some(self.blank_runs.replace_all(&text, "\n\n").into_owned())
    }

    /// Format one file in place unless `dry_run`
    pub fn format_file(&self, path: &Path, dry_run: bool) -> FormatOutcome {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                return FormatOutcome::Failed {
                    message: e.to_string(),
                }
            }
        };

        let before_lines = line_count(&content);
        let Some(formatted) = self.format_text(&content) else {
            return FormatOutcome::AlreadyFormatted {
                lines: before_lines,
            };
        };
        if formatted == content {
            return FormatOutcome::Unchanged;
        }

        if !dry_run {
            if let Err(e) = std::fs::write(path, &formatted) {
                return FormatOutcome::Failed {
                    message: e.to_string(),
                };
            }
        }

        FormatOutcome::Formatted {
            before_lines,
            after_lines: line_count(&formatted),
        }
    }

    /// Format every `.md` file in `dir`, in name order
    pub fn format_dir(&self, dir: &Path, dry_run: bool) -> Result<FormatReport> {
        let mut report = FormatReport {
            dry_run,
            files: Vec::new(),
        };

        for path in find_markdown_files(dir)? {
            let outcome = self.format_file(&path, dry_run);
            let file = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());

            match &outcome {
                FormatOutcome::Failed { message } => warn!("Failed to format {}: {}", file, message),
                other => debug!("{}: {:?}", file, other),
            }
            report.files.push(FileFormat { file, outcome });
        }

        Ok(report)
    }
}
