//! Format command implementation

use crate::error::Result;
use crate::format::{FormatOutcome, FormatReport, TranscriptFormatter};
use std::path::Path;
use tracing::info;

/// Add paragraph breaks to the transcripts in `dir`
pub fn cmd_format(dir: &Path, dry_run: bool) -> Result<FormatReport> {
    info!(
        "{} transcripts in {}",
        if dry_run { "Checking" } else { "Formatting" },
        dir.display()
    );
    TranscriptFormatter::new()?.format_dir(dir, dry_run)
}

/// Print per-file results and a summary
pub fn print_format_report(dir: &Path, report: &FormatReport) {
    if report.files.is_empty() {
        println!("No .md files found in {}", dir.display());
        return;
    }

    println!("Found {} files to process\n", report.files.len());
    for f in &report.files {
        match &f.outcome {
            FormatOutcome::AlreadyFormatted { lines } => {
                println!("  [OK] {} already formatted ({} lines)", f.file, lines)
            }
            FormatOutcome::Unchanged => println!("  [SKIP] No changes needed for {}", f.file),
            FormatOutcome::Formatted {
                before_lines,
                after_lines,
            } => println!(
                "  {} Formatted {}: {} -> {} lines",
                if report.dry_run { "[DRY-RUN]" } else { "[DONE]" },
                f.file,
                before_lines,
                after_lines
            ),
            FormatOutcome::Failed { message } => {
                println!("  [ERROR] Error formatting {}: {}", f.file, message)
            }
        }
    }

    let formatted = report.formatted_count();
    if report.dry_run {
        println!(
            "\nCheck complete: {}/{} files would be formatted",
            formatted,
            report.files.len()
        );
    } else {
        println!("\n✓ Formatted {}/{} files", formatted, report.files.len());
        if formatted > 0 {
            println!("Re-run 'motivate ingest' to rebuild the index.");
        }
    }
}
