//! Query command implementation

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{QueryEngine, QueryRequest, QueryResponse};
use std::io::{self, Write};
use tracing::info;

/// Chars of chunk text shown per source
const PREVIEW_CHARS: usize = 200;

/// Options for the query command; unset values fall back to config
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub k: Option<usize>,
    pub threshold: Option<f32>,
    pub filter: Option<String>,
}

impl QueryOptions {
    pub fn into_request(self, query: &str, config: &Config) -> QueryRequest {
        QueryRequest {
            query: query.to_string(),
            k: self.k.unwrap_or(config.query.default_k),
            threshold: self.threshold.unwrap_or(config.query.default_threshold),
            filter: self.filter,
        }
    }
}

/// Answer one question against the configured index
pub async fn cmd_query(config: &Config, query: &str, options: QueryOptions) -> Result<QueryResponse> {
    let request = options.into_request(query, config);
    info!(
        "Querying: \"{}\" (k={}, threshold={})",
        request.query, request.k, request.threshold
    );

    let engine = QueryEngine::from_config(config).await?;
    engine.answer_query(&request).await
}

fn preview(text: &str) -> String {
    let flat = text.trim().replace('\n', " ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut.trim_end())
    } else {
        flat
    }
}

/// Render a response: warnings, the answer or message, then sources
pub fn write_query_response(out: &mut dyn Write, response: &QueryResponse) -> io::Result<()> {
    for warning in &response.warnings {
        writeln!(out, "⚠️  {}", warning)?;
    }

    writeln!(out, "\n{}", response.outcome.message())?;

    let sources = response.outcome.sources();
    if sources.is_empty() {
        return Ok(());
    }

    writeln!(out, "\n📚 Sources ({}):\n", sources.len())?;
    for (i, source) in sources.iter().enumerate() {
        writeln!(
            out,
            "{}. [score: {:.3}] {} ({})",
            i + 1,
            source.score,
            source.subject,
            source.company
        )?;
        writeln!(
            out,
            "   File: {}, chunk {}",
            source.source_file, source.chunk_index
        )?;
        if !source.themes.is_empty() {
            writeln!(out, "   Themes: {}", source.themes.join(", "))?;
        }
        writeln!(out, "   {}\n", preview(&source.chunk_text))?;
    }
    Ok(())
}

/// Print a response to stdout
pub fn print_query_response(query: &str, response: &QueryResponse) {
    println!("\n🔍 Query: {}", query);
    let _ = write_query_response(&mut io::stdout().lock(), response);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{AnswerOutcome, QueryWarning, SourceInfo};

    fn render(response: &QueryResponse) -> String {
        let mut out = Vec::new();
        write_query_response(&mut out, response).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_options_fall_back_to_config() {
        let config = Config::default();
        let request = QueryOptions {
            k: Some(3),
            ..Default::default()
        }
        .into_request("q", &config);
        assert_eq!(request.k, 3);
        assert_eq!(request.threshold, config.query.default_threshold);
        assert!(request.filter.is_none());
    }

    #[test]
    fn test_render_answer_with_sources() {
        let response = QueryResponse {
            outcome: AnswerOutcome::Answered {
                answer: "Make it yourself.".to_string(),
                sources: vec![SourceInfo {
                    subject: "Elon Musk".to_string(),
                    company: "SpaceX".to_string(),
                    themes: vec!["vertical_integration".to_string(), "first_principles".to_string()],
                    score: 0.8123,
                    chunk_text: "x".repeat(300),
                    chunk_index: 7,
                    source_file: "elon.md".to_string(),
                }],
            },
            warnings: vec![QueryWarning::MalformedFilter {
                raw: "subject".to_string(),
                reason: "expected key:value".to_string(),
            }],
        };
        let text = render(&response);
        assert!(text.contains("Invalid filter 'subject'"));
        assert!(text.contains("Make it yourself."));
        assert!(text.contains("1. [score: 0.812] Elon Musk (SpaceX)"));
        assert!(text.contains("File: elon.md, chunk 7"));
        assert!(text.contains("Themes: vertical_integration, first_principles"));
        assert!(text.contains(&format!("{}...", "x".repeat(PREVIEW_CHARS))));
    }

    #[test]
    fn test_render_no_matches() {
        let response = QueryResponse {
            outcome: AnswerOutcome::NoMatches,
            warnings: Vec::new(),
        };
        let text = render(&response);
        assert!(text.contains("No results found."));
        assert!(!text.contains("Sources"));
    }
}
