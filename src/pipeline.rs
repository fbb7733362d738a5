//! Query orchestration: retrieve, then synthesize
//!
//! [`QueryEngine::answer_query`] is the single entry point used by the CLI
//! and the interactive shell.

use crate::config::Config;
use crate::embed::create_embedder;
use crate::error::Result;
use crate::generate::create_generator;
use crate::retrieve::{MetadataFilter, RetrievalOutcome, RetrievalResult, Retriever};
use crate::synth::Synthesizer;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

/// A question with its retrieval parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub k: usize,
    pub threshold: f32,
    /// Raw `key:value` expression
    #[serde(default)]
    pub filter: Option<String>,
}

impl QueryRequest {
    /// Request with the configured defaults for `k` and `threshold`
    pub fn new(query: impl Into<String>, config: &Config) -> Self {
        Self {
            query: query.into(),
            k: config.query.default_k,
            threshold: config.query.default_threshold,
            filter: None,
        }
    }
}

/// Provenance for one chunk used in an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub subject: String,
    pub company: String,
    pub themes: Vec<String>,
    pub score: f32,
    pub chunk_text: String,
    pub chunk_index: usize,
    pub source_file: String,
}

impl From<&RetrievalResult> for SourceInfo {
    fn from(result: &RetrievalResult) -> Self {
        Self {
            subject: result.payload.subject.clone(),
            company: result.payload.company.clone(),
            themes: result.payload.themes(),
            score: result.score,
            chunk_text: result.text.clone(),
            chunk_index: result.payload.chunk_index,
            source_file: result.payload.source.clone(),
        }
    }
}

/// Non-fatal problems noticed while answering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "warning", rename_all = "snake_case")]
pub enum QueryWarning {
    /// The filter could not be parsed and the search ran unfiltered
    MalformedFilter { raw: String, reason: String },
}

impl fmt::Display for QueryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryWarning::MalformedFilter { raw, reason } => write!(
                f,
                "Invalid filter '{}' ({}); searching without a filter",
                raw, reason
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Answered {
        answer: String,
        sources: Vec<SourceInfo>,
    },
    NoMatches,
    BelowThreshold {
        best_score: f32,
        threshold: f32,
    },
}

impl AnswerOutcome {
    /// Text to show the user
    pub fn message(&self) -> String {
        match self {
            AnswerOutcome::Answered { answer, .. } => answer.clone(),
            AnswerOutcome::NoMatches => "No results found.".to_string(),
            AnswerOutcome::BelowThreshold {
                best_score,
                threshold,
            } => format!(
                "No results above threshold {}. Best score was {:.3}. Try lowering the threshold.",
                threshold, best_score
            ),
        }
    }

    pub fn sources(&self) -> &[SourceInfo] {
        match self {
            AnswerOutcome::Answered { sources, .. } => sources,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(flatten)]
    pub outcome: AnswerOutcome,
    pub warnings: Vec<QueryWarning>,
}

/// Retrieval plus synthesis; safe to share across tasks
pub struct QueryEngine {
    retriever: Retriever,
    synthesizer: Synthesizer,
}

impl QueryEngine {
    pub fn new(retriever: Retriever, synthesizer: Synthesizer) -> Self {
        Self {
            retriever,
            synthesizer,
        }
    }

    /// Build an engine over the configured index and model services
    pub async fn from_config(config: &Config) -> Result<Self> {
        let embedder = create_embedder(&config.embedding)?;
        let retriever = Retriever::open(embedder, &config.index_path()).await?;
        let synthesizer = Synthesizer::new(create_generator(&config.generation)?);
        Ok(Self::new(retriever, synthesizer))
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub async fn answer_query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let mut warnings = Vec::new();

        let filter = match request.filter.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => match MetadataFilter::parse(raw) {
                Ok(filter) => {
                    info!("Applying filter: {}", filter);
                    Some(filter)
                }
                Err(malformed) => {
                    warn!("{}", malformed);
                    warnings.push(QueryWarning::MalformedFilter {
                        raw: malformed.raw,
                        reason: malformed.reason,
                    });
                    None
                }
            },
        };

        let outcome = self
            .retriever
            .retrieve(
                &request.query,
                request.k,
                request.threshold,
                filter.as_ref(),
            )
            .await?;

        let outcome = match outcome {
            RetrievalOutcome::NoMatches => AnswerOutcome::NoMatches,
            RetrievalOutcome::BelowThreshold { best_score } => AnswerOutcome::BelowThreshold {
                best_score,
                threshold: request.threshold,
            },
            RetrievalOutcome::Found(results) => {
                let answer = self
                    .synthesizer
                    .synthesize(&request.query, &results)
                    .await?;
                AnswerOutcome::Answered {
                    answer,
                    sources: results.iter().map(SourceInfo::from).collect(),
                }
            }
        };

        Ok(QueryResponse { outcome, warnings })
    }
}
