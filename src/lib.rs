//! motivate - retrieval-augmented Q&A over entrepreneur transcripts
//!
//! This crate provides:
//! - Loading of biography and podcast transcripts enriched from a metadata catalog
//! - Overlapping chunking and a local SQLite vector index with metadata filters
//! - Grounded answer synthesis through OpenAI-compatible model services
//! - CLI commands, including an interactive shell with query history

pub mod backend;
pub mod catalog;
pub mod chunk;
pub mod commands;
pub mod config;
pub mod embed;
pub mod error;
pub mod format;
pub mod generate;
pub mod history;
pub mod index;
pub mod loader;
pub mod pipeline;
pub mod progress;
pub mod retrieve;
pub mod store;
pub mod synth;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::{QueryEngine, QueryRequest, QueryResponse};
