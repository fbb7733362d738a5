//! Text generation
//!
//! A trait over generative model services and an OpenAI-compatible chat
//! backend.

mod http_backend;

pub use http_backend::*;

use crate::config::GenerationConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Trait for generative model providers
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete a prompt, returning the raw model text
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

/// Create a generator based on configuration
pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn Generator>> {
    Ok(Box::new(HttpGenerator::new(config)?))
}
