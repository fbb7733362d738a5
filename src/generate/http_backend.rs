use super::Generator;
use crate::backend::ModelBackendClient;
use crate::config::{api_key_from_env, GenerationConfig};
use crate::error::Result;
use async_trait::async_trait;
use tracing::debug;

/// Generator backed by an OpenAI-compatible `/chat/completions` endpoint
pub struct HttpGenerator {
    client: ModelBackendClient,
    model_id: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl HttpGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = ModelBackendClient::new(
            "generation",
            &config.base_url,
            api_key_from_env(&config.api_key_env),
            config.timeout_secs,
        )?;
        Ok(Self {
            client,
            model_id: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(
            "Generating with {} ({} prompt chars)",
            self.model_id,
            prompt.chars().count()
        );
        self.client
            .chat_completion(&self.model_id, prompt, self.temperature, self.max_tokens)
            .await
    }

    fn model_name(&self) -> &str {
        &self.model_id
    }
}
