//! HTTP client for OpenAI-compatible model services
//!
//! Both the embedding and the chat endpoints go through [`ModelBackendClient`].
//! Requests are sent once; callers own any retry policy. Transport timeouts
//! surface as [`Error::Timeout`], everything else as [`Error::Upstream`].

use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum EmbeddingResponse {
    Data { data: Vec<EmbeddingData> },
    Embeddings { embeddings: Vec<Vec<f32>> },
}

#[derive(Debug, Clone, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

impl EmbeddingResponse {
    fn into_embeddings(self) -> Vec<Vec<f32>> {
        match self {
            EmbeddingResponse::Data { mut data } => {
                // servers may answer out of order when they report an index
                if data.iter().all(|d| d.index.is_some()) {
                    data.sort_by_key(|d| d.index);
                }
                data.into_iter().map(|d| d.embedding).collect()
            }
            EmbeddingResponse::Embeddings { embeddings } => embeddings,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Connection to one OpenAI-compatible service
pub struct ModelBackendClient {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    service: &'static str,
    timeout_secs: u64,
}

impl ModelBackendClient {
    pub fn new(
        service: &'static str,
        base_url: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        // keep the last path segment ("/v1") when joining endpoint names
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
            service,
            timeout_secs,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid {} service URL: {}", self.service, e)))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = self.endpoint(path)?;
        debug!(service = self.service, "POST {}", url);

        let mut request = self.client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::from_transport(self.service, self.timeout_secs, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                service: self.service.to_string(),
                message: format!("HTTP {}: {}", status, text.trim()),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::from_transport(self.service, self.timeout_secs, e))
    }

    /// `POST /embeddings`
    pub async fn embeddings(&self, model: &str, input: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        let request = EmbeddingRequest { model, input };
        let parsed: EmbeddingResponse = self.post_json("embeddings", &request).await?;
        let embeddings = parsed.into_embeddings();

        if embeddings.len() != expected {
            return Err(Error::Upstream {
                service: self.service.to_string(),
                message: format!(
                    "expected {} embeddings, got {}",
                    expected,
                    embeddings.len()
                ),
            });
        }
        Ok(embeddings)
    }

    /// `POST /chat/completions` with a single user message
    pub async fn chat_completion(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<String> {
        let request = ChatRequest {
            model,
            temperature,
            max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let parsed: ChatResponse = self.post_json("chat/completions", &request).await?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Upstream {
                service: self.service.to_string(),
                message: "response contained no message content".to_string(),
            })
    }
}
