use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::debug;

use velocity_core::config::{sanitize_credential, LlmConfig};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm API key is not configured")]
    MissingApiKey,
    #[error("llm request failed: {0}")]
    Transport(String),
    #[error("llm provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("llm provider returned no text")]
    EmptyResponse,
    #[error("llm response could not be decoded: {0}")]
    Decode(String),
}

/// One prompt plus an optional JSON schema the reply must follow.
#[derive(Clone, Debug, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub response_schema: Option<Value>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

#[async_trait]
impl<T: LlmClient + ?Sized> LlmClient for std::sync::Arc<T> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        (**self).complete(request).await
    }
}

/// `generateContent` transport for Gemini models.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<SecretString>,
}

impl GeminiClient {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<&str>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.and_then(sanitize_credential).map(SecretString::from),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().map_err(|error| LlmError::Transport(error.to_string()))?;
        Ok(Self::new(client, &config.base_url, &config.model, config.api_key()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::MissingApiKey)?;

        let mut body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
        });
        if let Some(schema) = &request.response_schema {
            body["generationConfig"] = json!({
                "responseMimeType": "application/json",
                "responseSchema": schema,
            });
        }

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, prompt_bytes = request.prompt.len(), "calling generateContent");
        let response = self
            .client
            .post(url)
            .query(&[("key", api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(|error| LlmError::Transport(error.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status: status.as_u16(), body });
        }

        let payload: GenerateResponse =
            response.json().await.map_err(|error| LlmError::Decode(error.to_string()))?;
        let text = payload.into_text();
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}
