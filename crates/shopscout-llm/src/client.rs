use std::time::Duration;

use reqwest::Client;

use crate::error::LlmError;
use crate::types::{ChatMessage, ChatRequest, ChatResponse, ToolDef};

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
///
/// Works against Ollama's `/v1` surface or any hosted provider exposing the
/// same shape; the API key is optional because local backends accept
/// unauthenticated requests.
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl LlmClient {
    /// Creates an `LlmClient` with the configured timeout and model.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key: api_key.map(ToOwned::to_owned),
            model: model.to_owned(),
        })
    }

    /// Sends one chat-completion request and returns the first choice's
    /// message.
    ///
    /// # Errors
    ///
    /// - [`LlmError::Api`] — non-2xx response.
    /// - [`LlmError::Deserialize`] — body is not a valid completion payload.
    /// - [`LlmError::EmptyResponse`] — the payload carried no choices.
    /// - [`LlmError::Http`] — network or timeout failure.
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDef]>,
    ) -> Result<ChatMessage, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages,
            tools,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed =
            serde_json::from_str::<ChatResponse>(&body).map_err(|e| LlmError::Deserialize {
                context: format!("chat completion from {url}"),
                source: e,
            })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(LlmError::EmptyResponse)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
