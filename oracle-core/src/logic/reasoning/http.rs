//! OpenAI-compatible chat-completions backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::client::ReasoningBackend;
use super::types::{RawCompletion, ReasoningError, RenderedPrompt};
use crate::constants;

/// Remote model configuration
#[derive(Clone)]
pub struct HttpBackendConfig {
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
}

impl std::fmt::Debug for HttpBackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackendConfig")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            api_url: constants::get_reasoning_api_url(),
            model: constants::get_reasoning_model(),
            api_key: std::env::var("REASONING_API_KEY").ok().filter(|k| !k.is_empty()),
            temperature: 0.2,
        }
    }
}

/// Chat-completions client
pub struct HttpBackend {
    config: HttpBackendConfig,
    http_client: reqwest::Client,
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    completion_tokens: u32,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, ReasoningError> {
        // Deadlines are enforced by ReasoningClient; only bound connection setup here.
        let http_client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ReasoningError::BackendUnreachable(format!("http client: {}", e)))?;

        Ok(Self { config, http_client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ReasoningBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        max_tokens: u32,
    ) -> Result<RawCompletion, ReasoningError> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: &prompt.system },
                ChatMessage { role: "user", content: &prompt.user },
            ],
            max_tokens,
            temperature: self.config.temperature,
        };

        let mut request = self.http_client.post(self.endpoint()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ReasoningError::BackendUnreachable(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(ReasoningError::BackendUnreachable(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(ReasoningError::BadResponse(format!("HTTP {}", status.as_u16())));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ReasoningError::BadResponse(e.without_url().to_string()))?;

        completion_from(parsed)
    }
}

fn completion_from(parsed: ChatResponse) -> Result<RawCompletion, ReasoningError> {
    let usage = parsed.usage;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ReasoningError::BadResponse("no choices in response".to_string()))?;

    let text = choice.message.content.unwrap_or_default();
    // Rough estimate when the backend omits usage
    let completion_tokens = usage
        .map(|u| u.completion_tokens)
        .unwrap_or_else(|| (text.len() / 4) as u32);

    Ok(RawCompletion {
        text,
        completion_tokens,
        stop_reason: choice.finish_reason,
    })
}
