//! Reasoning Client
//!
//! Wraps a backend with the per-call deadline and the truncation rule.
//! Performs no retries: retry policy belongs to the repair loop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::types::{ModelResponse, RawCompletion, ReasoningError, RenderedPrompt};
use crate::logic::schema::PromptVariant;

/// A generative model reachable by the oracle.
///
/// Implementations report what the model produced; deadlines and budget
/// interpretation are applied by [`ReasoningClient`].
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    /// Short identifier for logs
    fn name(&self) -> &str;

    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        max_tokens: u32,
    ) -> Result<RawCompletion, ReasoningError>;
}

/// Cheap to clone; shares the backend.
#[derive(Clone)]
pub struct ReasoningClient {
    backend: Arc<dyn ReasoningBackend>,
}

impl std::fmt::Debug for ReasoningClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReasoningClient")
            .field("backend", &self.backend.name())
            .finish()
    }
}

impl ReasoningClient {
    pub fn new(backend: Arc<dyn ReasoningBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// One model call under `timeout` and `max_tokens`.
    ///
    /// Dropping the returned future cancels the in-flight backend call.
    pub async fn invoke(
        &self,
        prompt: &RenderedPrompt,
        variant: PromptVariant,
        max_tokens: u32,
        timeout: Duration,
    ) -> Result<ModelResponse, ReasoningError> {
        let started = Instant::now();

        let completion = tokio::time::timeout(timeout, self.backend.complete(prompt, max_tokens))
            .await
            .map_err(|_| ReasoningError::Timeout(timeout))??;

        if completion.is_truncated(max_tokens) {
            return Err(ReasoningError::Truncated {
                tokens_used: completion.completion_tokens,
                budget: max_tokens,
            });
        }

        Ok(ModelResponse {
            text: completion.text,
            variant,
            latency: started.elapsed(),
            tokens_used: completion.completion_tokens,
        })
    }
}
