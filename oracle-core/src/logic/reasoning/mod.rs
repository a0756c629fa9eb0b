//! Reasoning Module
//!
//! Invokes a generative model with a prompt and returns its raw text under a
//! deadline and token budget. No parsing, no retries.
//!
//! ## Structure
//! - `types.rs` - Prompt, raw completion, ModelResponse, ReasoningError
//! - `client.rs` - ReasoningBackend trait and the deadline/budget wrapper
//! - `http.rs` - OpenAI-compatible chat-completions backend
//! - `rubric.rs` - Deterministic offline backend

pub mod types;
pub mod client;
pub mod http;
pub mod rubric;

#[cfg(test)]
pub(crate) mod scripted;

pub use types::{ModelResponse, RawCompletion, ReasoningError, RenderedPrompt};
pub use client::{ReasoningBackend, ReasoningClient};
pub use http::{HttpBackend, HttpBackendConfig};
pub use rubric::RubricBackend;
