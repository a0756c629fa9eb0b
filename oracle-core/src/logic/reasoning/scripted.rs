//! Scripted backend for tests: replays a fixed sequence of replies/failures
//! and records every call it receives.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::client::ReasoningBackend;
use super::types::{RawCompletion, ReasoningError, RenderedPrompt};

#[derive(Debug, Clone)]
pub(crate) enum Step {
    Reply {
        text: String,
        tokens: u32,
        stop_reason: Option<String>,
    },
    Fail(ReasoningError),
    Delayed(Duration, Box<Step>),
}

impl Step {
    pub(crate) fn reply(text: impl Into<String>) -> Self {
        let text = text.into();
        let tokens = (text.len() / 4).max(1) as u32;
        Step::Reply {
            text,
            tokens,
            stop_reason: Some("stop".to_string()),
        }
    }

    /// A reply cut off at exactly `budget` tokens
    pub(crate) fn truncated(budget: u32) -> Self {
        Step::Reply {
            text: "{\"score\": 41, \"breakdown\": {\"activity\": 3".to_string(),
            tokens: budget,
            stop_reason: Some("length".to_string()),
        }
    }

    pub(crate) fn delayed(delay: Duration, step: Step) -> Self {
        Step::Delayed(delay, Box::new(step))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub max_tokens: u32,
    pub system: String,
    pub user: String,
}

/// Replays `steps` in order, then repeats the last one.
pub(crate) struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always(step: Step) -> Self {
        Self::new(vec![step])
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn next_step(&self) -> Step {
        let popped = self.steps.lock().pop_front();
        let mut last = self.last.lock();
        match popped {
            Some(step) => {
                *last = Some(step.clone());
                step
            }
            None => last
                .clone()
                .unwrap_or_else(|| Step::Fail(ReasoningError::BackendUnreachable("script empty".to_string()))),
        }
    }
}

#[async_trait]
impl ReasoningBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        prompt: &RenderedPrompt,
        max_tokens: u32,
    ) -> Result<RawCompletion, ReasoningError> {
        self.calls.lock().push(Call {
            max_tokens,
            system: prompt.system.clone(),
            user: prompt.user.clone(),
        });

        let mut step = self.next_step();
        loop {
            match step {
                Step::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    step = *inner;
                }
                Step::Reply { text, tokens, stop_reason } => {
                    return Ok(RawCompletion {
                        text,
                        completion_tokens: tokens,
                        stop_reason,
                    })
                }
                Step::Fail(err) => return Err(err),
            }
        }
    }
}
