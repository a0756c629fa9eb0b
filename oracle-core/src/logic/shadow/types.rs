//! Shadow Comparator Types

use serde::{Deserialize, Serialize};
use tokio::task::{JoinError, JoinHandle};

use crate::logic::repair::RepairOutcome;

/// When the comparator engages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowPolicy {
    /// Shadow requests degrade to plain standard scoring
    Disabled,
    /// Only requests that ask for shadow mode
    #[default]
    OnRequest,
    /// Every standard request is shadowed
    AllStandard,
}

impl ShadowPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShadowPolicy::Disabled => "disabled",
            ShadowPolicy::OnRequest => "on_request",
            ShadowPolicy::AllStandard => "all_standard",
        }
    }
}

impl std::str::FromStr for ShadowPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "disabled" | "off" | "none" => Ok(ShadowPolicy::Disabled),
            "on_request" | "request" => Ok(ShadowPolicy::OnRequest),
            "all_standard" | "all" => Ok(ShadowPolicy::AllStandard),
            other => Err(format!("unknown shadow policy: {}", other)),
        }
    }
}

impl std::fmt::Display for ShadowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standard result plus the detached comparison join.
///
/// Dropping `comparison` detaches it; the record is still emitted.
#[derive(Debug)]
pub struct ShadowOutcome {
    pub standard: RepairOutcome,
    pub comparison: JoinHandle<()>,
}

/// Aborts the wrapped task when dropped, so a cancelled request never
/// leaves its experimental branch running.
pub(crate) struct AbortOnDrop<T>(pub(crate) JoinHandle<T>);

impl<T> AbortOnDrop<T> {
    pub(crate) async fn join(mut self) -> Result<T, JoinError> {
        (&mut self.0).await
    }
}

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}
