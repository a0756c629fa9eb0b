//! Central Configuration Constants
//!
//! Single source of truth for all oracle defaults.
//! The server reads overrides from the environment through the helpers below.

/// Token budget for the standard prompt variant
pub const DEFAULT_STANDARD_TOKEN_BUDGET: u32 = 800;

/// Token budget for the chain-of-thought prompt variant
pub const DEFAULT_COT_TOKEN_BUDGET: u32 = 1500;

/// Budget added to the next attempt after a truncated response
pub const DEFAULT_TRUNCATION_BUDGET_INCREMENT: u32 = 400;

/// Maximum reasoning attempts per variant before `scoring_failed`
pub const MAX_REPAIR_ATTEMPTS: u8 = 3;

/// Per-call deadline for the standard variant (seconds)
pub const DEFAULT_STANDARD_TIMEOUT_SECS: u64 = 30;

/// Per-call deadline for the chain-of-thought variant (seconds)
pub const DEFAULT_COT_TIMEOUT_SECS: u64 = 60;

/// Allowed distance between the breakdown mean and the overall score.
///
/// The breakdown is informative rather than additive, so only gross
/// inconsistency is rejected.
pub const DEFAULT_BREAKDOWN_TOLERANCE: u32 = 25;

/// Number of breakdown dimensions (and chain-of-thought steps)
pub const DIMENSION_COUNT: usize = 5;

/// Default OpenAI-compatible reasoning endpoint
pub const DEFAULT_REASONING_API_URL: &str = "http://localhost:11434/v1";

/// Default reasoning model identifier
pub const DEFAULT_REASONING_MODEL: &str = "reasoning-default";

/// Telemetry events buffered ahead of a blocking sink before new ones are dropped
pub const TELEMETRY_QUEUE_CAPACITY: usize = 4096;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Reputation Oracle";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Standard token budget from environment or default
pub fn get_standard_token_budget() -> u32 {
    env_parse("STANDARD_TOKEN_BUDGET", DEFAULT_STANDARD_TOKEN_BUDGET)
}

/// Chain-of-thought token budget from environment or default
pub fn get_cot_token_budget() -> u32 {
    env_parse("COT_TOKEN_BUDGET", DEFAULT_COT_TOKEN_BUDGET)
}

/// Truncation budget increment from environment or default
pub fn get_truncation_budget_increment() -> u32 {
    env_parse("TRUNCATION_BUDGET_INCREMENT", DEFAULT_TRUNCATION_BUDGET_INCREMENT)
}

/// Standard variant timeout from environment or default
pub fn get_standard_timeout_secs() -> u64 {
    env_parse("STANDARD_TIMEOUT_SECS", DEFAULT_STANDARD_TIMEOUT_SECS)
}

/// Chain-of-thought timeout from environment or default
pub fn get_cot_timeout_secs() -> u64 {
    env_parse("COT_TIMEOUT_SECS", DEFAULT_COT_TIMEOUT_SECS)
}

/// Breakdown tolerance from environment or default
pub fn get_breakdown_tolerance() -> u32 {
    env_parse("BREAKDOWN_TOLERANCE", DEFAULT_BREAKDOWN_TOLERANCE)
}

/// Reasoning API base URL from environment or default
pub fn get_reasoning_api_url() -> String {
    std::env::var("REASONING_API_URL")
        .unwrap_or_else(|_| DEFAULT_REASONING_API_URL.to_string())
}

/// Reasoning model from environment or default
pub fn get_reasoning_model() -> String {
    std::env::var("REASONING_MODEL")
        .unwrap_or_else(|_| DEFAULT_REASONING_MODEL.to_string())
}

/// Check whether a boolean flag is switched on
pub fn is_flag_enabled(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|s| matches!(s.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
