//! Configuration module

use std::env;
use std::path::PathBuf;

use oracle_core::logic::reasoning::HttpBackendConfig;
use oracle_core::OracleConfig;

/// Which reasoning backend serves requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// OpenAI-compatible chat completions
    Http,
    /// Deterministic offline rubric
    Rubric,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Http => "http",
            BackendKind::Rubric => "rubric",
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    pub reasoning_backend: BackendKind,

    /// Remote model settings (used when the backend is `http`)
    pub http_backend: HttpBackendConfig,

    /// JSONL comparison log directory; tracing-only when unset
    pub comparison_log_dir: Option<PathBuf>,

    /// Emit JSON log lines instead of the human format
    pub log_json: bool,

    pub oracle: OracleConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),

            reasoning_backend: match env::var("REASONING_BACKEND")
                .map(|b| b.trim().to_lowercase())
                .as_deref()
            {
                Ok("rubric") => BackendKind::Rubric,
                _ => BackendKind::Http,
            },

            http_backend: HttpBackendConfig::default(),

            comparison_log_dir: env::var("COMPARISON_LOG_DIR")
                .ok()
                .filter(|d| !d.trim().is_empty())
                .map(PathBuf::from),

            log_json: env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),

            oracle: OracleConfig::from_env(),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
