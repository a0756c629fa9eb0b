//! Reputation Oracle Server
//!
//! HTTP endpoint that scores wallets with a reasoning model and returns
//! enclave-signed attestations for on-chain verification.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    REPUTATION ORACLE                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐  ┌──────────────────┐  ┌──────────────────┐ │
//! │  │  API      │  │  Scoring         │  │  Enclave Signer  │ │
//! │  │  (Axum)   │─▶│  (repair loop,   │─▶│  (Ed25519)       │ │
//! │  │           │  │   shadow)        │  │                  │ │
//! │  └───────────┘  └────────┬─────────┘  └──────────────────┘ │
//! │                          ▼                                  │
//! │                 ┌──────────────────┐                        │
//! │                 │ Comparison log   │                        │
//! │                 └──────────────────┘                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod models;
mod handlers;
mod error;


use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use oracle_core::constants::{APP_NAME, APP_VERSION};
use oracle_core::logic::attest::KeySource;
use oracle_core::logic::reasoning::{HttpBackend, ReasoningBackend, RubricBackend};
use oracle_core::logic::telemetry::{JsonlRecorder, QueuedSink, TelemetrySink, TracingSink};
use oracle_core::{AttestationSigner, ReputationOracle};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{BackendKind, Config};
pub use error::{AppError, AppResult};

/// Upper bound on flushing queued comparison records at shutdown
const TELEMETRY_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    init_tracing(&config);

    tracing::info!("{} v{} starting...", APP_NAME, APP_VERSION);
    tracing::info!(
        "Environment: {}, reasoning backend: {}",
        config.environment,
        config.reasoning_backend.as_str()
    );

    // A missing or unreadable key is fatal
    let key = KeySource::from_env()
        .and_then(|source| source.load(config.is_production()))
        .context("enclave signing key provisioning failed")?;
    let signer = AttestationSigner::new(key);

    let backend = build_backend(&config)?;
    let (sink, telemetry_drain) = build_sink(&config)?;
    tracing::info!("Shadow policy: {}", config.oracle.shadow_policy);

    let oracle = Arc::new(ReputationOracle::new(backend, signer, sink, config.oracle));
    let halted = oracle.halted();

    // Build application state
    let state = AppState {
        oracle: oracle.clone(),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(halted))
        .await
        .context("server error")?;

    oracle.signer().seal();
    drop(oracle);

    // Late shadow joiners may still hold the sink; don't wait on them forever
    if let Some(drain) = telemetry_drain {
        if tokio::time::timeout(TELEMETRY_DRAIN_TIMEOUT, drain).await.is_err() {
            tracing::warn!("Comparison log not fully drained at shutdown");
        }
    }
    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "reputation_oracle_server=debug,oracle_core=info,tower_http=debug".into()
    });

    if config.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn build_backend(config: &Config) -> anyhow::Result<Arc<dyn ReasoningBackend>> {
    Ok(match config.reasoning_backend {
        BackendKind::Rubric => Arc::new(RubricBackend::new()),
        BackendKind::Http => {
            tracing::info!(
                "Reasoning API: {} (model {})",
                config.http_backend.api_url,
                config.http_backend.model
            );
            Arc::new(HttpBackend::new(config.http_backend.clone())?)
        }
    })
}

/// The JSONL recorder writes to disk, so it sits behind a queue
fn build_sink(config: &Config) -> anyhow::Result<(Arc<dyn TelemetrySink>, Option<JoinHandle<()>>)> {
    Ok(match &config.comparison_log_dir {
        Some(dir) => {
            let recorder = JsonlRecorder::new(dir.clone())
                .with_context(|| format!("cannot open comparison log in {:?}", dir))?;
            let (queued, drain) = QueuedSink::spawn(Arc::new(recorder));
            (Arc::new(queued), Some(drain))
        }
        None => (Arc::new(TracingSink), None),
    })
}

/// Resolves on Ctrl-C, or when the oracle halts after a signing failure
async fn shutdown_signal(mut halted: watch::Receiver<bool>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let halt = async {
        if halted.wait_for(|h| *h).await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => tracing::info!("Shutdown requested"),
        _ = halt => tracing::error!("Oracle halted after a signing failure, shutting down"),
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub oracle: Arc<ReputationOracle>,
    pub config: Arc<Config>,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/v1/score", post(handlers::score::score))
        .route("/api/v1/attestation/public-key", get(handlers::attestation::public_key))
        .route("/api/v1/attestation/verify", post(handlers::attestation::verify));

    Router::new()
        .route("/health", get(handlers::health::check))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
