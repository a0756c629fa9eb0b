//! Logic Module - Scoring, Repair & Attestation Engines
//!
//! ## Layout
//! - `features/` - Wallet feature bundle and address checks
//! - `schema/` - Structured-score schema validator (pure)
//! - `reasoning/` - Reasoning client and model backends
//! - `repair/` - Bounded retry-with-repair state machine
//! - `synth/` - Standard and chain-of-thought prompt variants
//! - `shadow/` - Shadow comparator (fork-join, standard-gated)
//! - `telemetry/` - Comparison records and repair telemetry sinks
//! - `attest/` - Canonical encoding, enclave key custody and signing
//! - `oracle/` - Endpoint composition

pub mod features;
pub mod schema;
pub mod reasoning;
pub mod repair;
pub mod synth;
pub mod shadow;
pub mod telemetry;
pub mod attest;
pub mod oracle;
