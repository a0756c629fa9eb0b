//! Reputation Oracle Core
//!
//! Derives a 0-100 trust score for a wallet from a generative reasoning model,
//! coerces the model output into a schema-valid score, and attests the result
//! with an enclave-held Ed25519 key.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────────────────────┐   ┌─────────────┐
//! │ ScoreRequest │──▶│ Repair Loop                          │──▶│ Attestation │
//! │ (features)   │   │  prompt ─▶ Reasoning Client ─▶ Schema │   │ Signer      │
//! └──────────────┘   │  ◀── violation / budget escalation ── │   └──────┬──────┘
//!                    └──────────────┬───────────────────────┘          │
//!                                   │ shadow mode                      ▼
//!                          ┌────────▼─────────┐              SignedAttestation
//!                          │ Shadow Comparator│──▶ ComparisonRecord sink
//!                          └──────────────────┘
//! ```

pub mod constants;
pub mod logic;

pub use logic::attest::{AttestationSigner, EnclaveKey, SignedAttestation};
pub use logic::features::WalletFeatures;
pub use logic::oracle::{OracleConfig, OracleError, ReputationOracle, ScoreRequest, ScoringMode};
pub use logic::schema::ValidatedScore;
