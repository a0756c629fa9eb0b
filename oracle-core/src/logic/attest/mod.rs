//! Attestation Signer
//!
//! Signs (score, wallet address, timestamp) with the enclave-held Ed25519
//! key so the on-chain verifier can check the score came from this oracle.
//!
//! ## Structure
//! - `canonical.rs` - Versioned byte layout that gets signed
//! - `key.rs` - Enclave key custody and provisioning sources
//! - `clock.rs` - Monotonic millisecond clock
//! - `signer.rs` - AttestationSigner, SignedAttestation, verification

pub mod canonical;
pub mod key;
pub mod clock;
pub mod signer;

#[cfg(test)]
mod tests;

pub use canonical::{encode, CANONICAL_LEN, DOMAIN_TAG, ENCODING_VERSION};
pub use key::{EnclaveKey, KeyError, KeySource};
pub use clock::MonotonicClock;
pub use signer::{verify_attestation, AttestationSigner, SignedAttestation, SigningError};
