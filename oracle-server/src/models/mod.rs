//! Request/response models

pub mod score;
pub mod attestation;

pub use score::*;
pub use attestation::*;
