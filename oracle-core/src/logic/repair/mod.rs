//! Repair Loop
//!
//! Bounded retry-with-repair state machine: up to three attempts per variant,
//! each re-prompting with a strategy chosen from the previous failure class.
//!
//! ## Structure
//! - `types.rs` - Failure classes, prompt stages, outcomes
//! - `engine.rs` - The attempt loop

pub mod types;
pub mod engine;


pub use types::{FailureCause, PromptStage, RepairFailure, RepairOutcome, VariantSettings};
pub use engine::RepairLoop;
