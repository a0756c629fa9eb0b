//! Shadow Comparator
//!
//! Runs the standard and chain-of-thought variants concurrently for one
//! request. The caller's response is gated only by the standard variant; the
//! experimental result is joined in the background and recorded as a
//! ComparisonRecord.
//!
//! ```text
//!          ┌── standard ──────────▶ response
//! request ─┤
//!          └── experimental (spawned) ──┐
//!                                       ▼
//!                         joiner ─▶ ComparisonRecord ─▶ sink
//! ```
//!
//! ## Structure
//! - `types.rs` - ShadowPolicy, ShadowOutcome, abort guard
//! - `comparator.rs` - Fork-join and record emission

pub mod types;
pub mod comparator;


pub use types::{ShadowOutcome, ShadowPolicy};
pub use comparator::ShadowComparator;
