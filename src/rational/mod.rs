//! Exact arithmetic for musical time
//!
//! Arbitrary-precision magnitudes, reduced fractions over them, and the
//! pooled storage that keeps slice durations alive between edits.

pub mod fraction;
pub mod integer;
pub mod store;

// Re-export commonly used types
pub use fraction::{whole_notes_long, Rational, MAX_LOG2_DURATION, MIN_LOG2_DURATION};
pub use integer::{Division, Integer};
pub use store::{RationalStore, StoredRational};
