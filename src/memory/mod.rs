//! Memory layer for the notation engine
//!
//! Slot arenas, stable handles and the paged sequences that documents are
//! built from.

pub mod arena;
pub mod handle;
pub mod paged;

// Re-export commonly used types
pub use arena::{Arena, NULL_INDEX};
pub use handle::{Handle, HandleTable, Location};
pub use paged::{Cursor, Iter, PagedSequence};
