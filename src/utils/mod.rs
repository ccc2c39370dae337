//! Utility modules for the notation engine

pub mod performance;

// Re-export commonly used types
pub use performance::*;
