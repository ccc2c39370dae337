//! Horizontal spacing
//!
//! Springs from exact durations and rods from glyph widths, solved per range
//! of slices between anchors.

pub mod constraints;
pub mod layout;
pub mod metrics;
pub mod respace;
pub mod solver;

// Re-export commonly used types
pub use constraints::{SliceRod, StaffConstraints};
pub use layout::{Layout, ObjectLayout, SliceLayout, StaffLayout};
pub use metrics::{FixedGlyphMetrics, GlyphMetrics, GlyphSize};
pub use respace::{RespaceReport, Viewport};
pub use solver::{Rod, SpacingProblem, SpacingSolution};
