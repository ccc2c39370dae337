//! Notation engine WASM API
//!
//! The JavaScript-facing surface of the engine. The presentation layer owns
//! windows, input and drawing; it drives a [`ScoreEditor`] with edit commands
//! already translated from raw input, supplies glyph measurements, and reads
//! back layout.
//!
//! # Module Structure
//!
//! - `helpers`: serialization, handle decoding and error conversion
//! - `metrics`: glyph widths measured through a JS callback
//! - `editor`: the `ScoreEditor` class

pub mod editor;
pub mod helpers;
pub mod metrics;

pub use editor::{HitResult, ScoreEditor};
pub use metrics::JsGlyphMetrics;
