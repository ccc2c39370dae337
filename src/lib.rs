//! Notation Engine WASM Module
//!
//! Score editing core: staves of symbols aligned in time by shared slices,
//! exact rational durations, and spring/rod horizontal spacing. Built as a
//! native library for tests and as a WASM module for a browser front end.

pub mod api;
pub mod config;
pub mod document;
pub mod error;
pub mod memory;
pub mod rational;
pub mod spacing;
pub mod utils;

// Re-export commonly used types
pub use api::ScoreEditor;
pub use config::{EngineConfig, StaffScale};
pub use document::{
    Accidental, Clef, ClefOctave, ClefShape, Document, Duration, KeySig, ObjectHandle, ObjectKind, Pitch,
    Selection, SliceHandle, StaffIndex, StaffSpec, TimeSig,
};
pub use error::{ConfigError, EditError, MemoryError, Result};
pub use rational::Rational;
pub use spacing::{FixedGlyphMetrics, GlyphMetrics, GlyphSize, Layout, RespaceReport, Viewport};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    #[cfg(feature = "console_log")]
    if console_log::init_with_level(log::Level::Debug).is_err() {
        log::warn!("Logger was already initialized");
    }

    log::info!("Notation engine WASM module initialized");
}
