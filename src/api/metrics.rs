//! Glyph widths measured by the browser

use crate::spacing::{GlyphMetrics, GlyphSize};
use wasm_bindgen::prelude::*;

/// SMuFL fonts are drawn at four staff spaces per em
const SPACES_PER_EM: f32 = 4.0;

/// Asks a JS function `(codepoint, fontSizePx) => widthPx` for each width
pub struct JsGlyphMetrics {
    measure: js_sys::Function,
}

impl JsGlyphMetrics {
    pub fn new(measure: js_sys::Function) -> Self {
        Self { measure }
    }
}

impl GlyphMetrics for JsGlyphMetrics {
    fn glyph_width(&self, codepoint: u32, size: GlyphSize, space_height: f32) -> f32 {
        let font_size = space_height * SPACES_PER_EM * size.factor();
        match self.measure.call2(&JsValue::NULL, &JsValue::from(codepoint), &JsValue::from(font_size)) {
            Ok(width) => width.as_f64().map_or(0.0, |width| width as f32),
            Err(error) => {
                log::warn!("Glyph measurement failed for {:#x}: {:?}", codepoint, error);
                0.0
            }
        }
    }
}
