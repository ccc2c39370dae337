//! Glyph width oracle
//!
//! Glyph measurement belongs to the presentation layer. The spacing engine
//! only asks for advance widths through [`GlyphMetrics`]; the browser build
//! answers from canvas text measurement, native builds and tests from a fixed
//! table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Font size a glyph is drawn at, relative to the staff's full size
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GlyphSize {
    Full,

    /// Used for clefs changing mid-staff
    TwoThirds,
}

impl GlyphSize {
    pub fn factor(self) -> f32 {
        match self {
            GlyphSize::Full => 1.0,
            GlyphSize::TwoThirds => 2.0 / 3.0,
        }
    }
}

pub trait GlyphMetrics {
    /// Advance width in pixels of `codepoint` on a staff whose space height
    /// is `space_height`
    fn glyph_width(&self, codepoint: u32, size: GlyphSize, space_height: f32) -> f32;

    fn string_width(&self, codepoints: &[u32], size: GlyphSize, space_height: f32) -> f32 {
        codepoints
            .iter()
            .map(|codepoint| self.glyph_width(*codepoint, size, space_height))
            .sum()
    }
}

/// Widths held in staff spaces, scaled by the requested space height
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FixedGlyphMetrics {
    widths: HashMap<u32, f32>,

    /// Width of any codepoint missing from the table
    fallback: f32,
}

impl FixedGlyphMetrics {
    pub fn new(fallback: f32) -> Self {
        Self { widths: HashMap::new(), fallback }
    }

    pub fn with_width(mut self, codepoint: u32, spaces: f32) -> Self {
        self.widths.insert(codepoint, spaces);
        self
    }

    /// Advance widths of the Bravura glyphs the editor draws
    pub fn bravura() -> Self {
        let mut metrics = Self::new(1.2);
        let table: &[(u32, f32)] = &[
            // noteheads
            (0xe0a0, 2.5),
            (0xe0a2, 1.688),
            (0xe0a3, 1.18),
            (0xe0a4, 1.18),
            // clefs
            (0xe050, 2.684),
            (0xe051, 2.684),
            (0xe052, 2.684),
            (0xe053, 2.684),
            (0xe054, 2.684),
            (0xe05c, 2.796),
            (0xe05d, 2.796),
            (0xe062, 2.736),
            (0xe063, 2.736),
            (0xe064, 2.736),
            (0xe065, 2.736),
            (0xe066, 2.736),
            (0xe069, 1.1),
            // accidentals
            (0xe260, 0.904),
            (0xe261, 0.672),
            (0xe262, 0.996),
            (0xe263, 0.988),
            (0xe264, 1.644),
            // rests, double whole through 1024th
            (0xe4e2, 1.0),
            (0xe4e3, 1.128),
            (0xe4e4, 1.128),
            (0xe4e5, 1.08),
            (0xe4e6, 0.988),
            (0xe4e7, 1.28),
            (0xe4e8, 1.452),
            (0xe4e9, 1.6),
            (0xe4ea, 1.8),
            (0xe4eb, 2.0),
            (0xe4ec, 2.2),
            (0xe4ed, 2.4),
            (0xe1e7, 0.4),
        ];
        for (codepoint, spaces) in table {
            metrics.widths.insert(*codepoint, *spaces);
        }
        for digit in 0..10 {
            metrics.widths.insert(0xe080 + digit, 1.8);
        }
        metrics
    }
}

impl Default for FixedGlyphMetrics {
    fn default() -> Self {
        Self::bravura()
    }
}

impl GlyphMetrics for FixedGlyphMetrics {
    fn glyph_width(&self, codepoint: u32, size: GlyphSize, space_height: f32) -> f32 {
        let spaces = self.widths.get(&codepoint).copied().unwrap_or(self.fallback);
        spaces * space_height * size.factor()
    }
}
