//! The `ScoreEditor` class exported to JavaScript
//!
//! One editor owns one document. Handles cross the boundary as their `u32`
//! indices; layout results cross as plain JS objects.

use super::helpers::{deserialize, js_error, object_handle, serialize, slice_handle};
use super::metrics::JsGlyphMetrics;
use crate::config::EngineConfig;
use crate::document::{Clef, Document, StaffIndex, StaffSpec};
use crate::error::{ConfigError, EditError, Result};
use crate::spacing::{FixedGlyphMetrics, GlyphMetrics, RespaceReport, Viewport};
use crate::utils::PerformanceMonitor;
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct HitResult {
    pub staff: u32,
    pub object: u32,
}

#[wasm_bindgen]
pub struct ScoreEditor {
    document: Document,
    metrics: Box<dyn GlyphMetrics>,
    monitor: PerformanceMonitor,
}

impl ScoreEditor {
    pub fn with_config(config: EngineConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            document: Document::new(config),
            metrics: Box::new(FixedGlyphMetrics::bravura()),
            monitor: PerformanceMonitor::new(),
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn set_metrics(&mut self, metrics: Box<dyn GlyphMetrics>) {
        self.metrics = metrics;
    }

    pub fn respace_viewport(&mut self, viewport: Viewport) -> RespaceReport {
        let metrics = self.metrics.as_ref();
        let document = &mut self.document;
        self.monitor.measure("respace", || document.respace(metrics, viewport))
    }

    /// Runs one mutation entry point, timing it under `operation`
    fn edit<T>(&mut self, operation: &str, edit: impl FnOnce(&mut Document) -> Result<T>) -> std::result::Result<T, JsValue> {
        log::debug!("{}", operation);
        let document = &mut self.document;
        self.monitor.measure(operation, || edit(document)).map_err(js_error)
    }

    fn checked_object(&self, staff: u32, object: u32) -> Result<(StaffIndex, crate::document::ObjectHandle)> {
        let staff = StaffIndex(staff);
        let object = object_handle(object)?;
        self.document.check_object(staff, object)?;
        Ok((staff, object))
    }
}

#[wasm_bindgen]
impl ScoreEditor {
    /// Creates an editor from a config object, or the defaults when
    /// `config` is `undefined` or `null`
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> std::result::Result<ScoreEditor, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            EngineConfig::default()
        } else {
            deserialize(config, "Invalid editor config")?
        };
        Self::with_config(config).map_err(js_error)
    }

    /// Measures glyphs with `measure(codepoint, fontSizePx)` from now on
    #[wasm_bindgen(js_name = setGlyphMeasurer)]
    pub fn set_glyph_measurer(&mut self, measure: js_sys::Function) {
        self.metrics = Box::new(JsGlyphMetrics::new(measure));
    }

    #[wasm_bindgen(js_name = addStaff)]
    pub fn add_staff(&mut self, spec: JsValue) -> std::result::Result<u32, JsValue> {
        let spec: StaffSpec = if spec.is_undefined() || spec.is_null() {
            StaffSpec::default()
        } else {
            deserialize(spec, "Invalid staff spec")?
        };
        Ok(self.document.add_staff(spec).0)
    }

    #[wasm_bindgen(js_name = staffOrder)]
    pub fn staff_order(&self) -> Vec<u32> {
        self.document.staff_order().iter().map(|staff| staff.0).collect()
    }

    pub fn selection(&self) -> std::result::Result<JsValue, JsValue> {
        serialize(&self.document.selection(), "Failed to serialize selection")
    }

    #[wasm_bindgen(js_name = setCursor)]
    pub fn set_cursor(&mut self, staff: u32, object: u32) -> std::result::Result<(), JsValue> {
        self.edit("set_cursor", |document| document.set_cursor(StaffIndex(staff), object_handle(object)?))
    }

    #[wasm_bindgen(js_name = selectObject)]
    pub fn select_object(&mut self, staff: u32, object: u32) -> std::result::Result<(), JsValue> {
        self.edit("select_object", |document| document.select_object(StaffIndex(staff), object_handle(object)?))
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) {
        self.document.clear_selection();
    }

    #[wasm_bindgen(js_name = cursorRight)]
    pub fn cursor_right(&mut self) -> std::result::Result<(), JsValue> {
        self.edit("cursor_right", Document::cursor_right)
    }

    #[wasm_bindgen(js_name = cursorLeft)]
    pub fn cursor_left(&mut self) -> std::result::Result<(), JsValue> {
        self.edit("cursor_left", Document::cursor_left)
    }

    #[wasm_bindgen(js_name = shiftCursorOctave)]
    pub fn shift_cursor_octave(&mut self, up: bool) -> std::result::Result<(), JsValue> {
        self.edit("shift_cursor_octave", |document| document.shift_cursor_octave(up))
    }

    /// Overwrites at the cursor with a note, returning its handle
    #[wasm_bindgen(js_name = enterNote)]
    pub fn enter_note(&mut self, letter_name: u8, log2: i8, augmentation_dots: u8) -> std::result::Result<u32, JsValue> {
        self.edit("enter_note", |document| {
            document.enter_note(letter_name, log2, augmentation_dots).map(|handle| handle.index())
        })
    }

    #[wasm_bindgen(js_name = enterRest)]
    pub fn enter_rest(&mut self, log2: i8, augmentation_dots: u8) -> std::result::Result<u32, JsValue> {
        self.edit("enter_rest", |document| {
            document.enter_rest(log2, augmentation_dots).map(|handle| handle.index())
        })
    }

    #[wasm_bindgen(js_name = insertClef)]
    pub fn insert_clef(&mut self, codepoint: u16, steps_of_baseline_above_staff_middle: i8) -> std::result::Result<(), JsValue> {
        self.edit("insert_clef", |document| {
            document.insert_clef(Clef::from_codepoint(codepoint, steps_of_baseline_above_staff_middle)?)
        })
    }

    #[wasm_bindgen(js_name = insertKeySig)]
    pub fn insert_key_sig(&mut self, accidental_count: u8, is_flats: bool) -> std::result::Result<(), JsValue> {
        self.edit("insert_key_sig", |document| document.insert_key_sig(accidental_count, is_flats))
    }

    #[wasm_bindgen(js_name = insertTimeSig)]
    pub fn insert_time_sig(&mut self, numerator: u16, denominator: u16) -> std::result::Result<(), JsValue> {
        self.edit("insert_time_sig", |document| document.insert_time_sig(numerator, denominator))
    }

    #[wasm_bindgen(js_name = deleteObject)]
    pub fn delete_object(&mut self) -> std::result::Result<(), JsValue> {
        self.edit("delete_object", Document::delete_object)
    }

    #[wasm_bindgen(js_name = transposeSelected)]
    pub fn transpose_selected(&mut self, up: bool) -> std::result::Result<(), JsValue> {
        self.edit("transpose_selected", |document| document.transpose_selected(up))
    }

    #[wasm_bindgen(js_name = alterSelectedAccidental)]
    pub fn alter_selected_accidental(&mut self, up: bool) -> std::result::Result<(), JsValue> {
        self.edit("alter_selected_accidental", |document| document.alter_selected_accidental(up))
    }

    /// Respaces the dirty ranges between `left` and `right`
    pub fn respace(&mut self, left: i32, right: i32) -> std::result::Result<JsValue, JsValue> {
        let report = self.respace_viewport(Viewport::new(left, right));
        serialize(&report, "Failed to serialize respace report")
    }

    /// Object under the point as `{ staff, object }`, or `null`
    #[wasm_bindgen(js_name = hitTest)]
    pub fn hit_test(&self, x: i32, y: i32) -> std::result::Result<JsValue, JsValue> {
        let hit = self
            .document
            .hit_test(x, y, self.metrics.as_ref())
            .map(|(staff, object)| HitResult { staff: staff.0, object: object.index() });
        match hit {
            Some(hit) => serialize(&hit, "Failed to serialize hit"),
            None => Ok(JsValue::NULL),
        }
    }

    pub fn locate(&self, staff: u32, object: u32) -> std::result::Result<JsValue, JsValue> {
        let (staff, object) = self.checked_object(staff, object).map_err(js_error)?;
        serialize(&self.document.locate(staff, object), "Failed to serialize location")
    }

    #[wasm_bindgen(js_name = sliceX)]
    pub fn slice_x(&self, slice: u32) -> std::result::Result<i32, JsValue> {
        let handle = slice_handle(slice).map_err(js_error)?;
        if !self.document.is_live_slice(handle) {
            return Err(js_error(EditError::UnknownSlice(slice)));
        }
        Ok(self.document.slice_x(handle))
    }

    #[wasm_bindgen(js_name = objectX)]
    pub fn object_x(&self, staff: u32, object: u32) -> std::result::Result<i32, JsValue> {
        let (staff, object) = self.checked_object(staff, object).map_err(js_error)?;
        Ok(self.document.object_x(staff, object))
    }

    #[wasm_bindgen(js_name = staffMiddleY)]
    pub fn staff_middle_y(&self, staff: u32) -> std::result::Result<i32, JsValue> {
        let staff = StaffIndex(staff);
        self.document.check_staff(staff).map_err(js_error)?;
        Ok(self.document.staff_middle_y(staff))
    }

    pub fn layout(&self) -> std::result::Result<JsValue, JsValue> {
        serialize(&self.document.layout(), "Failed to serialize layout")
    }

    /// Average duration in milliseconds of an operation such as `respace`
    #[wasm_bindgen(js_name = averageTimeMs)]
    pub fn average_time_ms(&self, operation: &str) -> Option<f32> {
        self.monitor.get_average_time(operation)
    }
}
