//! Shared helpers for the WASM API
//!
//! Serialization across the JS boundary, handle decoding, and conversion of
//! crate errors into the string values JS sees.

use crate::document::{ObjectHandle, SliceHandle};
use crate::error::EditError;
use crate::memory::Handle;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use wasm_bindgen::prelude::*;

/// Deserialize a value from JavaScript with automatic error handling
pub fn deserialize<T: DeserializeOwned>(value: JsValue, error_context: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| js_error(format!("{}: {}", error_context, e)))
}

/// Serialize a value to JavaScript with automatic error handling
pub fn serialize<T: Serialize>(value: &T, error_context: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| js_error(format!("{}: {}", error_context, e)))
}

/// Logs `error` and converts it to a JS string value
pub fn js_error(error: impl Display) -> JsValue {
    let message = error.to_string();
    log::error!("{}", message);
    JsValue::from_str(&message)
}

pub fn object_handle(index: u32) -> Result<ObjectHandle, EditError> {
    Handle::from_index(index).ok_or(EditError::UnknownObject(index))
}

pub fn slice_handle(index: u32) -> Result<SliceHandle, EditError> {
    Handle::from_index(index).ok_or(EditError::UnknownSlice(index))
}
