//! Engine configuration
//!
//! Every tunable constant of the editor lives on [`EngineConfig`], which is
//! owned by the document rather than stored in globals. Configs can be built
//! in code, or loaded from JSON or YAML.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A named staff size, relative to the default staff space height
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StaffScale {
    pub name: String,
    pub value: f32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Byte size used to derive how many records fit on a page
    pub page_bytes: usize,

    /// Lower bound on any derived page capacity
    pub min_page_capacity: usize,

    /// Reserved slot count of every arena; running out is fatal
    pub reserved_slots: usize,

    /// Slots committed each time an arena grows past its committed bound
    pub commit_slots: usize,

    /// Staff space height of a staff with scale 1.0
    pub default_staff_space_height: f32,

    /// Spring width of a whole note, in staff spaces
    pub whole_note_width: f32,

    /// Spring growth factor per doubling of duration
    pub duration_ratio: f32,

    pub distance_between_accidental_and_note: f32,
    pub distance_between_augmentation_dots: f32,
    pub double_whole_notehead_x_offset: f32,

    /// Vertical offset of the first staff's middle line
    pub top_staff_middle_y: i32,

    /// Vertical distance between consecutive staff middles
    pub staff_spacing: i32,

    /// Horizontal offset of the staff-start slice
    pub staff_start_distance: i32,

    /// Cap on rod activation rounds per solved range
    pub max_rod_activation_rounds: usize,

    pub staff_scales: Vec<StaffScale>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let whole_note_width = 10.0_f32;
        Self {
            page_bytes: 4096,
            min_page_capacity: 4,
            reserved_slots: 1 << 20,
            commit_slots: 256,
            default_staff_space_height: 10.0,
            whole_note_width,
            duration_ratio: (whole_note_width / 2.0).sqrt().sqrt(),
            distance_between_accidental_and_note: 0.2,
            distance_between_augmentation_dots: 0.2,
            double_whole_notehead_x_offset: 0.36,
            top_staff_middle_y: 135,
            staff_spacing: 80,
            staff_start_distance: 20,
            max_rod_activation_rounds: 64,
            staff_scales: vec![
                StaffScale { name: "Default".to_string(), value: 1.0 },
                StaffScale { name: "Cue".to_string(), value: 0.75 },
            ],
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file, choosing the format by extension
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|extension| extension.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&text),
            other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("").to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: &str) -> Result<(), ConfigError> {
            Err(ConfigError::Invalid { field, reason: reason.to_string() })
        }
        if self.min_page_capacity < 2 {
            return invalid("min_page_capacity", "a page must hold at least two records");
        }
        if self.reserved_slots < 2 {
            return invalid("reserved_slots", "slot 0 is reserved, so at least two are needed");
        }
        if self.commit_slots == 0 {
            return invalid("commit_slots", "must be positive");
        }
        if !(self.default_staff_space_height > 0.0) {
            return invalid("default_staff_space_height", "must be positive");
        }
        if !(self.whole_note_width > 0.0) {
            return invalid("whole_note_width", "must be positive");
        }
        if !(self.duration_ratio > 1.0) {
            return invalid("duration_ratio", "must be greater than 1");
        }
        if self.staff_scales.is_empty() {
            return invalid("staff_scales", "at least one staff scale is required");
        }
        if self.staff_scales.iter().any(|scale| !(scale.value > 0.0)) {
            return invalid("staff_scales", "scale values must be positive");
        }
        Ok(())
    }

    /// Number of `T` records that fit on one page
    pub fn page_capacity<T>(&self) -> usize {
        (self.page_bytes / std::mem::size_of::<T>().max(1)).max(self.min_page_capacity)
    }

    pub fn staff_scale(&self, index: usize) -> f32 {
        self.staff_scales.get(index).map_or(1.0, |scale| scale.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.duration_ratio - 5.0_f32.powf(0.25)).abs() < 1e-6);
        assert_eq!(config.staff_scales[1].name, "Cue");
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "staff_spacing": 120 }"#).unwrap();
        assert_eq!(config.staff_spacing, 120);
        assert_eq!(config.top_staff_middle_y, 135);
    }

    #[test]
    fn test_config_fields() {
        let value = serde_json::to_value(EngineConfig::default()).unwrap();
        let mut fields: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        fields.sort_unstable();
        assert_eq!(
            fields,
            vec![
                "commit_slots",
                "default_staff_space_height",
                "distance_between_accidental_and_note",
                "distance_between_augmentation_dots",
                "double_whole_notehead_x_offset",
                "duration_ratio",
                "max_rod_activation_rounds",
                "min_page_capacity",
                "page_bytes",
                "reserved_slots",
                "staff_scales",
                "staff_spacing",
                "staff_start_distance",
                "top_staff_middle_y",
                "whole_note_width",
            ]
        );

        // unknown keys are ignored
        let config = EngineConfig::from_json_str(r#"{ "thin_barline_thickness": 0.16 }"#).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_yaml_config() {
        let config = EngineConfig::from_yaml_str("min_page_capacity: 8\nwhole_note_width: 12.0\n")
            .unwrap();
        assert_eq!(config.min_page_capacity, 8);
        assert_eq!(config.whole_note_width, 12.0);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let result = EngineConfig::from_json_str(r#"{ "duration_ratio": 0.5 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid { field: "duration_ratio", .. })));

        let result = EngineConfig::from_json_str(r#"{ "min_page_capacity": 1 }"#);
        assert!(matches!(result, Err(ConfigError::Invalid { field: "min_page_capacity", .. })));
    }

    #[test]
    fn test_from_path_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "staff_start_distance: 32").unwrap();
        let config = EngineConfig::from_path(file.path()).unwrap();
        assert_eq!(config.staff_start_distance, 32);

        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            EngineConfig::from_path(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_page_capacity_respects_minimum() {
        let config = EngineConfig { page_bytes: 64, min_page_capacity: 4, ..Default::default() };
        assert_eq!(config.page_capacity::<[u8; 32]>(), 4);
        assert_eq!(config.page_capacity::<u32>(), 16);
    }
}
