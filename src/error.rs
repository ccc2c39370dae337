//! Error types for the notation engine
//!
//! The editing algorithms themselves have no recoverable failure modes:
//! exhausting an arena terminates the process and broken internal invariants
//! are debug assertions. The enums here cover configuration loading and the
//! checks made once at the mutation entry points.

use thiserror::Error;

/// Allocation failures inside an [`Arena`](crate::memory::Arena)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("arena exhausted: all {reserved} reserved slots are in use")]
    Exhausted { reserved: usize },
}

/// Failures while loading an [`EngineConfig`](crate::config::EngineConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("unsupported config file extension: {0:?}")]
    UnsupportedFormat(String),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// An edit command that the current selection state does not permit
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("operation requires an active cursor")]
    NoActiveCursor,

    #[error("operation requires a selected object")]
    NoSelectedObject,

    #[error("staff {0} does not exist")]
    UnknownStaff(u32),

    #[error("object {0} is not on the staff")]
    UnknownObject(u32),

    #[error("slice {0} does not exist")]
    UnknownSlice(u32),

    #[error("duration log2 {log2} with {dots} dots is out of range")]
    InvalidDuration { log2: i8, dots: u8 },

    #[error("letter name {0} is out of range (0 = C .. 6 = B)")]
    InvalidLetterName(u8),

    #[error("invalid key signature: {0} accidentals")]
    InvalidKeySig(u8),

    #[error("invalid time signature {numerator}/{denominator}")]
    InvalidTimeSig { numerator: u16, denominator: u16 },

    #[error("unknown clef codepoint {0:#x}")]
    UnknownClef(u16),
}

pub type Result<T> = std::result::Result<T, EditError>;

/// Terminates on an unrecoverable resource failure.
///
/// Release and dev profiles build with `panic = "abort"`, so the panic is an
/// immediate process exit; a half-applied edit is never observed.
#[cold]
pub fn fatal(error: MemoryError) -> ! {
    log::error!("fatal: {}", error);
    panic!("{}", error)
}
