//! Document model
//!
//! Staves of time-ordered objects, the slices that align them in time, and
//! the editing algorithms that keep both consistent.

pub mod accidentals;
pub mod editing;
pub mod model;
pub mod navigation;
pub mod object;
pub mod overwrite;
pub mod slice;
pub mod staff;

// Re-export commonly used types
pub use accidentals::DefaultAccidental;
pub use model::Document;
pub use navigation::{pitch_from_letter, Selection};
pub use object::{
    letter_name, letter_name_from_char, Accidental, Clef, ClefOctave, ClefShape, Duration, KeySig,
    KeySigAccidental, NotePitch, Object, ObjectHandle, ObjectKind, Pitch, TimeSig,
};
pub use slice::{Associations, HeaderSlices, Slice, SliceHandle};
pub use staff::{Staff, StaffIndex, StaffSpec};
