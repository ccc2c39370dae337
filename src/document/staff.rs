//! Staves and the parameters used to create them

use super::object::{Clef, KeySig, Object, TimeSig};
use crate::memory::PagedSequence;
use serde::{Deserialize, Serialize};

/// Index of a staff in the document's staff arena
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct StaffIndex(pub u32);

#[derive(Debug)]
pub struct Staff {
    /// Symbols in left-to-right order, starting with the staff-start `None`
    pub objects: PagedSequence<Object>,

    pub line_count: u8,

    /// Index into the configured staff scales
    pub scale_index: usize,

    /// Vertical distance of this staff's middle line from the staff above,
    /// or from the top of the document for the first staff
    pub distance_from_staff_above: i32,
}

/// Parameters for [`Document::add_staff`](super::Document::add_staff)
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct StaffSpec {
    pub line_count: u8,
    pub scale_index: usize,
    pub clef: Clef,
    pub key_sig: KeySig,
    pub time_sig: TimeSig,
}

impl Default for StaffSpec {
    fn default() -> Self {
        Self {
            line_count: 5,
            scale_index: 0,
            clef: Clef::treble(),
            key_sig: KeySig::new(0, false),
            time_sig: TimeSig::common(),
        }
    }
}
