//! Musical symbols placed on a staff
//!
//! Codepoints are SMuFL; the presentation layer renders them with a SMuFL
//! font (Bravura) and reports their widths back through
//! [`GlyphMetrics`](crate::spacing::GlyphMetrics).

use crate::error::EditError;
use crate::memory::Handle;
use crate::rational::{self, Rational, MAX_LOG2_DURATION, MIN_LOG2_DURATION};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

pub type ObjectHandle = Handle<Object>;

pub const AUGMENTATION_DOT_CODEPOINT: u32 = 0xe1e7;
const TIME_SIG_DIGIT_ZERO: u32 = 0xe080;

/// Letter names are numbered from C
pub const LETTER_NAME_C: u8 = 0;
pub const LETTER_NAME_F: u8 = 3;
pub const LETTER_NAME_B: u8 = 6;

/// Letter name (0 = C .. 6 = B) of a pitch counted in diatonic steps from middle C
pub fn letter_name(steps_above_c4: i8) -> u8 {
    (steps_above_c4 as i32).rem_euclid(7) as u8
}

/// Maps an `A`..`G` key to a letter name
pub fn letter_name_from_char(key: char) -> Option<u8> {
    match key.to_ascii_uppercase() {
        key @ 'A'..='G' => Some(((key as u8 - b'A') + 5) % 7),
        _ => None,
    }
}

#[derive(Serialize_repr, Deserialize_repr, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Accidental {
    DoubleFlat = 0,
    Flat = 1,
    Natural = 2,
    Sharp = 3,
    DoubleSharp = 4,
}

impl Accidental {
    pub fn codepoint(self) -> u32 {
        match self {
            Accidental::DoubleFlat => 0xe264,
            Accidental::Flat => 0xe260,
            Accidental::Natural => 0xe261,
            Accidental::Sharp => 0xe262,
            Accidental::DoubleSharp => 0xe263,
        }
    }

    pub fn raised(self) -> Option<Self> {
        match self {
            Accidental::DoubleFlat => Some(Accidental::Flat),
            Accidental::Flat => Some(Accidental::Natural),
            Accidental::Natural => Some(Accidental::Sharp),
            Accidental::Sharp => Some(Accidental::DoubleSharp),
            Accidental::DoubleSharp => None,
        }
    }

    pub fn lowered(self) -> Option<Self> {
        match self {
            Accidental::DoubleFlat => None,
            Accidental::Flat => Some(Accidental::DoubleFlat),
            Accidental::Natural => Some(Accidental::Flat),
            Accidental::Sharp => Some(Accidental::Natural),
            Accidental::DoubleSharp => Some(Accidental::Sharp),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub accidental: Accidental,
    pub steps_above_c4: i8,
}

impl Pitch {
    pub fn letter_name(&self) -> u8 {
        letter_name(self.steps_above_c4)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NotePitch {
    pub pitch: Pitch,

    /// Sliceless accidental drawn before the note, when one is displayed
    pub accidental_object: Option<ObjectHandle>,
}

/// A note, or a rest when `pitch` is absent
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Duration {
    pub pitch: Option<NotePitch>,

    /// Length as a power of two of a whole note; 1 is the double whole
    pub log2: i8,

    pub augmentation_dots: u8,
}

impl Duration {
    pub fn rest(log2: i8, augmentation_dots: u8) -> Self {
        Self { pitch: None, log2, augmentation_dots }
    }

    pub fn note(pitch: Pitch, log2: i8, augmentation_dots: u8) -> Self {
        Self {
            pitch: Some(NotePitch { pitch, accidental_object: None }),
            log2,
            augmentation_dots,
        }
    }

    /// Range check for presentation-layer input; every time point stays a
    /// multiple of the shortest duration
    pub fn validate(log2: i8, augmentation_dots: u8) -> Result<(), EditError> {
        let max_dots = (log2 as i32 - MIN_LOG2_DURATION as i32).max(0);
        if !(MIN_LOG2_DURATION..=MAX_LOG2_DURATION).contains(&log2)
            || augmentation_dots as i32 > max_dots
        {
            return Err(EditError::InvalidDuration { log2, dots: augmentation_dots });
        }
        Ok(())
    }

    pub fn whole_notes_long(&self) -> Rational {
        rational::whole_notes_long(self.log2, self.augmentation_dots)
    }

    pub fn is_pitched(&self) -> bool {
        self.pitch.is_some()
    }

    pub fn codepoint(&self) -> u32 {
        match self.pitch {
            Some(_) => match self.log2 {
                1 => 0xe0a0,
                0 => 0xe0a2,
                -1 => 0xe0a3,
                _ => 0xe0a4,
            },
            None => (0xe4e3 - self.log2 as i32) as u32,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClefShape {
    G,
    C,
    F,
    Unpitched,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClefOctave {
    FifteenMa,
    EightVa,
    None,
    EightVb,
    FifteenMb,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Clef {
    pub codepoint: u16,
    pub steps_of_baseline_above_staff_middle: i8,
}

impl Clef {
    pub fn new(shape: ClefShape, octave: ClefOctave) -> Self {
        let (codepoint, steps_of_baseline_above_staff_middle) = match shape {
            ClefShape::G => {
                let codepoint = match octave {
                    ClefOctave::FifteenMa => 0xe054,
                    ClefOctave::EightVa => 0xe053,
                    ClefOctave::None => 0xe050,
                    ClefOctave::EightVb => 0xe052,
                    ClefOctave::FifteenMb => 0xe051,
                };
                (codepoint, -2)
            }
            ClefShape::C => match octave {
                ClefOctave::EightVb => (0xe05d, 0),
                _ => (0xe05c, 0),
            },
            ClefShape::F => {
                let codepoint = match octave {
                    ClefOctave::FifteenMa => 0xe066,
                    ClefOctave::EightVa => 0xe065,
                    ClefOctave::None => 0xe062,
                    ClefOctave::EightVb => 0xe064,
                    ClefOctave::FifteenMb => 0xe063,
                };
                (codepoint, 2)
            }
            ClefShape::Unpitched => (0xe069, 0),
        };
        Self { codepoint, steps_of_baseline_above_staff_middle }
    }

    pub fn treble() -> Self {
        Self::new(ClefShape::G, ClefOctave::None)
    }

    pub fn bass() -> Self {
        Self::new(ClefShape::F, ClefOctave::None)
    }

    pub fn from_codepoint(codepoint: u16, steps_of_baseline_above_staff_middle: i8) -> Result<Self, EditError> {
        let clef = Self { codepoint, steps_of_baseline_above_staff_middle };
        clef.baseline_pitch().ok_or(EditError::UnknownClef(codepoint))?;
        Ok(clef)
    }

    /// Pitch of the line the clef is anchored on
    fn baseline_pitch(&self) -> Option<i8> {
        Some(match self.codepoint {
            0xe050 | 0xe069 => 4,
            0xe051 => -10,
            0xe052 => -3,
            0xe053 => 11,
            0xe054 => 18,
            0xe05c => 0,
            0xe05d => -7,
            0xe062 => -4,
            0xe063 => -18,
            0xe064 => -11,
            0xe065 => 3,
            0xe066 => 10,
            _ => return None,
        })
    }

    pub fn middle_pitch(&self) -> i8 {
        self.baseline_pitch().unwrap_or(6) - self.steps_of_baseline_above_staff_middle
    }

    pub fn bottom_line_pitch(&self, line_count: u8) -> i8 {
        self.middle_pitch() - line_count as i8 + 1
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeySigAccidental {
    pub accidental: Accidental,
    pub letter_name: u8,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct KeySig {
    pub accidentals: Vec<KeySigAccidental>,

    /// Lowest staff step, relative to the middle line, each letter is drawn at
    pub floors: [i8; 7],
}

impl KeySig {
    /// Standard key signature with `count` sharps or flats
    pub fn new(count: u8, is_flats: bool) -> Self {
        let (floors, accidental, stride, mut letter) = if is_flats {
            ([-4, -5, -4, -5, -1, -2, -3], Accidental::Flat, 3, LETTER_NAME_B)
        } else {
            ([-2, -3, -4, -5, -1, -2, -1], Accidental::Sharp, 4, LETTER_NAME_F)
        };
        let mut accidentals = Vec::with_capacity(count as usize);
        for _ in 0..count.min(7) {
            accidentals.push(KeySigAccidental { accidental, letter_name: letter });
            letter = (letter + stride) % 7;
        }
        Self { accidentals, floors }
    }

    /// Naturals cancelling every accidental of `previous`
    pub fn cancelling(previous: &KeySig) -> Self {
        Self {
            accidentals: previous
                .accidentals
                .iter()
                .map(|entry| KeySigAccidental { accidental: Accidental::Natural, letter_name: entry.letter_name })
                .collect(),
            floors: previous.floors,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        self.accidentals.first().map_or(false, |entry| entry.accidental == Accidental::Natural)
    }

    /// Accidental each letter name carries under this key signature
    pub fn letter_accidentals(&self) -> [Accidental; 7] {
        let mut out = [Accidental::Natural; 7];
        for entry in &self.accidentals {
            out[entry.letter_name as usize % 7] = entry.accidental;
        }
        out
    }

    /// Staff step of each accidental relative to the middle line, on a staff
    /// whose middle line has pitch `middle_pitch`
    pub fn accidental_steps(&self, middle_pitch: i8) -> impl Iterator<Item = i8> + '_ {
        let middle_letter = letter_name(middle_pitch) as i8;
        let floor = self.floors[middle_letter as usize];
        self.accidentals
            .iter()
            .map(move |entry| floor + (entry.letter_name as i8 - middle_letter - floor).rem_euclid(7))
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSig {
    pub numerator: u16,
    pub denominator: u16,
}

impl TimeSig {
    pub fn new(numerator: u16, denominator: u16) -> Result<Self, EditError> {
        if numerator == 0 || denominator == 0 || !denominator.is_power_of_two() {
            return Err(EditError::InvalidTimeSig { numerator, denominator });
        }
        Ok(Self { numerator, denominator })
    }

    pub fn common() -> Self {
        Self { numerator: 4, denominator: 4 }
    }

    pub fn numerator_codepoints(&self) -> Vec<u32> {
        digit_codepoints(self.numerator)
    }

    pub fn denominator_codepoints(&self) -> Vec<u32> {
        digit_codepoints(self.denominator)
    }
}

fn digit_codepoints(value: u16) -> Vec<u32> {
    value.to_string().bytes().map(|digit| TIME_SIG_DIGIT_ZERO + (digit - b'0') as u32).collect()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ObjectKind {
    Accidental { note: ObjectHandle },
    Clef(Clef),
    Duration(Duration),
    KeySig(KeySig),
    /// Staff start, or the terminal cursor stop at the end of a staff
    None,
    TimeSig(TimeSig),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Object {
    pub kind: ObjectKind,

    /// Owning slice; sliceless objects are positioned by width alone
    pub slice: Option<crate::document::SliceHandle>,

    /// Horizontal distance from the object's origin to the next slice at or
    /// right of it
    pub distance_to_next_slice: i32,

    pub is_selected: bool,
    pub is_valid_cursor_position: bool,
}

impl Object {
    pub fn new(kind: ObjectKind, is_valid_cursor_position: bool) -> Self {
        Self {
            kind,
            slice: None,
            distance_to_next_slice: 0,
            is_selected: false,
            is_valid_cursor_position,
        }
    }

    pub fn duration(&self) -> Option<&Duration> {
        match &self.kind {
            ObjectKind::Duration(duration) => Some(duration),
            _ => None,
        }
    }

    pub fn pitch(&self) -> Option<Pitch> {
        self.duration().and_then(|duration| duration.pitch.as_ref()).map(|note| note.pitch)
    }
}
