//! Accidental defaults and display
//!
//! A note's accidental is part of its pitch; whether it is drawn depends on
//! what came before it since the last key signature. Displayed accidentals
//! are sliceless objects placed directly before their note, which then stops
//! being a cursor position of its own.

use super::model::Document;
use super::object::{letter_name, Accidental, KeySig, Object, ObjectHandle, ObjectKind, Pitch};
use super::staff::StaffIndex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultAccidental {
    pub accidental: Accidental,

    /// Whether a same-letter note in another octave makes the accidental
    /// worth showing
    pub is_visible: bool,
}

impl Document {
    /// Accidental a note at `steps_above_c4` would take at `note`'s position
    pub fn default_accidental(&self, staff: StaffIndex, note: ObjectHandle, steps_above_c4: i8) -> DefaultAccidental {
        let letter = letter_name(steps_above_c4);
        let mut accidental = Accidental::Natural;
        let mut other_octaves: Vec<Pitch> = Vec::new();
        let objects = &self.staff(staff).objects;
        let mut cursor = objects.cursor_of(note);
        while let Some(previous) = objects.prev(cursor) {
            cursor = previous;
            match objects.get(cursor).map(|object| &object.kind) {
                Some(ObjectKind::Duration(duration)) => {
                    let Some(pitch) = duration.pitch.as_ref().map(|note| note.pitch) else { continue };
                    if pitch.steps_above_c4 == steps_above_c4 {
                        accidental = pitch.accidental;
                        break;
                    }
                    if pitch.letter_name() == letter
                        && !other_octaves.iter().any(|other| other.steps_above_c4 == pitch.steps_above_c4)
                    {
                        other_octaves.push(pitch);
                    }
                }
                Some(ObjectKind::KeySig(key_sig)) => {
                    accidental = key_sig.letter_accidentals()[letter as usize];
                    break;
                }
                _ => {}
            }
        }
        DefaultAccidental {
            accidental,
            is_visible: other_octaves.iter().any(|other| other.accidental != accidental),
        }
    }

    /// Nearest key signature strictly before `object`
    pub fn previous_key_sig(&self, staff: StaffIndex, object: ObjectHandle) -> Option<(ObjectHandle, KeySig)> {
        let objects = &self.staff(staff).objects;
        let mut cursor = objects.cursor_of(object);
        while let Some(previous) = objects.prev(cursor) {
            cursor = previous;
            if let Some(ObjectKind::KeySig(key_sig)) = objects.get(cursor).map(|object| &object.kind) {
                return objects.handle_at(cursor).map(|handle| (handle, key_sig.clone()));
            }
        }
        None
    }

    /// First key signature at or after `object`
    pub(crate) fn next_key_sig_from(&self, staff: StaffIndex, object: ObjectHandle) -> Option<ObjectHandle> {
        let objects = &self.staff(staff).objects;
        objects
            .iter_from(objects.cursor_of(object))
            .find(|(_, candidate)| matches!(candidate.kind, ObjectKind::KeySig(_)))
            .map(|(handle, _)| handle)
    }

    /// Rebuilds the cancellation at or after `from`, if any, so it cancels
    /// `cancelled`; drops it when there is nothing left to cancel
    pub(crate) fn retarget_cancellation(&mut self, staff: StaffIndex, from: ObjectHandle, cancelled: Option<&KeySig>) {
        let Some(next) = self.next_key_sig_from(staff, from) else { return };
        let is_cancellation = matches!(&self.object(staff, next).kind, ObjectKind::KeySig(key_sig) if key_sig.is_cancellation());
        if !is_cancellation {
            return;
        }
        match cancelled {
            Some(key_sig) if !key_sig.accidentals.is_empty() && !key_sig.is_cancellation() => {
                self.object_mut(staff, next).kind = ObjectKind::KeySig(KeySig::cancelling(key_sig));
                if let Some(slice) = self.next_slice_right_of(staff, next) {
                    self.mark_dirty(slice);
                }
            }
            _ => {
                log::debug!("Dropping redundant key signature cancellation");
                self.remove_object(staff, next);
            }
        }
    }

    /// Recomputes accidental displays over the key signature region holding
    /// `object`
    pub(crate) fn reset_from_previous_key_sig(&mut self, staff: StaffIndex, object: ObjectHandle) {
        let objects = &self.staff(staff).objects;
        let mut key = [Accidental::Natural; 7];
        let mut start = object;
        let mut cursor = objects.cursor_of(object);
        while let Some(previous) = objects.prev(cursor) {
            if let Some(ObjectKind::KeySig(key_sig)) = objects.get(previous).map(|object| &object.kind) {
                key = key_sig.letter_accidentals();
                break;
            }
            cursor = previous;
            if let Some(handle) = objects.handle_at(previous) {
                start = handle;
            }
        }
        self.reset_accidental_displays(staff, start, key);
    }

    /// Walks from `start` to the next key signature, showing each note's
    /// accidental exactly when the key signature or an earlier note of the
    /// same letter would suggest a different one
    pub(crate) fn reset_accidental_displays(&mut self, staff: StaffIndex, start: ObjectHandle, key: [Accidental; 7]) {
        let mut recent: [Vec<Pitch>; 7] = Default::default();
        let mut current = Some(start);
        while let Some(object) = current {
            let (pitch, accidental_object) = match &self.object(staff, object).kind {
                ObjectKind::KeySig(_) => break,
                ObjectKind::Duration(duration) => match &duration.pitch {
                    Some(note) => (note.pitch, note.accidental_object),
                    None => {
                        current = self.next_object(staff, object);
                        continue;
                    }
                },
                _ => {
                    current = self.next_object(staff, object);
                    continue;
                }
            };
            let letter = pitch.letter_name() as usize;
            let pitches = &mut recent[letter];
            let matching = pitches
                .iter()
                .rposition(|other| other.steps_above_c4 == pitch.steps_above_c4 || other.accidental != pitch.accidental);
            let show = match matching {
                Some(index) if pitches[index].steps_above_c4 == pitch.steps_above_c4 => {
                    let show = pitches[index].accidental != pitch.accidental;
                    pitches[index] = pitch;
                    show
                }
                Some(_) => {
                    pitches.push(pitch);
                    true
                }
                None => {
                    pitches.push(pitch);
                    key[letter] != pitch.accidental
                }
            };
            match (show, accidental_object) {
                (true, None) => self.show_accidental(staff, object),
                (false, Some(_)) => self.remove_accidental_object(staff, object),
                _ => {}
            }
            current = self.next_object(staff, object);
        }
    }

    fn show_accidental(&mut self, staff: StaffIndex, note: ObjectHandle) {
        let accidental = self.insert_object_before(staff, note, Object::new(ObjectKind::Accidental { note }, true), None);
        let object = self.object_mut(staff, note);
        object.is_valid_cursor_position = false;
        if let ObjectKind::Duration(duration) = &mut object.kind {
            if let Some(pitch) = duration.pitch.as_mut() {
                pitch.accidental_object = Some(accidental);
            }
        }
    }

    /// Accidentals currently displayed on `staff`, in order
    pub fn displayed_accidentals(&self, staff: StaffIndex) -> Vec<(ObjectHandle, Accidental)> {
        self.staff_objects(staff)
            .filter_map(|(handle, object)| match object.kind {
                ObjectKind::Accidental { note } => {
                    self.object(staff, note).pitch().map(|pitch| (handle, pitch.accidental))
                }
                _ => None,
            })
            .collect()
    }
}
