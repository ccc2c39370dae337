//! Edit commands keyed by the current selection
//!
//! These are the entry points the presentation layer calls. Each checks that
//! the selection permits the command, applies it, recomputes accidental
//! displays where pitches may have changed, and leaves the cursor at the
//! next valid position.

use super::model::Document;
use super::navigation::{pitch_from_letter, Selection};
use super::object::{Accidental, Clef, Duration, KeySig, Object, ObjectHandle, ObjectKind, Pitch, TimeSig};
use super::slice::SliceHandle;
use super::staff::StaffIndex;
use crate::error::{EditError, Result};
use crate::rational::Rational;

impl Document {
    /// Overwrites at the cursor with a note of letter name `letter_name`
    /// (0 = C .. 6 = B) at the first pitch at or above the range floor
    pub fn enter_note(&mut self, letter_name: u8, log2: i8, augmentation_dots: u8) -> Result<ObjectHandle> {
        if letter_name > 6 {
            return Err(EditError::InvalidLetterName(letter_name));
        }
        Duration::validate(log2, augmentation_dots)?;
        let (staff, anchor, range_floor) = self.active_cursor()?;
        let steps_above_c4 = pitch_from_letter(range_floor, letter_name);
        let pitch = Pitch { accidental: Accidental::Natural, steps_above_c4 };
        let note = self.overwrite_with_duration(staff, anchor, Duration::note(pitch, log2, augmentation_dots));
        let accidental = self.default_accidental(staff, note, steps_above_c4).accidental;
        self.set_note_accidental(staff, note, accidental);
        self.reset_from_previous_key_sig(staff, note);
        self.cursor_after(staff, note, steps_above_c4.saturating_sub(3));
        log::debug!("Entered note {} (log2 {}, {} dots) on staff {}", steps_above_c4, log2, augmentation_dots, staff.0);
        Ok(note)
    }

    /// Overwrites at the cursor with a rest
    pub fn enter_rest(&mut self, log2: i8, augmentation_dots: u8) -> Result<ObjectHandle> {
        Duration::validate(log2, augmentation_dots)?;
        let (staff, anchor, range_floor) = self.active_cursor()?;
        let rest = self.overwrite_with_duration(staff, anchor, Duration::rest(log2, augmentation_dots));
        self.reset_from_previous_key_sig(staff, rest);
        self.cursor_after(staff, rest, range_floor);
        log::debug!("Entered rest (log2 {}, {} dots) on staff {}", log2, augmentation_dots, staff.0);
        Ok(rest)
    }

    fn cursor_after(&mut self, staff: StaffIndex, object: ObjectHandle, range_floor: i8) {
        let next = self.next_object(staff, object).unwrap_or(object);
        let object = self.first_valid_at_or_after(staff, next);
        self.selection = Selection::ActiveCursor { staff, object, range_floor };
    }

    fn set_note_accidental(&mut self, staff: StaffIndex, note: ObjectHandle, accidental: Accidental) {
        if let ObjectKind::Duration(duration) = &mut self.object_mut(staff, note).kind {
            if let Some(pitch) = duration.pitch.as_mut() {
                pitch.pitch.accidental = accidental;
            }
        }
    }

    /// Inserts a clef at the cursor, or replaces the header clef of the
    /// selected object's staff
    pub fn insert_clef(&mut self, clef: Clef) -> Result<()> {
        match self.selection {
            Selection::ActiveCursor { staff, object, .. } => {
                self.insert_object_before(staff, object, Object::new(ObjectKind::Clef(clef), true), None);
                self.selection =
                    Selection::ActiveCursor { staff, object, range_floor: clef.middle_pitch().saturating_sub(3) };
            }
            Selection::Object { staff, .. } => {
                let slice = self.header.clef;
                self.replace_header_symbol(staff, slice, Some(ObjectKind::Clef(clef)));
            }
            Selection::None => return Err(EditError::NoActiveCursor),
        }
        log::debug!("Inserted clef {:#x}", clef.codepoint);
        Ok(())
    }

    /// Inserts a key signature with `count` sharps or flats; a count of zero
    /// cancels the key signature in force
    pub fn insert_key_sig(&mut self, count: u8, is_flats: bool) -> Result<()> {
        if count > 7 {
            return Err(EditError::InvalidKeySig(count));
        }
        match self.selection {
            Selection::ActiveCursor { staff, object, range_floor } => {
                let key_sig = if count == 0 {
                    match self.previous_key_sig(staff, object) {
                        Some((_, previous)) if !previous.accidentals.is_empty() && !previous.is_cancellation() => {
                            KeySig::cancelling(&previous)
                        }
                        _ => return Ok(()),
                    }
                } else {
                    KeySig::new(count, is_flats)
                };
                let inserted = self.insert_object_before(
                    staff,
                    object,
                    Object::new(ObjectKind::KeySig(key_sig.clone()), true),
                    None,
                );
                self.retarget_cancellation(staff, object, Some(&key_sig));
                let resume = self.next_object(staff, inserted).unwrap_or(inserted);
                self.reset_accidental_displays(staff, resume, key_sig.letter_accidentals());
                // the reset may have removed `resume` if it was an accidental
                let resume = self.next_object(staff, inserted).unwrap_or(inserted);
                let object = self.first_valid_at_or_after(staff, resume);
                self.selection = Selection::ActiveCursor { staff, object, range_floor };
            }
            Selection::Object { staff, .. } => {
                let key_sig = (count > 0).then(|| KeySig::new(count, is_flats));
                let slice = self.header.key_sig;
                self.replace_header_symbol(staff, slice, key_sig.clone().map(ObjectKind::KeySig));
                let Some(body) = self.object_at_slice(self.header.body_start, staff) else {
                    return Ok(());
                };
                self.retarget_cancellation(staff, body, key_sig.as_ref());
                self.reset_from_previous_key_sig(staff, body);
            }
            Selection::None => return Err(EditError::NoActiveCursor),
        }
        log::debug!("Inserted key signature ({} {})", count, if is_flats { "flats" } else { "sharps" });
        Ok(())
    }

    pub fn insert_time_sig(&mut self, numerator: u16, denominator: u16) -> Result<()> {
        let time_sig = TimeSig::new(numerator, denominator)?;
        match self.selection {
            Selection::ActiveCursor { staff, object, .. } => {
                self.insert_object_before(staff, object, Object::new(ObjectKind::TimeSig(time_sig), true), None);
            }
            Selection::Object { staff, .. } => {
                let slice = self.header.time_sig;
                self.replace_header_symbol(staff, slice, Some(ObjectKind::TimeSig(time_sig)));
            }
            Selection::None => return Err(EditError::NoActiveCursor),
        }
        log::debug!("Inserted time signature {}/{}", numerator, denominator);
        Ok(())
    }

    /// Sets, replaces or removes the staff's symbol in a header slice
    fn replace_header_symbol(&mut self, staff: StaffIndex, slice: SliceHandle, kind: Option<ObjectKind>) {
        match (self.object_at_slice(slice, staff), kind) {
            (Some(existing), Some(kind)) => {
                self.object_mut(staff, existing).kind = kind;
                self.mark_dirty(slice);
            }
            (Some(existing), None) => {
                self.remove_object(staff, existing);
            }
            (None, Some(kind)) => {
                let header = self.header;
                let following = [header.clef, header.key_sig, header.time_sig, header.body_start]
                    .into_iter()
                    .skip_while(|candidate| *candidate != slice)
                    .skip(1)
                    .find_map(|candidate| self.object_at_slice(candidate, staff));
                if let Some(following) = following {
                    self.insert_object_before(staff, following, Object::new(kind, false), Some(slice));
                }
            }
            (None, None) => {}
        }
    }

    /// Deletes the object before the cursor, or the selected object
    ///
    /// A pitched note becomes a rest of the same duration; a rest is removed
    /// only when it is the last duration on its staff, which shortens the
    /// staff. Header symbols, accidentals and `None` objects are kept.
    pub fn delete_object(&mut self) -> Result<()> {
        let (staff, target) = match self.selection {
            Selection::ActiveCursor { staff, object, .. } => match self.previous_object(staff, object) {
                Some(previous) => (staff, previous),
                None => return Ok(()),
            },
            Selection::Object { staff, object } => (staff, object),
            Selection::None => return Err(EditError::NoSelectedObject),
        };
        self.clear_selection();
        let follower = self.next_object(staff, target);
        let kind = self.object(staff, target).kind.clone();
        let resume = match kind {
            ObjectKind::Clef(_) | ObjectKind::TimeSig(_) if !self.is_header_object(staff, target) => {
                self.remove_object(staff, target);
                follower
            }
            ObjectKind::KeySig(_) if !self.is_header_object(staff, target) => {
                let before = self.previous_object(staff, target);
                self.remove_object(staff, target);
                let before = before.unwrap_or(target);
                if let Some(follower) = self.next_object(staff, before) {
                    let previous = self.previous_key_sig(staff, follower).map(|(_, key_sig)| key_sig);
                    self.retarget_cancellation(staff, follower, previous.as_ref());
                }
                let follower = self.next_object(staff, before);
                if let Some(follower) = follower {
                    self.reset_from_previous_key_sig(staff, follower);
                }
                follower
            }
            ObjectKind::Duration(duration) if duration.is_pitched() => {
                self.remove_accidental_object(staff, target);
                if let ObjectKind::Duration(duration) = &mut self.object_mut(staff, target).kind {
                    duration.pitch = None;
                }
                if let Some(slice) = self.object(staff, target).slice {
                    self.mark_dirty(slice);
                }
                self.reset_from_previous_key_sig(staff, target);
                self.next_object(staff, target)
            }
            ObjectKind::Duration(_) => self.delete_trailing_rest(staff, target).or(follower),
            _ => follower,
        };
        self.place_cursor(staff, resume.unwrap_or(target));
        log::debug!("Deleted object on staff {}", staff.0);
        Ok(())
    }

    /// Turns the staff's last rest into its terminal object; returns it
    fn delete_trailing_rest(&mut self, staff: StaffIndex, rest: ObjectHandle) -> Option<ObjectHandle> {
        let terminal = self.next_object(staff, rest)?;
        let is_terminal = self.object(staff, terminal).kind == ObjectKind::None
            && self.next_object(staff, terminal).is_none();
        if !is_terminal {
            return None;
        }
        self.remove_object(staff, terminal);
        let slice = self.object(staff, rest).slice?;
        self.object_mut(staff, rest).kind = ObjectKind::None;
        if self.next_slice(slice).is_none() {
            self.set_slice_duration(slice, &Rational::zero());
        }
        self.mark_dirty(slice);
        Some(rest)
    }

    /// Moves the selected note a step up or down, or the selected clef's
    /// baseline, staying within the staff
    pub fn transpose_selected(&mut self, up: bool) -> Result<()> {
        let (staff, object) = self.selected_object()?;
        let line_count = self.staff(staff).line_count as i8;
        match self.object(staff, object).kind.clone() {
            ObjectKind::Clef(mut clef) => {
                let baseline = clef.steps_of_baseline_above_staff_middle + if up { 1 } else { -1 };
                if baseline.abs() < line_count {
                    clef.steps_of_baseline_above_staff_middle = baseline;
                    self.object_mut(staff, object).kind = ObjectKind::Clef(clef);
                }
            }
            ObjectKind::Duration(duration) => {
                let Some(note) = duration.pitch else { return Ok(()) };
                let steps = if up {
                    note.pitch.steps_above_c4.saturating_add(1)
                } else {
                    note.pitch.steps_above_c4.saturating_sub(1)
                };
                let accidental = self.default_accidental(staff, object, steps).accidental;
                if let ObjectKind::Duration(duration) = &mut self.object_mut(staff, object).kind {
                    if let Some(pitch) = duration.pitch.as_mut() {
                        pitch.pitch = Pitch { accidental, steps_above_c4: steps };
                    }
                }
                self.reset_from_previous_key_sig(staff, object);
            }
            _ => return Ok(()),
        }
        if let Some(slice) = self.next_slice_right_of(staff, object) {
            self.mark_dirty(slice);
        }
        Ok(())
    }

    /// Raises or lowers the selected note's accidental by one
    pub fn alter_selected_accidental(&mut self, up: bool) -> Result<()> {
        let (staff, object) = self.selected_object()?;
        let Some(pitch) = self.object(staff, object).pitch() else { return Ok(()) };
        let altered = if up { pitch.accidental.raised() } else { pitch.accidental.lowered() };
        let Some(accidental) = altered else { return Ok(()) };
        self.set_note_accidental(staff, object, accidental);
        self.reset_from_previous_key_sig(staff, object);
        if let Some(slice) = self.next_slice_right_of(staff, object) {
            self.mark_dirty(slice);
        }
        Ok(())
    }
}
