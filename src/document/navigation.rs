//! Selection state and cursor movement

use super::model::Document;
use super::object::{ObjectHandle, ObjectKind};
use super::staff::StaffIndex;
use crate::error::{EditError, Result};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Selection {
    None,

    /// Insertion point directly left of `object`
    #[serde(rename_all = "camelCase")]
    ActiveCursor {
        staff: StaffIndex,
        object: ObjectHandle,

        /// Lowest pitch a letter key resolves to
        range_floor: i8,
    },

    Object { staff: StaffIndex, object: ObjectHandle },
}

/// First pitch at or above `range_floor` with the given letter name
pub fn pitch_from_letter(range_floor: i8, letter_name: u8) -> i8 {
    let floor = range_floor as i32;
    let mut steps = 7 * floor.div_euclid(7) + letter_name as i32;
    if floor.rem_euclid(7) > letter_name as i32 {
        steps += 7;
    }
    steps.clamp(i8::MIN as i32, i8::MAX as i32) as i8
}

impl Document {
    pub(crate) fn active_cursor(&self) -> Result<(StaffIndex, ObjectHandle, i8)> {
        match self.selection {
            Selection::ActiveCursor { staff, object, range_floor } => Ok((staff, object, range_floor)),
            _ => Err(EditError::NoActiveCursor),
        }
    }

    pub(crate) fn selected_object(&self) -> Result<(StaffIndex, ObjectHandle)> {
        match self.selection {
            Selection::Object { staff, object } => Ok((staff, object)),
            _ => Err(EditError::NoSelectedObject),
        }
    }

    pub fn clear_selection(&mut self) {
        if let Selection::Object { staff, object } = self.selection {
            if self.is_live(staff, object) {
                self.object_mut(staff, object).is_selected = false;
            }
        }
        self.selection = Selection::None;
    }

    pub fn select_object(&mut self, staff: StaffIndex, object: ObjectHandle) -> Result<()> {
        self.check_object(staff, object)?;
        self.clear_selection();
        self.object_mut(staff, object).is_selected = true;
        self.selection = Selection::Object { staff, object };
        Ok(())
    }

    /// Places the cursor at the first valid position at or after `object`
    pub fn set_cursor(&mut self, staff: StaffIndex, object: ObjectHandle) -> Result<()> {
        self.check_object(staff, object)?;
        self.clear_selection();
        self.place_cursor(staff, object);
        Ok(())
    }

    pub(crate) fn place_cursor(&mut self, staff: StaffIndex, object: ObjectHandle) {
        let object = self.first_valid_at_or_after(staff, object);
        let range_floor = self.range_floor_before(staff, object);
        self.selection = Selection::ActiveCursor { staff, object, range_floor };
    }

    pub(crate) fn first_valid_at_or_after(&self, staff: StaffIndex, object: ObjectHandle) -> ObjectHandle {
        let objects = &self.staff(staff).objects;
        objects
            .iter_from(objects.cursor_of(object))
            .find(|(_, candidate)| candidate.is_valid_cursor_position)
            .map(|(handle, _)| handle)
            .unwrap_or(object)
    }

    /// Range floor implied by the nearest clef or note left of `object`
    pub(crate) fn range_floor_before(&self, staff: StaffIndex, object: ObjectHandle) -> i8 {
        let objects = &self.staff(staff).objects;
        let mut cursor = objects.cursor_of(object);
        while let Some(previous) = objects.prev(cursor) {
            cursor = previous;
            match objects.get(cursor).map(|object| &object.kind) {
                Some(ObjectKind::Clef(clef)) => return clef.middle_pitch().saturating_sub(3),
                Some(ObjectKind::Duration(duration)) => {
                    if let Some(note) = &duration.pitch {
                        return note.pitch.steps_above_c4.saturating_sub(3);
                    }
                }
                _ => {}
            }
        }
        super::object::Clef::treble().middle_pitch() - 3
    }

    /// Moves the cursor to the next valid position, tracking the range floor
    /// through every object it passes
    pub fn cursor_right(&mut self) -> Result<()> {
        let (staff, object, mut range_floor) = self.active_cursor()?;
        let objects = &self.staff(staff).objects;
        let mut target = None;
        for (handle, candidate) in objects.iter_from(objects.cursor_of(object)) {
            if handle != object && candidate.is_valid_cursor_position {
                target = Some(handle);
                break;
            }
            match &candidate.kind {
                ObjectKind::Clef(clef) => range_floor = clef.middle_pitch().saturating_sub(3),
                ObjectKind::Duration(duration) => {
                    if let Some(note) = &duration.pitch {
                        range_floor = note.pitch.steps_above_c4.saturating_sub(3);
                    }
                }
                _ => {}
            }
        }
        if let Some(object) = target {
            self.selection = Selection::ActiveCursor { staff, object, range_floor };
        }
        Ok(())
    }

    pub fn cursor_left(&mut self) -> Result<()> {
        let (staff, object, mut range_floor) = self.active_cursor()?;
        let objects = &self.staff(staff).objects;
        let mut cursor = objects.cursor_of(object);
        let mut target = None;
        while let Some(previous) = objects.prev(cursor) {
            cursor = previous;
            let Some(candidate) = objects.get(cursor) else { break };
            if let Some(pitch) = candidate.pitch() {
                range_floor = pitch.steps_above_c4.saturating_sub(3);
            }
            if candidate.is_valid_cursor_position {
                target = objects.handle_at(cursor);
                break;
            }
        }
        if let Some(object) = target {
            self.selection = Selection::ActiveCursor { staff, object, range_floor };
        }
        Ok(())
    }

    pub fn shift_cursor_octave(&mut self, up: bool) -> Result<()> {
        let (staff, object, range_floor) = self.active_cursor()?;
        let range_floor = if up { range_floor.saturating_add(7) } else { range_floor.saturating_sub(7) };
        self.selection = Selection::ActiveCursor { staff, object, range_floor };
        Ok(())
    }
}
