//! The document: slices, staves and the selection
//!
//! All editing state lives on one [`Document`] value that is passed by
//! reference into every operation. Records are reached through handles, so
//! the paged sequences underneath are free to move them between pages.

use super::navigation::Selection;
use super::object::{Object, ObjectHandle, ObjectKind};
use super::slice::{Association, HeaderSlices, SliceHandle};
use super::staff::{Staff, StaffIndex, StaffSpec};
use crate::config::EngineConfig;
use crate::error::{EditError, Result};
use crate::memory::{Arena, Location, PagedSequence};
use crate::rational::{RationalStore, Rational};

#[derive(Debug)]
pub struct Document {
    pub(crate) config: EngineConfig,
    pub(crate) slices: PagedSequence<super::slice::Slice>,
    pub(crate) associations: Arena<Association>,
    pub(crate) rationals: RationalStore,
    pub(crate) staves: Arena<Staff>,
    pub(crate) staff_order: Vec<StaffIndex>,
    pub(crate) header: HeaderSlices,
    pub(crate) selection: Selection,
}

impl Document {
    /// Creates an empty document holding only the five header slices
    pub fn new(config: EngineConfig) -> Self {
        debug_assert!(config.validate().is_ok(), "document created from an invalid config");
        let mut slices = PagedSequence::with_config(&config);
        let mut rationals = RationalStore::with_config(&config);
        let mut push = |duration: Option<Rational>| {
            let stored = duration.map(|value| rationals.persist(&value));
            slices.push_back(super::slice::Slice::new(stored))
        };
        let header = HeaderSlices {
            staff_start: push(Some(Rational::zero())),
            clef: push(None),
            key_sig: push(None),
            time_sig: push(None),
            body_start: push(Some(Rational::zero())),
        };
        let staff_start = slices.resolve_mut(header.staff_start);
        staff_start.distance_from_previous_slice = config.staff_start_distance;
        staff_start.needs_respacing = false;
        log::info!("Created document ({} slices per page)", slices.page_capacity());
        Self {
            associations: Arena::new(config.reserved_slots, config.commit_slots),
            staves: Arena::new(config.reserved_slots, config.commit_slots),
            config,
            slices,
            rationals,
            staff_order: Vec::new(),
            header,
            selection: Selection::None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn header(&self) -> HeaderSlices {
        self.header
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Appends a staff below the existing ones and seeds its header
    pub fn add_staff(&mut self, spec: StaffSpec) -> StaffIndex {
        let distance_from_staff_above = if self.staff_order.is_empty() {
            self.config.top_staff_middle_y
        } else {
            self.config.staff_spacing
        };
        let staff = StaffIndex(self.staves.allocate(Staff {
            objects: PagedSequence::with_config(&self.config),
            line_count: spec.line_count,
            scale_index: spec.scale_index,
            distance_from_staff_above,
        }));
        self.staff_order.push(staff);

        let header = self.header;
        self.push_object(staff, Object::new(ObjectKind::None, false), Some(header.staff_start));
        self.push_object(staff, Object::new(ObjectKind::Clef(spec.clef), false), Some(header.clef));
        if !spec.key_sig.accidentals.is_empty() && !spec.key_sig.is_cancellation() {
            self.push_object(staff, Object::new(ObjectKind::KeySig(spec.key_sig), false), Some(header.key_sig));
        }
        self.push_object(staff, Object::new(ObjectKind::TimeSig(spec.time_sig), false), Some(header.time_sig));
        self.push_object(staff, Object::new(ObjectKind::None, true), Some(header.body_start));
        log::debug!("Added staff {} ({} lines)", staff.0, spec.line_count);
        staff
    }

    pub fn staff_count(&self) -> usize {
        self.staff_order.len()
    }

    /// Staves from top to bottom
    pub fn staff_order(&self) -> &[StaffIndex] {
        &self.staff_order
    }

    pub fn staff(&self, staff: StaffIndex) -> &Staff {
        self.staves.get(staff.0)
    }

    pub(crate) fn staff_mut(&mut self, staff: StaffIndex) -> &mut Staff {
        self.staves.get_mut(staff.0)
    }

    pub fn check_staff(&self, staff: StaffIndex) -> Result<()> {
        if staff.0 == crate::memory::NULL_INDEX || !self.staves.contains(staff.0) {
            return Err(EditError::UnknownStaff(staff.0));
        }
        Ok(())
    }

    pub fn check_object(&self, staff: StaffIndex, object: ObjectHandle) -> Result<()> {
        self.check_staff(staff)?;
        if !self.staff(staff).objects.is_live(object) {
            return Err(EditError::UnknownObject(object.index()));
        }
        Ok(())
    }

    pub fn staff_space_height(&self, staff: StaffIndex) -> f32 {
        self.config.default_staff_space_height * self.config.staff_scale(self.staff(staff).scale_index)
    }

    pub fn object(&self, staff: StaffIndex, object: ObjectHandle) -> &Object {
        self.staff(staff).objects.resolve(object)
    }

    pub(crate) fn object_mut(&mut self, staff: StaffIndex, object: ObjectHandle) -> &mut Object {
        self.staff_mut(staff).objects.resolve_mut(object)
    }

    pub fn is_live(&self, staff: StaffIndex, object: ObjectHandle) -> bool {
        self.staves.contains(staff.0) && self.staff(staff).objects.is_live(object)
    }

    /// Current physical location of an object's record
    pub fn locate(&self, staff: StaffIndex, object: ObjectHandle) -> Location {
        self.staff(staff).objects.locate(object)
    }

    /// Staff objects in order as `(handle, object)` pairs
    pub fn staff_objects(&self, staff: StaffIndex) -> impl Iterator<Item = (ObjectHandle, &Object)> {
        self.staff(staff).objects.iter()
    }

    pub fn next_object(&self, staff: StaffIndex, object: ObjectHandle) -> Option<ObjectHandle> {
        let objects = &self.staff(staff).objects;
        objects.handle_at(objects.next(objects.cursor_of(object)))
    }

    pub fn previous_object(&self, staff: StaffIndex, object: ObjectHandle) -> Option<ObjectHandle> {
        let objects = &self.staff(staff).objects;
        objects.prev(objects.cursor_of(object)).and_then(|cursor| objects.handle_at(cursor))
    }

    pub fn last_object(&self, staff: StaffIndex) -> Option<ObjectHandle> {
        let objects = &self.staff(staff).objects;
        objects.last().and_then(|cursor| objects.handle_at(cursor))
    }

    /// Slice of `object`, or of the first object right of it that has one
    pub fn next_slice_right_of(&self, staff: StaffIndex, object: ObjectHandle) -> Option<SliceHandle> {
        let objects = &self.staff(staff).objects;
        objects.iter_from(objects.cursor_of(object)).find_map(|(_, object)| object.slice)
    }

    /// Whether `object` sits in the clef, key or time signature header slice
    pub fn is_header_object(&self, staff: StaffIndex, object: ObjectHandle) -> bool {
        self.object(staff, object).slice.map_or(false, |slice| self.header.holds_header_symbols(slice))
    }

    pub(crate) fn push_object(&mut self, staff: StaffIndex, object: Object, slice: Option<SliceHandle>) -> ObjectHandle {
        let mut cursor = self.staff(staff).objects.end();
        self.insert_object_at(staff, &mut cursor, object, slice)
    }

    pub(crate) fn insert_object_before(
        &mut self,
        staff: StaffIndex,
        before: ObjectHandle,
        object: Object,
        slice: Option<SliceHandle>,
    ) -> ObjectHandle {
        let mut cursor = self.staff(staff).objects.cursor_of(before);
        self.insert_object_at(staff, &mut cursor, object, slice)
    }

    fn insert_object_at(
        &mut self,
        staff: StaffIndex,
        cursor: &mut crate::memory::Cursor,
        object: Object,
        slice: Option<SliceHandle>,
    ) -> ObjectHandle {
        let handle = self.staff_mut(staff).objects.insert_before(cursor, object);
        match slice {
            Some(slice) => self.add_association(slice, staff, handle),
            None => {
                if let Some(next) = self.next_slice_right_of(staff, handle) {
                    self.mark_dirty(next);
                }
            }
        }
        handle
    }

    /// Moves an object already on the staff into `slice`
    pub(crate) fn move_to_slice(&mut self, staff: StaffIndex, object: ObjectHandle, slice: SliceHandle) {
        if self.object(staff, object).slice == Some(slice) {
            return;
        }
        self.detach_from_slice(staff, object);
        self.add_association(slice, staff, object);
    }

    /// Removes `object` from its staff, with its displayed accidental if it
    /// is a note
    pub(crate) fn remove_object(&mut self, staff: StaffIndex, object: ObjectHandle) -> Object {
        self.remove_accidental_object(staff, object);
        if let ObjectKind::Accidental { note } = self.object(staff, object).kind {
            let note = self.object_mut(staff, note);
            note.is_valid_cursor_position = true;
            if let ObjectKind::Duration(duration) = &mut note.kind {
                if let Some(pitch) = duration.pitch.as_mut() {
                    pitch.accidental_object = None;
                }
            }
        }
        self.detach_from_slice(staff, object);
        if let Selection::ActiveCursor { object: cursor, staff: cursor_staff, .. } = self.selection {
            if cursor == object && cursor_staff == staff {
                self.selection = Selection::None;
            }
        }
        if let Selection::Object { object: selected, staff: selected_staff } = self.selection {
            if selected == object && selected_staff == staff {
                self.selection = Selection::None;
            }
        }
        self.staff_mut(staff).objects.remove(object)
    }

    /// Drops the accidental object displayed before a note, if there is one
    pub(crate) fn remove_accidental_object(&mut self, staff: StaffIndex, note: ObjectHandle) {
        let accidental = match &mut self.object_mut(staff, note).kind {
            ObjectKind::Duration(duration) => {
                duration.pitch.as_mut().and_then(|pitch| pitch.accidental_object.take())
            }
            _ => None,
        };
        if let Some(accidental) = accidental {
            self.object_mut(staff, note).is_valid_cursor_position = true;
            self.detach_from_slice(staff, accidental);
            self.staff_mut(staff).objects.remove(accidental);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Clef, KeySig};

    fn create_test_document() -> Document {
        Document::new(EngineConfig::default())
    }

    #[test]
    fn test_add_staff_seeds_header_objects() {
        let mut document = create_test_document();
        let staff = document.add_staff(StaffSpec { key_sig: KeySig::new(2, true), ..StaffSpec::default() });
        let kinds: Vec<ObjectKind> = document.staff_objects(staff).map(|(_, object)| object.kind.clone()).collect();
        assert_eq!(kinds.len(), 5);
        assert_eq!(kinds[0], ObjectKind::None);
        assert_eq!(kinds[1], ObjectKind::Clef(Clef::treble()));
        assert!(matches!(kinds[2], ObjectKind::KeySig(_)));
        assert_eq!(kinds[4], ObjectKind::None);

        let valid: Vec<bool> =
            document.staff_objects(staff).map(|(_, object)| object.is_valid_cursor_position).collect();
        assert_eq!(valid, vec![false, false, false, false, true]);
    }

    #[test]
    fn test_key_sig_without_accidentals_is_omitted() {
        let mut document = create_test_document();
        let staff = document.add_staff(StaffSpec::default());
        assert_eq!(document.staff_objects(staff).count(), 4);
        assert!(document.object_at_slice(document.header().key_sig, staff).is_none());
    }

    #[test]
    fn test_staves_stack_vertically() {
        let mut document = create_test_document();
        let first = document.add_staff(StaffSpec::default());
        let second = document.add_staff(StaffSpec::default());
        assert_eq!(document.staff(first).distance_from_staff_above, 135);
        assert_eq!(document.staff(second).distance_from_staff_above, 80);
        assert_eq!(document.staff_order(), &[first, second]);
        assert!(document.check_staff(StaffIndex(99)).is_err());
    }

    #[test]
    fn test_handles_survive_page_splits() {
        let mut document = create_test_document();
        let staff = document.add_staff(StaffSpec::default());
        let body = document.last_object(staff).unwrap();
        let mut inserted = Vec::new();
        for _ in 0..500 {
            inserted.push(document.insert_object_before(
                staff,
                body,
                Object::new(ObjectKind::Clef(Clef::bass()), true),
                None,
            ));
        }
        assert!(document.staff(staff).objects.page_count() > 1);
        for handle in inserted {
            assert_eq!(document.object(staff, handle).kind, ObjectKind::Clef(Clef::bass()));
        }
        assert_eq!(document.object(staff, body).kind, ObjectKind::None);
        assert_eq!(document.next_object(staff, body), None);
    }
}
