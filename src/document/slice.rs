//! Time columns shared by every staff
//!
//! A slice is rhythmic when it carries a duration (the time until the next
//! rhythmic slice) and a header slice when it does not; header slices are
//! positioned by symbol width alone. Each slice heads a singly linked list of
//! `(staff, object)` associations stored in a pooled [`Arena`].

use super::model::Document;
use super::object::ObjectHandle;
use super::staff::StaffIndex;
use crate::memory::{Arena, Cursor, Handle, NULL_INDEX};
use crate::rational::{Rational, StoredRational};

pub type SliceHandle = Handle<Slice>;

#[derive(Debug)]
pub struct Slice {
    pub(crate) first_association: u32,

    /// `None` marks a header slice
    pub(crate) duration: Option<StoredRational>,

    /// Horizontal offset from the previous slice, as of the last respacing
    pub distance_from_previous_slice: i32,

    pub needs_respacing: bool,
}

impl Slice {
    pub(crate) fn new(duration: Option<StoredRational>) -> Self {
        Self {
            first_association: NULL_INDEX,
            duration,
            distance_from_previous_slice: 0,
            needs_respacing: true,
        }
    }

    pub fn is_rhythmic(&self) -> bool {
        self.duration.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.first_association == NULL_INDEX
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Association {
    pub staff: StaffIndex,
    pub object: ObjectHandle,
    pub(crate) next: u32,
}

/// The five slices every document starts with; none is ever removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderSlices {
    pub staff_start: SliceHandle,
    pub clef: SliceHandle,
    pub key_sig: SliceHandle,
    pub time_sig: SliceHandle,
    pub body_start: SliceHandle,
}

impl HeaderSlices {
    pub fn contains(&self, slice: SliceHandle) -> bool {
        [self.staff_start, self.clef, self.key_sig, self.time_sig, self.body_start].contains(&slice)
    }

    /// Slices holding the clef, key signature and time signature of each staff
    pub fn holds_header_symbols(&self, slice: SliceHandle) -> bool {
        slice == self.clef || slice == self.key_sig || slice == self.time_sig
    }
}

/// Iterator over the associations of one slice
pub struct Associations<'a> {
    arena: &'a Arena<Association>,
    index: u32,
}

impl<'a> Iterator for Associations<'a> {
    type Item = (StaffIndex, ObjectHandle);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index == NULL_INDEX {
            return None;
        }
        let association = self.arena.get(self.index);
        self.index = association.next;
        Some((association.staff, association.object))
    }
}

impl Document {
    pub fn slice(&self, slice: SliceHandle) -> &Slice {
        self.slices.resolve(slice)
    }

    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    pub fn is_live_slice(&self, slice: SliceHandle) -> bool {
        self.slices.is_live(slice)
    }

    /// Every slice handle in time order
    pub fn slice_handles(&self) -> Vec<SliceHandle> {
        self.slices.iter().map(|(handle, _)| handle).collect()
    }

    pub fn associations(&self, slice: SliceHandle) -> Associations<'_> {
        Associations { arena: &self.associations, index: self.slices.resolve(slice).first_association }
    }

    pub fn object_at_slice(&self, slice: SliceHandle, staff: StaffIndex) -> Option<ObjectHandle> {
        self.associations(slice).find(|(owner, _)| *owner == staff).map(|(_, object)| object)
    }

    pub fn slice_duration(&self, slice: SliceHandle) -> Option<Rational> {
        self.slices.resolve(slice).duration.as_ref().map(|stored| self.rationals.load(stored))
    }

    pub(crate) fn slice_duration_or_zero(&self, slice: SliceHandle) -> Rational {
        self.slice_duration(slice).unwrap_or_else(Rational::zero)
    }

    pub(crate) fn set_slice_duration(&mut self, slice: SliceHandle, value: &Rational) {
        let entry = self.slices.resolve_mut(slice);
        match &mut entry.duration {
            Some(stored) => self.rationals.replace(stored, value),
            None => entry.duration = Some(self.rationals.persist(value)),
        }
        self.mark_dirty(slice);
    }

    pub fn next_slice(&self, slice: SliceHandle) -> Option<SliceHandle> {
        let cursor = self.slices.next(self.slices.cursor_of(slice));
        self.slices.handle_at(cursor)
    }

    pub fn previous_slice(&self, slice: SliceHandle) -> Option<SliceHandle> {
        let cursor = self.slices.prev(self.slices.cursor_of(slice))?;
        self.slices.handle_at(cursor)
    }

    /// Nearest rhythmic slice strictly before `slice`
    pub fn previous_rhythmic_slice(&self, slice: SliceHandle) -> Option<SliceHandle> {
        let mut cursor = self.slices.cursor_of(slice);
        loop {
            cursor = self.slices.prev(cursor)?;
            if self.slices.get(cursor).map_or(false, Slice::is_rhythmic) {
                return self.slices.handle_at(cursor);
            }
        }
    }

    /// Inserts a slice before `cursor`, leaving `cursor` on it
    pub(crate) fn insert_slice_before(&mut self, cursor: &mut Cursor, duration: Option<&Rational>) -> SliceHandle {
        let stored = duration.map(|value| self.rationals.persist(value));
        let handle = self.slices.insert_before(cursor, Slice::new(stored));
        self.mark_dirty(handle);
        handle
    }

    pub(crate) fn insert_slice_after(&mut self, slice: SliceHandle, duration: Option<&Rational>) -> SliceHandle {
        let mut cursor = self.slices.next(self.slices.cursor_of(slice));
        self.insert_slice_before(&mut cursor, duration)
    }

    /// Flags `slice` and the slice after it for respacing
    pub(crate) fn mark_dirty(&mut self, slice: SliceHandle) {
        let cursor = self.slices.cursor_of(slice);
        if let Some(entry) = self.slices.get_mut(cursor) {
            entry.needs_respacing = true;
        }
        let next = self.slices.next(cursor);
        if let Some(entry) = self.slices.get_mut(next) {
            entry.needs_respacing = true;
        }
    }

    pub(crate) fn add_association(&mut self, slice: SliceHandle, staff: StaffIndex, object: ObjectHandle) {
        let next = self.slices.resolve(slice).first_association;
        let index = self.associations.allocate(Association { staff, object, next });
        self.slices.resolve_mut(slice).first_association = index;
        self.staff_mut(staff).objects.resolve_mut(object).slice = Some(slice);
        self.mark_dirty(slice);
    }

    fn unlink_association(&mut self, slice: SliceHandle, staff: StaffIndex, object: ObjectHandle) {
        let mut previous = NULL_INDEX;
        let mut index = self.slices.resolve(slice).first_association;
        while index != NULL_INDEX {
            let association = *self.associations.get(index);
            if association.staff == staff && association.object == object {
                if previous == NULL_INDEX {
                    self.slices.resolve_mut(slice).first_association = association.next;
                } else {
                    self.associations.get_mut(previous).next = association.next;
                }
                self.associations.free(index);
                return;
            }
            previous = index;
            index = association.next;
        }
        debug_assert!(false, "object is not associated with its slice");
    }

    /// Takes `object` out of its slice
    ///
    /// A non-header slice left without associations is removed, and its
    /// duration is added to the nearest rhythmic slice before it, so the
    /// time position of every remaining slice is unchanged.
    pub(crate) fn detach_from_slice(&mut self, staff: StaffIndex, object: ObjectHandle) {
        let Some(slice) = self.staff(staff).objects.resolve(object).slice else {
            if let Some(next) = self.next_slice_right_of(staff, object) {
                self.mark_dirty(next);
            }
            return;
        };
        self.unlink_association(slice, staff, object);
        self.staff_mut(staff).objects.resolve_mut(object).slice = None;
        if !self.slices.resolve(slice).is_empty() || self.header.contains(slice) {
            self.mark_dirty(slice);
            return;
        }
        let previous = self.previous_rhythmic_slice(slice);
        let mut cursor = self.slices.cursor_of(slice);
        let removed = self.slices.remove_at(&mut cursor);
        if let Some(stored) = removed.duration {
            let folded = self.rationals.load(&stored);
            self.rationals.release(stored);
            if let Some(previous) = previous {
                let total = &self.slice_duration_or_zero(previous) + &folded;
                self.set_slice_duration(previous, &total);
            }
        }
        if let Some(entry) = self.slices.get_mut(cursor) {
            entry.needs_respacing = true;
        }
    }

    /// Sum of the durations of the rhythmic slices from `from` up to, not
    /// including, `to`
    pub fn time_between(&self, from: SliceHandle, to: SliceHandle) -> Rational {
        let mut total = Rational::zero();
        let mut cursor = self.slices.cursor_of(from);
        while let Some(handle) = self.slices.handle_at(cursor) {
            if handle == to {
                break;
            }
            if let Some(duration) = self.slice_duration(handle) {
                total = &total + &duration;
            }
            cursor = self.slices.next(cursor);
        }
        total
    }
}
