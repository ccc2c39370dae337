//! Overwriting rhythmic content with a new duration
//!
//! The new duration replaces the object at the anchor and covers whatever
//! started within its span. Slices are split exactly where the new duration
//! ends inside one, and rests fill any time left before the next surviving
//! object, so the staff's total time never changes.

use super::model::Document;
use super::object::{Duration, Object, ObjectHandle, ObjectKind};
use super::slice::SliceHandle;
use super::staff::StaffIndex;
use crate::rational::{Rational, MAX_LOG2_DURATION, MIN_LOG2_DURATION};
use std::cmp::Ordering;

/// Where an overwrite stops on its staff
#[derive(Debug, PartialEq)]
enum OverwriteEnd {
    /// The staff ends before the new duration does
    PastStaffEnd,

    /// `object` is the first object starting at or after the end of the new
    /// duration, `gap` later
    Object { object: ObjectHandle, gap: Rational },
}

impl Document {
    /// Replaces the rhythmic content starting at `anchor` with `duration`,
    /// returning the object that now holds it
    pub(crate) fn overwrite_with_duration(
        &mut self,
        staff: StaffIndex,
        anchor: ObjectHandle,
        duration: Duration,
    ) -> ObjectHandle {
        let note = self.remove_sliceless_from(staff, anchor);
        let Some(note_slice) = self.object(staff, note).slice else {
            debug_assert!(false, "staff does not end with a slice object");
            return note;
        };
        self.remove_accidental_object(staff, note);
        let length = duration.whole_notes_long();
        let object = self.object_mut(staff, note);
        object.kind = ObjectKind::Duration(duration);
        object.is_valid_cursor_position = true;
        self.mark_dirty(note_slice);

        match self.find_overwrite_end(staff, note, note_slice, &length) {
            OverwriteEnd::PastStaffEnd => {
                while let Some(next) = self.next_object(staff, note) {
                    self.remove_object(staff, next);
                }
                let end = self.advance_slice(note_slice, &length);
                self.push_object(staff, Object::new(ObjectKind::None, true), Some(end));
            }
            OverwriteEnd::Object { object, gap } => {
                let insert_point = self.start_of_sliceless_run(staff, note, object);
                while let Some(next) = self.next_object(staff, note) {
                    if next == insert_point {
                        break;
                    }
                    self.remove_object(staff, next);
                }
                self.fill_with_rests(staff, note_slice, length, gap, insert_point);
            }
        }
        note
    }

    /// Drops sliceless objects from `anchor` on until one in a slice is found
    fn remove_sliceless_from(&mut self, staff: StaffIndex, anchor: ObjectHandle) -> ObjectHandle {
        let mut current = anchor;
        while self.object(staff, current).slice.is_none() {
            let Some(next) = self.next_object(staff, current) else { break };
            self.remove_object(staff, current);
            current = next;
        }
        current
    }

    fn find_overwrite_end(
        &self,
        staff: StaffIndex,
        note: ObjectHandle,
        note_slice: SliceHandle,
        length: &Rational,
    ) -> OverwriteEnd {
        let mut remaining = length.clone();
        let mut end_slice = note_slice;
        let mut current = self.next_object(staff, note);
        while let Some(object) = current {
            if let Some(slice) = self.object(staff, object).slice {
                while end_slice != slice {
                    let duration = self.slice_duration_or_zero(end_slice);
                    let Some(next) = self.next_slice(end_slice) else {
                        return OverwriteEnd::PastStaffEnd;
                    };
                    if remaining > duration {
                        remaining = &remaining - &duration;
                        end_slice = next;
                        continue;
                    }
                    let mut gap = &duration - &remaining;
                    let mut walker = next;
                    while walker != slice {
                        gap = &gap + &self.slice_duration_or_zero(walker);
                        match self.next_slice(walker) {
                            Some(following) => walker = following,
                            None => return OverwriteEnd::PastStaffEnd,
                        }
                    }
                    return OverwriteEnd::Object { object, gap };
                }
            }
            current = self.next_object(staff, object);
        }
        OverwriteEnd::PastStaffEnd
    }

    /// Slice `length` after the start of `start`, splitting a slice or
    /// extending the sequence when no slice begins exactly there
    pub(crate) fn advance_slice(&mut self, start: SliceHandle, length: &Rational) -> SliceHandle {
        let mut remaining = length.clone();
        let mut previous = start;
        loop {
            let Some(current) = self.next_slice(previous) else {
                self.set_slice_duration(previous, &remaining);
                return self.insert_slice_after(previous, Some(&Rational::zero()));
            };
            let duration = self.slice_duration_or_zero(previous);
            match remaining.cmp(&duration) {
                Ordering::Less => {
                    let split = self.insert_slice_after(previous, Some(&(&duration - &remaining)));
                    self.set_slice_duration(previous, &remaining);
                    return split;
                }
                Ordering::Equal => return current,
                Ordering::Greater => {
                    remaining = &remaining - &duration;
                    previous = current;
                }
            }
        }
    }

    /// First of the sliceless objects directly before `end`, or `end`
    fn start_of_sliceless_run(&self, staff: StaffIndex, note: ObjectHandle, end: ObjectHandle) -> ObjectHandle {
        let mut start = end;
        while let Some(previous) = self.previous_object(staff, start) {
            if previous == note || self.object(staff, previous).slice.is_some() {
                break;
            }
            start = previous;
        }
        start
    }

    /// Fills `gap` after the overwritten duration with the fewest dyadic rests
    fn fill_with_rests(
        &mut self,
        staff: StaffIndex,
        note_slice: SliceHandle,
        length: Rational,
        gap: Rational,
        insert_point: ObjectHandle,
    ) {
        let mut slice = note_slice;
        let mut previous_length = length;
        let mut remaining = gap;
        let mut log2 = MAX_LOG2_DURATION;
        while !remaining.is_zero() {
            let rest_length = Rational::power_of_two(log2 as i32);
            if rest_length <= remaining {
                slice = self.advance_slice(slice, &previous_length);
                let rest = Object::new(ObjectKind::Duration(Duration::rest(log2, 0)), true);
                self.insert_object_before(staff, insert_point, rest, Some(slice));
                remaining = &remaining - &rest_length;
                previous_length = rest_length;
            } else if log2 > MIN_LOG2_DURATION {
                log2 -= 1;
            } else {
                debug_assert!(false, "gap {} is not a multiple of the shortest duration", remaining);
                break;
            }
        }
    }
}
