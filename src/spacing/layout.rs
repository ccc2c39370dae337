//! Layout queries for rendering
//!
//! Positions are derived on demand from the distances the last respacing
//! stored on slices and objects. [`Layout`] bundles them into one structure
//! for the presentation layer.

use super::metrics::GlyphMetrics;
use crate::document::{Clef, Document, Object, ObjectHandle, ObjectKind, SliceHandle, StaffIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SliceLayout {
    pub handle: u32,
    pub x: i32,
    pub is_rhythmic: bool,
    pub needs_respacing: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectLayout {
    pub handle: u32,
    pub x: i32,
    pub kind: ObjectKind,

    /// Staff steps above the middle line of each vertically placed glyph:
    /// the notehead, the accidental, or every key signature accidental
    pub steps: Vec<i8>,

    pub is_selected: bool,
    pub is_valid_cursor_position: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffLayout {
    pub index: u32,
    pub middle_y: i32,
    pub line_count: u8,
    pub space_height: f32,
    pub objects: Vec<ObjectLayout>,
}

/// Everything the renderer needs to draw the document
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub slices: Vec<SliceLayout>,
    pub staves: Vec<StaffLayout>,
}

impl Document {
    /// Horizontal position of `slice`
    pub fn slice_x(&self, slice: SliceHandle) -> i32 {
        let mut x = 0;
        for (handle, entry) in self.slices.iter() {
            x += entry.distance_from_previous_slice;
            if handle == slice {
                break;
            }
        }
        x
    }

    /// Horizontal position of the origin of `object`
    pub fn object_x(&self, staff: StaffIndex, object: ObjectHandle) -> i32 {
        let slice_x = self.next_slice_right_of(staff, object).map_or(0, |slice| self.slice_x(slice));
        slice_x - self.object(staff, object).distance_to_next_slice
    }

    /// Vertical position of the middle line of `staff`
    pub fn staff_middle_y(&self, staff: StaffIndex) -> i32 {
        let mut y = 0;
        for index in &self.staff_order {
            y += self.staff(*index).distance_from_staff_above;
            if *index == staff {
                break;
            }
        }
        y
    }

    /// Staff whose middle line is closest to `y`, if within half the staff
    /// spacing of it
    pub fn staff_at_y(&self, y: i32) -> Option<StaffIndex> {
        let reach = self.config.staff_spacing / 2;
        self.staff_order
            .iter()
            .map(|staff| (*staff, (self.staff_middle_y(*staff) - y).abs()))
            .filter(|(_, distance)| *distance <= reach)
            .min_by_key(|(_, distance)| *distance)
            .map(|(staff, _)| staff)
    }

    /// Object whose glyph covers the point, if any
    pub fn hit_test(&self, x: i32, y: i32, metrics: &dyn GlyphMetrics) -> Option<(StaffIndex, ObjectHandle)> {
        let staff = self.staff_at_y(y)?;
        let x = x as f32;
        let slice_xs = self.slice_positions();
        self.staff_object_xs(staff, &slice_xs).into_iter().find_map(|(handle, left)| {
            let left = left as f32;
            let right = left + self.glyph_extent(staff, handle, metrics);
            (x >= left && x < right).then_some((staff, handle))
        })
    }

    /// Horizontal position of every slice, in one pass
    fn slice_positions(&self) -> HashMap<SliceHandle, i32> {
        let mut x = 0;
        self.slices
            .iter()
            .map(|(handle, slice)| {
                x += slice.distance_from_previous_slice;
                (handle, x)
            })
            .collect()
    }

    /// Origins of the objects of `staff` in order, walking back from the end
    /// so each object sees the slice at or after it
    fn staff_object_xs(&self, staff: StaffIndex, slice_xs: &HashMap<SliceHandle, i32>) -> Vec<(ObjectHandle, i32)> {
        let objects: Vec<(ObjectHandle, &Object)> = self.staff_objects(staff).collect();
        let mut next_slice_x = None;
        let mut xs: Vec<(ObjectHandle, i32)> = objects
            .iter()
            .rev()
            .map(|(handle, object)| {
                if let Some(slice) = object.slice {
                    next_slice_x = slice_xs.get(&slice).copied();
                }
                (*handle, next_slice_x.map_or(0, |slice_x| slice_x - object.distance_to_next_slice))
            })
            .collect();
        xs.reverse();
        xs
    }

    pub fn layout(&self) -> Layout {
        let slice_xs = self.slice_positions();
        let slices = self
            .slices
            .iter()
            .map(|(handle, slice)| SliceLayout {
                handle: handle.index(),
                x: slice_xs.get(&handle).copied().unwrap_or_default(),
                is_rhythmic: slice.is_rhythmic(),
                needs_respacing: slice.needs_respacing,
            })
            .collect();
        let staves = self
            .staff_order
            .iter()
            .map(|staff| {
                let mut middle_pitch = Clef::treble().middle_pitch();
                let objects = self
                    .staff_objects(*staff)
                    .zip(self.staff_object_xs(*staff, &slice_xs))
                    .map(|((handle, object), (_, x))| {
                        if let ObjectKind::Clef(clef) = &object.kind {
                            middle_pitch = clef.middle_pitch();
                        }
                        ObjectLayout {
                            handle: handle.index(),
                            x,
                            kind: object.kind.clone(),
                            steps: self.staff_steps(*staff, object, middle_pitch),
                            is_selected: object.is_selected,
                            is_valid_cursor_position: object.is_valid_cursor_position,
                        }
                    })
                    .collect();
                StaffLayout {
                    index: staff.0,
                    middle_y: self.staff_middle_y(*staff),
                    line_count: self.staff(*staff).line_count,
                    space_height: self.staff_space_height(*staff),
                    objects,
                }
            })
            .collect();
        Layout { slices, staves }
    }

    fn staff_steps(&self, staff: StaffIndex, object: &Object, middle_pitch: i8) -> Vec<i8> {
        let pitch = match &object.kind {
            ObjectKind::Duration(_) => object.pitch(),
            ObjectKind::Accidental { note } => self.object(staff, *note).pitch(),
            ObjectKind::KeySig(key_sig) => return key_sig.accidental_steps(middle_pitch).collect(),
            _ => None,
        };
        pitch.map(|pitch| vec![pitch.steps_above_c4.saturating_sub(middle_pitch)]).unwrap_or_default()
    }
}
