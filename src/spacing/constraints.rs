//! Spacing constraints read off the document
//!
//! Springs come from durations: the gap before a rhythmic slice grows
//! geometrically with the duration of the rhythmic slice before it. Rods come
//! from glyphs: on each staff, the objects from one slice-bearing object up to
//! the next must fit between their two slices.

use super::metrics::{GlyphMetrics, GlyphSize};
use crate::document::object::AUGMENTATION_DOT_CODEPOINT;
use crate::document::{Document, ObjectHandle, ObjectKind, SliceHandle, StaffIndex};
use crate::rational::Rational;
use std::cmp::Ordering;

/// Minimum distance between two slices required by one staff
#[derive(Clone, Debug, PartialEq)]
pub struct SliceRod {
    pub from: SliceHandle,
    pub to: SliceHandle,
    pub length: i32,
}

/// Rods of one staff over a range, plus each object's resulting distance to
/// the next slice
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StaffConstraints {
    pub rods: Vec<SliceRod>,
    pub distances: Vec<(ObjectHandle, i32)>,
}

fn round(value: f32) -> i32 {
    value.round() as i32
}

impl Document {
    /// Natural length of the gap before `slice`
    pub fn spring_length(&self, slice: SliceHandle) -> f32 {
        if !self.slice(slice).is_rhythmic() {
            return 0.0;
        }
        let Some(previous) = self.previous_rhythmic_slice(slice) else { return 0.0 };
        let duration = self.slice_duration_or_zero(previous);
        if duration.is_zero() {
            return 0.0;
        }
        let config = self.config();
        let mut shortest: Option<Rational> = None;
        let mut scale = 0.0_f32;
        for (staff, object) in self.associations(previous) {
            let Some(object_duration) = self.object(staff, object).duration() else { continue };
            let length = object_duration.whole_notes_long();
            let staff_scale = config.staff_scale(self.staff(staff).scale_index);
            match shortest.as_ref().map(|shortest| length.cmp(shortest)) {
                None | Some(Ordering::Less) => {
                    shortest = Some(length);
                    scale = staff_scale;
                }
                Some(Ordering::Equal) => scale = scale.max(staff_scale),
                Some(Ordering::Greater) => {}
            }
        }
        if shortest.is_none() {
            scale = self
                .associations(previous)
                .map(|(staff, _)| config.staff_scale(self.staff(staff).scale_index))
                .fold(0.0, f32::max);
        }
        if scale <= 0.0 {
            scale = 1.0;
        }
        let exponent = duration.to_f64().log2() as f32;
        (config.whole_note_width * config.default_staff_space_height * scale * config.duration_ratio.powf(exponent))
            .round()
    }

    /// How far left of its slice an object's origin sits
    pub fn origin_offset(&self, staff: StaffIndex, object: ObjectHandle) -> i32 {
        match &self.object(staff, object).kind {
            ObjectKind::Duration(duration) if duration.is_pitched() && duration.log2 == 1 => {
                round(self.staff_space_height(staff) * self.config().double_whole_notehead_x_offset)
            }
            _ => 0,
        }
    }

    /// Width of the glyphs drawn for `object`, without any spacing after them
    pub fn glyph_extent(&self, staff: StaffIndex, object: ObjectHandle, metrics: &dyn GlyphMetrics) -> f32 {
        let space = self.staff_space_height(staff);
        let full = |codepoint: u32| metrics.glyph_width(codepoint, GlyphSize::Full, space);
        match &self.object(staff, object).kind {
            ObjectKind::Accidental { note } => {
                self.object(staff, *note).pitch().map_or(0.0, |pitch| full(pitch.accidental.codepoint()))
            }
            ObjectKind::Clef(clef) => {
                metrics.glyph_width(clef.codepoint as u32, self.clef_size(staff, object), space)
            }
            ObjectKind::Duration(duration) => {
                let dots = duration.augmentation_dots as f32;
                full(duration.codepoint())
                    + dots * (full(AUGMENTATION_DOT_CODEPOINT) + space * self.config().distance_between_augmentation_dots)
            }
            ObjectKind::KeySig(key_sig) => {
                key_sig.accidentals.iter().map(|accidental| full(accidental.accidental.codepoint())).sum()
            }
            ObjectKind::TimeSig(time_sig) => {
                let numerator = metrics.string_width(&time_sig.numerator_codepoints(), GlyphSize::Full, space);
                let denominator = metrics.string_width(&time_sig.denominator_codepoints(), GlyphSize::Full, space);
                numerator.max(denominator)
            }
            ObjectKind::None => 0.0,
        }
    }

    fn clef_size(&self, staff: StaffIndex, clef: ObjectHandle) -> GlyphSize {
        if self.is_header_object(staff, clef) {
            GlyphSize::Full
        } else {
            GlyphSize::TwoThirds
        }
    }

    /// Horizontal room `object` claims when `next` follows it
    pub(crate) fn object_width(
        &self,
        staff: StaffIndex,
        object: ObjectHandle,
        next: ObjectHandle,
        metrics: &dyn GlyphMetrics,
    ) -> i32 {
        let config = self.config();
        let space = self.staff_space_height(staff);
        let full = |codepoint: u32| round(metrics.glyph_width(codepoint, GlyphSize::Full, space));
        let next_kind = &self.object(staff, next).kind;
        let before_lone_accidental = matches!(next_kind, ObjectKind::Accidental { .. })
            && !self
                .next_object(staff, next)
                .map_or(false, |after| matches!(self.object(staff, after).kind, ObjectKind::Accidental { .. }));
        match &self.object(staff, object).kind {
            ObjectKind::Accidental { note } => {
                let glyph = self.object(staff, *note).pitch().map_or(0, |pitch| full(pitch.accidental.codepoint()));
                glyph + round(space * config.distance_between_accidental_and_note)
            }
            ObjectKind::Clef(clef) => {
                let size = self.clef_size(staff, object);
                let spacer = match (size, next_kind) {
                    (GlyphSize::Full, ObjectKind::Accidental { .. }) if before_lone_accidental => 1.5,
                    (GlyphSize::Full, ObjectKind::Duration(_)) => 2.5,
                    _ => 1.0,
                };
                round(space * spacer) + round(metrics.glyph_width(clef.codepoint as u32, size, space))
            }
            ObjectKind::Duration(duration) => {
                let spacer = if matches!(next_kind, ObjectKind::Duration(_)) { 0.0 } else { 1.0 };
                let dots = duration.augmentation_dots as i32;
                round(space * (dots as f32 * config.distance_between_augmentation_dots + spacer))
                    + dots * full(AUGMENTATION_DOT_CODEPOINT)
                    + full(duration.codepoint())
            }
            ObjectKind::KeySig(key_sig) => {
                let spacer = match next_kind {
                    ObjectKind::Accidental { .. } if before_lone_accidental => 1.0,
                    ObjectKind::Accidental { .. } => 1.5,
                    ObjectKind::Clef(_) | ObjectKind::KeySig(_) => 2.0,
                    ObjectKind::Duration(_) if self.is_header_object(staff, object) => 2.5,
                    ObjectKind::Duration(_) => 2.0,
                    _ => 1.0,
                };
                round(space * spacer)
                    + key_sig.accidentals.iter().map(|accidental| full(accidental.accidental.codepoint())).sum::<i32>()
            }
            ObjectKind::TimeSig(time_sig) => {
                let spacer = match next_kind {
                    ObjectKind::Accidental { .. } | ObjectKind::None => 1.0,
                    _ => 2.0,
                };
                let numerator = round(metrics.string_width(&time_sig.numerator_codepoints(), GlyphSize::Full, space));
                let denominator =
                    round(metrics.string_width(&time_sig.denominator_codepoints(), GlyphSize::Full, space));
                round(space * spacer) + numerator.max(denominator)
            }
            ObjectKind::None => {
                if self.object(staff, object).slice == Some(self.header().staff_start) {
                    round(space)
                } else {
                    0
                }
            }
        }
    }

    /// Rods of `staff` from the slice-bearing object `from` up to `to`, or to
    /// the end of the staff
    pub(crate) fn staff_constraints(
        &self,
        staff: StaffIndex,
        from: ObjectHandle,
        to: Option<ObjectHandle>,
        metrics: &dyn GlyphMetrics,
    ) -> StaffConstraints {
        let mut constraints = StaffConstraints::default();
        constraints.distances.push((from, self.origin_offset(staff, from)));
        let mut previous = from;
        let mut pending: Vec<ObjectHandle> = Vec::new();
        let mut current = self.next_object(staff, from);
        while let Some(object) = current {
            let Some(slice) = self.object(staff, object).slice else {
                pending.push(object);
                current = self.next_object(staff, object);
                continue;
            };
            let offset = self.origin_offset(staff, object);
            constraints.distances.push((object, offset));
            let mut width = offset;
            let mut next = object;
            for sliceless in pending.drain(..).rev() {
                width += self.object_width(staff, sliceless, next, metrics);
                constraints.distances.push((sliceless, width));
                next = sliceless;
            }
            width += self.object_width(staff, previous, next, metrics) - self.origin_offset(staff, previous);
            if let Some(from_slice) = self.object(staff, previous).slice {
                constraints.rods.push(SliceRod { from: from_slice, to: slice, length: width });
            }
            if Some(object) == to {
                break;
            }
            previous = object;
            current = self.next_object(staff, object);
        }
        constraints
    }
}
