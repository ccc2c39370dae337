//! Incremental respacing
//!
//! Slices where every staff has an object are anchors: no rod crosses one,
//! so the slices between consecutive anchors form ranges that are solved
//! independently. Only ranges holding a dirty slice and overlapping the
//! viewport are solved. The rest keep their flags until they scroll into
//! view.

use super::metrics::GlyphMetrics;
use super::solver::{Rod, SpacingProblem};
use crate::document::{Document, SliceHandle};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Visible horizontal extent in document coordinates
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub left: i32,
    pub right: i32,
}

impl Viewport {
    pub fn new(left: i32, right: i32) -> Self {
        Self { left, right }
    }

    /// A viewport containing the whole document
    pub fn unbounded() -> Self {
        Self { left: i32::MIN, right: i32::MAX }
    }

    pub fn overlaps(&self, left: i32, right: i32) -> bool {
        left <= self.right && right >= self.left
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RespaceReport {
    pub ranges_solved: usize,

    /// Dirty ranges left for later because they are off screen
    pub ranges_deferred: usize,

    pub rods_activated: usize,

    /// X of the last slice after respacing
    pub last_slice_x: i32,
}

impl Document {
    /// Respaces every dirty range that overlaps `viewport`
    pub fn respace(&mut self, metrics: &dyn GlyphMetrics, viewport: Viewport) -> RespaceReport {
        let mut report = RespaceReport::default();
        let slices = self.slice_handles();
        let Some(&staff_start) = slices.first() else { return report };
        self.slices.resolve_mut(staff_start).needs_respacing = false;
        let mut x = self.slice(staff_start).distance_from_previous_slice;
        if self.staff_order.is_empty() {
            report.last_slice_x = x;
            return report;
        }

        let boundaries = self.range_boundaries(&slices);
        for pair in boundaries.windows(2) {
            let range = &slices[pair[0]..=pair[1]];
            let stale_width: i32 = range[1..].iter().map(|slice| self.slice(*slice).distance_from_previous_slice).sum();
            let is_dirty = range[1..].iter().any(|slice| self.slice(*slice).needs_respacing);
            if is_dirty && viewport.overlaps(x, x + stale_width) {
                report.rods_activated += self.solve_range(range, metrics);
                report.ranges_solved += 1;
            } else if is_dirty {
                report.ranges_deferred += 1;
            }
            x += range[1..].iter().map(|slice| self.slice(*slice).distance_from_previous_slice).sum::<i32>();
        }
        report.last_slice_x = x;
        log::debug!(
            "Respaced {} ranges ({} deferred, {} rods activated)",
            report.ranges_solved,
            report.ranges_deferred,
            report.rods_activated
        );
        report
    }

    /// Respaces every dirty range, on screen or not
    pub fn respace_all(&mut self, metrics: &dyn GlyphMetrics) -> RespaceReport {
        self.respace(metrics, Viewport::unbounded())
    }

    /// Slices at which every staff has an object
    pub fn anchor_slices(&self) -> Vec<SliceHandle> {
        let slices = self.slice_handles();
        self.anchor_positions(&slices).into_iter().map(|position| slices[position]).collect()
    }

    fn anchor_positions(&self, slices: &[SliceHandle]) -> Vec<usize> {
        let staff_count = self.staff_order.len();
        slices
            .iter()
            .enumerate()
            .filter(|(_, slice)| staff_count > 0 && self.associations(**slice).count() == staff_count)
            .map(|(position, _)| position)
            .collect()
    }

    /// Positions of the anchors, plus the last slice when it is not one
    fn range_boundaries(&self, slices: &[SliceHandle]) -> Vec<usize> {
        let mut boundaries = self.anchor_positions(slices);
        if boundaries.first() != Some(&0) {
            boundaries.insert(0, 0);
        }
        let last = slices.len() - 1;
        if boundaries.last() != Some(&last) {
            boundaries.push(last);
        }
        boundaries
    }

    /// Solves one range and writes its gaps back, returning the number of
    /// rods activated
    fn solve_range(&mut self, range: &[SliceHandle], metrics: &dyn GlyphMetrics) -> usize {
        let positions: HashMap<SliceHandle, usize> =
            range.iter().enumerate().map(|(position, slice)| (*slice, position)).collect();
        let springs = range[1..].iter().map(|slice| self.spring_length(*slice)).collect();
        let mut problem = SpacingProblem::new(springs);
        let mut distances = Vec::new();
        for staff in self.staff_order.clone() {
            let Some(from) = self.object_at_slice(range[0], staff) else { continue };
            let to = range.last().and_then(|last| self.object_at_slice(*last, staff));
            let constraints = self.staff_constraints(staff, from, to, metrics);
            for rod in constraints.rods {
                let (Some(&first), Some(&last)) = (positions.get(&rod.from), positions.get(&rod.to)) else {
                    debug_assert!(false, "rod leaves its range");
                    continue;
                };
                if last > first && rod.length > 0 {
                    problem.add_rod(Rod::new(first, last - 1, rod.length as f32));
                }
            }
            distances.push((staff, constraints.distances));
        }

        let solution = problem.solve(self.config.max_rod_activation_rounds);
        let pixels = solution.to_pixels(&problem.rods);
        for (slice, gap) in range[1..].iter().zip(pixels) {
            let entry = self.slices.resolve_mut(*slice);
            entry.distance_from_previous_slice = gap;
            entry.needs_respacing = false;
        }
        for (staff, staff_distances) in distances {
            for (object, distance) in staff_distances {
                self.object_mut(staff, object).distance_to_next_slice = distance;
            }
        }
        log::trace!("Solved {} gaps with {} rods in {} rounds", problem.gap_count(), problem.rods.len(), solution.rounds);
        solution.activated.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::document::{Duration, StaffIndex, StaffSpec};
    use crate::spacing::FixedGlyphMetrics;

    fn create_test_document(staff_count: usize) -> (Document, Vec<StaffIndex>) {
        let mut document = Document::new(EngineConfig::default());
        let staves = (0..staff_count).map(|_| document.add_staff(StaffSpec::default())).collect();
        (document, staves)
    }

    fn append(document: &mut Document, staff: StaffIndex, duration: Duration) {
        let anchor = document.last_object(staff).unwrap();
        document.overwrite_with_duration(staff, anchor, duration);
    }

    fn gaps(document: &Document) -> Vec<i32> {
        document
            .slice_handles()
            .into_iter()
            .map(|slice| document.slice(slice).distance_from_previous_slice)
            .collect()
    }

    #[test]
    fn test_respace_clears_dirty_flags() {
        let (mut document, staves) = create_test_document(1);
        append(&mut document, staves[0], Duration::rest(-2, 0));
        let metrics = FixedGlyphMetrics::new(1.0);
        let report = document.respace_all(&metrics);
        assert!(report.ranges_solved > 0);
        assert_eq!(report.ranges_deferred, 0);
        assert!(document.slice_handles().iter().all(|slice| !document.slice(*slice).needs_respacing));
        // the clef's rod is shared by the empty key signature slot; the time
        // signature takes a two-space spacer before the rest
        assert_eq!(gaps(&document), vec![20, 10, 10, 10, 30, 45]);
        assert_eq!(report.last_slice_x, 125);
    }

    #[test]
    fn test_rods_widen_short_springs() {
        let (mut document, staves) = create_test_document(1);
        append(&mut document, staves[0], Duration::rest(-10, 0));
        let metrics = FixedGlyphMetrics::new(3.0);
        document.respace_all(&metrics);
        let last = *gaps(&document).last().unwrap();
        // a 1024th rest with a three-space glyph plus a one-space spacer
        assert_eq!(last, 40);
    }

    #[test]
    fn test_off_screen_ranges_are_deferred() {
        let (mut document, staves) = create_test_document(1);
        for _ in 0..8 {
            append(&mut document, staves[0], Duration::rest(0, 0));
        }
        let metrics = FixedGlyphMetrics::new(1.0);
        document.respace_all(&metrics);
        let last_slice = *document.slice_handles().last().unwrap();
        let anchor = document.previous_rhythmic_slice(last_slice).unwrap();
        document.mark_dirty(anchor);

        let report = document.respace(&metrics, Viewport::new(0, 100));
        assert_eq!(report.ranges_solved, 0);
        assert_eq!(report.ranges_deferred, 2);
        assert!(document.slice(last_slice).needs_respacing);

        let report = document.respace_all(&metrics);
        assert_eq!(report.ranges_solved, 2);
        assert!(!document.slice(last_slice).needs_respacing);
    }

    #[test]
    fn test_anchors_need_every_staff() {
        let (mut document, staves) = create_test_document(2);
        append(&mut document, staves[0], Duration::rest(-1, 0));
        append(&mut document, staves[1], Duration::rest(-2, 0));
        append(&mut document, staves[1], Duration::rest(-2, 0));
        let header = document.header();
        let anchors = document.anchor_slices();
        assert!(anchors.contains(&header.staff_start));
        assert!(anchors.contains(&header.clef));
        assert!(!anchors.contains(&header.key_sig));
        assert!(anchors.contains(&header.body_start));
        let quarter = document.next_slice(header.body_start).unwrap();
        assert!(!anchors.contains(&quarter));
        let end = document.next_slice(quarter).unwrap();
        assert!(anchors.contains(&end));
    }

    #[test]
    fn test_multi_staff_rod_spans_two_gaps() {
        let (mut document, staves) = create_test_document(2);
        append(&mut document, staves[0], Duration::rest(-1, 0));
        append(&mut document, staves[1], Duration::rest(-2, 0));
        append(&mut document, staves[1], Duration::rest(-2, 0));
        let metrics = FixedGlyphMetrics::new(8.0);
        document.respace_all(&metrics);
        let body_start = document.header().body_start;
        let quarter = document.next_slice(body_start).unwrap();
        let end = document.next_slice(quarter).unwrap();
        let first_gap = document.slice(quarter).distance_from_previous_slice;
        let second_gap = document.slice(end).distance_from_previous_slice;
        // half rest glyph 80 plus spacer 10
        assert!(first_gap + second_gap >= 90);
        // quarter rests 80 and 80 plus spacer 10 on the lower staff
        assert!(first_gap >= 80);
        assert!(second_gap >= 90);
    }
}
