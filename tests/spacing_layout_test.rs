//! Horizontal spacing and layout of edited multi-staff documents

use notation_engine::document::{letter_name_from_char, ObjectHandle};
use notation_engine::{Document, EngineConfig, FixedGlyphMetrics, StaffIndex, StaffSpec, Viewport};
use std::io::Write;

fn set_cursor_at_end(document: &mut Document, staff: StaffIndex) {
    let terminal = document.last_object(staff).unwrap();
    document.set_cursor(staff, terminal).unwrap();
}

fn enter_notes(document: &mut Document, letters: &str, log2: i8) -> Vec<ObjectHandle> {
    letters
        .chars()
        .map(|letter| document.enter_note(letter_name_from_char(letter).unwrap(), log2, 0).unwrap())
        .collect()
}

/// Two staves with mixed durations, a dotted note, a key signature change
/// and an accidental
fn create_test_document(config: EngineConfig) -> (Document, StaffIndex, StaffIndex) {
    let mut document = Document::new(config);
    let upper = document.add_staff(StaffSpec::default());
    let lower = document.add_staff(StaffSpec::default());

    set_cursor_at_end(&mut document, upper);
    enter_notes(&mut document, "cd", -1);
    document.insert_key_sig(2, true).unwrap();
    let b_flat = enter_notes(&mut document, "b", -2)[0];
    document.enter_note(letter_name_from_char('e').unwrap(), -3, 1).unwrap();
    document.enter_rest(-4, 0).unwrap();

    set_cursor_at_end(&mut document, lower);
    enter_notes(&mut document, "gabcdefg", -3);
    document.select_object(upper, b_flat).unwrap();
    document.alter_selected_accidental(true).unwrap();
    (document, upper, lower)
}

#[test]
fn test_respaced_glyphs_do_not_overlap() {
    let (mut document, upper, lower) = create_test_document(EngineConfig::default());
    let metrics = FixedGlyphMetrics::bravura();
    let report = document.respace_all(&metrics);
    assert!(report.ranges_solved > 0);
    assert_eq!(report.ranges_deferred, 0);

    for staff in [upper, lower] {
        let objects: Vec<ObjectHandle> = document.staff_objects(staff).map(|(handle, _)| handle).collect();
        for pair in objects.windows(2) {
            let right_edge = document.object_x(staff, pair[0]) as f32 + document.glyph_extent(staff, pair[0], &metrics);
            let next_x = document.object_x(staff, pair[1]) as f32;
            assert!(right_edge <= next_x + 2.0, "objects {:?} overlap on staff {}", pair, staff.0);
        }
    }
}

#[test]
fn test_slices_move_left_to_right_after_respacing() {
    let (mut document, _, _) = create_test_document(EngineConfig::default());
    document.respace_all(&FixedGlyphMetrics::bravura());

    let layout = document.layout();
    assert!(layout.slices.iter().all(|slice| !slice.needs_respacing));
    assert!(layout.slices.windows(2).all(|pair| pair[0].x <= pair[1].x));
    assert_eq!(layout.slices[0].x, document.config().staff_start_distance);
    assert!(layout.slices[1].x > layout.slices[0].x);
}

#[test]
fn test_edits_outside_the_viewport_wait_for_it() {
    let (mut document, upper, _) = create_test_document(EngineConfig::default());
    let metrics = FixedGlyphMetrics::bravura();
    let full = document.respace_all(&metrics);

    set_cursor_at_end(&mut document, upper);
    document.enter_rest(-2, 0).unwrap();
    let deferred = document.respace(&metrics, Viewport::new(0, 10));
    assert!(deferred.ranges_deferred > 0);
    assert!(document.layout().slices.iter().any(|slice| slice.needs_respacing));

    let caught_up = document.respace(&metrics, Viewport::unbounded());
    assert_eq!(caught_up.ranges_deferred, 0);
    assert!(caught_up.last_slice_x > full.last_slice_x);
}

#[test]
fn test_loaded_config_places_staves() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "top_staff_middle_y: 100\nstaff_spacing: 120").unwrap();
    let config = EngineConfig::from_path(file.path()).unwrap();

    let (mut document, upper, lower) = create_test_document(config);
    document.respace_all(&FixedGlyphMetrics::bravura());
    assert_eq!(document.staff_middle_y(upper), 100);
    assert_eq!(document.staff_middle_y(lower), 220);
    assert_eq!(document.staff_at_y(215), Some(lower));
    assert_eq!(document.staff_at_y(30), None);
}
