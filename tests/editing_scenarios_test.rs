//! Editing scenarios driven through the public document API

use notation_engine::document::{letter_name_from_char, KeySigAccidental};
use notation_engine::{
    Accidental, Document, Duration, EditError, EngineConfig, ObjectHandle, ObjectKind, Rational, Selection,
    StaffIndex, StaffSpec,
};

fn create_test_document() -> (Document, StaffIndex) {
    let mut document = Document::new(EngineConfig::default());
    let staff = document.add_staff(StaffSpec::default());
    set_cursor_at_end(&mut document, staff);
    (document, staff)
}

fn set_cursor_at_end(document: &mut Document, staff: StaffIndex) {
    let terminal = document.last_object(staff).unwrap();
    document.set_cursor(staff, terminal).unwrap();
}

/// Durations of the rhythmic slices from the body start on, including the
/// terminal zero
fn body_durations(document: &Document) -> Vec<Rational> {
    let mut durations = Vec::new();
    let mut slice = Some(document.header().body_start);
    while let Some(handle) = slice {
        if let Some(duration) = document.slice_duration(handle) {
            durations.push(duration);
        }
        slice = document.next_slice(handle);
    }
    durations
}

fn total_time(document: &Document) -> Rational {
    let last = *document.slice_handles().last().unwrap();
    document.time_between(document.header().body_start, last)
}

fn ratio(numerator: u64, denominator: u64) -> Rational {
    Rational::from_ratio(numerator, denominator)
}

fn enter_notes(document: &mut Document, letters: &str, log2: i8) -> Vec<ObjectHandle> {
    letters
        .chars()
        .map(|letter| document.enter_note(letter_name_from_char(letter).unwrap(), log2, 0).unwrap())
        .collect()
}

#[test]
fn test_four_quarters_then_half_note() {
    let (mut document, staff) = create_test_document();
    let notes = enter_notes(&mut document, "cdef", -2);

    let durations: Vec<Rational> = body_durations(&document).into_iter().filter(|d| !d.is_zero()).collect();
    assert_eq!(durations, vec![ratio(1, 4); 4]);
    assert_eq!(total_time(&document), Rational::one());

    document.set_cursor(staff, notes[1]).unwrap();
    document.enter_note(letter_name_from_char('d').unwrap(), -1, 0).unwrap();

    assert_eq!(body_durations(&document), vec![ratio(1, 4), ratio(1, 2), ratio(1, 4), Rational::zero()]);
    assert_eq!(total_time(&document), Rational::one());
    assert!(!document.is_live(staff, notes[2]));
    assert!(document.is_live(staff, notes[3]));
}

#[test]
fn test_key_sig_after_note_does_not_change_it() {
    let (mut document, staff) = create_test_document();
    let f = enter_notes(&mut document, "f", -2)[0];
    assert_eq!(document.object(staff, f).pitch().map(|pitch| pitch.steps_above_c4), Some(3));

    document.insert_key_sig(3, false).unwrap();

    assert!(document.displayed_accidentals(staff).is_empty());
    assert_eq!(document.object(staff, f).pitch().map(|pitch| pitch.accidental), Some(Accidental::Natural));
    assert!(document.object(staff, f).is_valid_cursor_position);

    let key_sig = document
        .staff_objects(staff)
        .find_map(|(_, object)| match &object.kind {
            ObjectKind::KeySig(key_sig) => Some(key_sig.clone()),
            _ => None,
        })
        .unwrap();
    let expected: Vec<KeySigAccidental> = "fcg"
        .chars()
        .map(|letter| KeySigAccidental {
            accidental: Accidental::Sharp,
            letter_name: letter_name_from_char(letter).unwrap(),
        })
        .collect();
    assert_eq!(key_sig.accidentals, expected);

    // the next F follows the new key signature without showing a sharp
    let next_f = enter_notes(&mut document, "f", -2)[0];
    assert_eq!(document.object(staff, next_f).pitch().map(|pitch| pitch.accidental), Some(Accidental::Sharp));
    assert!(document.displayed_accidentals(staff).is_empty());
}

#[test]
fn test_overwrite_preserves_total_time() {
    let replacements = [
        Duration::rest(-4, 0),
        Duration::rest(-3, 0),
        Duration::rest(-3, 1),
        Duration::rest(-1, 0),
        Duration::rest(-2, 2),
    ];
    for replacement in replacements {
        let (mut document, staff) = create_test_document();
        let notes = enter_notes(&mut document, "cdefgabc", -3);
        assert_eq!(total_time(&document), Rational::one());

        document.set_cursor(staff, notes[2]).unwrap();
        document.enter_rest(replacement.log2, replacement.augmentation_dots).unwrap();

        assert_eq!(total_time(&document), Rational::one(), "after overwriting with {:?}", replacement);
        let object_time = document
            .staff_objects(staff)
            .filter_map(|(_, object)| object.duration().map(|duration| duration.whole_notes_long()))
            .fold(Rational::zero(), |total, length| &total + &length);
        assert_eq!(object_time, Rational::one());
    }
}

#[test]
fn test_overwrite_past_the_end_grows_the_staff() {
    let (mut document, staff) = create_test_document();
    let notes = enter_notes(&mut document, "cd", -2);
    document.set_cursor(staff, notes[1]).unwrap();
    document.enter_rest(0, 0).unwrap();
    assert_eq!(total_time(&document), ratio(5, 4));
}

#[test]
fn test_shared_slices_fold_across_staves() {
    let mut document = Document::new(EngineConfig::default());
    let upper = document.add_staff(StaffSpec::default());
    let lower = document.add_staff(StaffSpec::default());

    set_cursor_at_end(&mut document, upper);
    let half = document.enter_note(0, -1, 0).unwrap();
    set_cursor_at_end(&mut document, lower);
    let eighths = enter_notes(&mut document, "cdef", -3);
    assert_eq!(body_durations(&document), vec![ratio(1, 8), ratio(1, 8), ratio(1, 8), ratio(1, 8), Rational::zero()]);

    document.set_cursor(lower, eighths[0]).unwrap();
    document.enter_note(0, -2, 0).unwrap();

    assert_eq!(body_durations(&document), vec![ratio(1, 4), ratio(1, 8), ratio(1, 8), Rational::zero()]);
    assert_eq!(document.object_at_slice(document.header().body_start, upper), Some(half));
    assert!(!document.is_live(lower, eighths[1]));
    assert!(document.is_live(lower, eighths[2]));
}

#[test]
fn test_delete_turns_notes_into_rests_then_drops_trailing_rests() {
    let (mut document, staff) = create_test_document();
    let notes = enter_notes(&mut document, "cd", -2);

    document.select_object(staff, notes[1]).unwrap();
    document.delete_object().unwrap();
    assert!(document.object(staff, notes[1]).pitch().is_none());
    assert_eq!(total_time(&document), ratio(1, 2));

    document.select_object(staff, notes[1]).unwrap();
    document.delete_object().unwrap();
    assert_eq!(document.last_object(staff), Some(notes[1]));
    assert_eq!(document.object(staff, notes[1]).kind, ObjectKind::None);
    assert_eq!(total_time(&document), ratio(1, 4));
    assert!(matches!(document.selection(), Selection::ActiveCursor { .. }));
}

#[test]
fn test_commands_need_the_right_selection() {
    let mut document = Document::new(EngineConfig::default());
    let staff = document.add_staff(StaffSpec::default());
    assert_eq!(document.enter_rest(-2, 0), Err(EditError::NoActiveCursor));
    assert_eq!(document.transpose_selected(true), Err(EditError::NoSelectedObject));
    assert_eq!(document.set_cursor(StaffIndex(99), document.last_object(staff).unwrap()), Err(EditError::UnknownStaff(99)));
}
