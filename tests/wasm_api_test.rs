//! WASM API tests
//!
//! Drives the exported `ScoreEditor` the way the browser front end does.

#![cfg(target_arch = "wasm32")]

use notation_engine::{Layout, ScoreEditor};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn create_test_editor() -> (ScoreEditor, u32) {
    let mut editor = ScoreEditor::new(JsValue::UNDEFINED).unwrap();
    let staff = editor.add_staff(JsValue::UNDEFINED).unwrap();
    (editor, staff)
}

fn read_layout(editor: &ScoreEditor) -> Layout {
    serde_wasm_bindgen::from_value(editor.layout().unwrap()).unwrap()
}

fn terminal_of(editor: &ScoreEditor, staff: u32) -> u32 {
    let layout = read_layout(editor);
    let staff = layout.staves.iter().find(|layout| layout.index == staff).unwrap();
    staff.objects.last().unwrap().handle
}

#[wasm_bindgen_test]
fn test_editor_creation() {
    let (editor, staff) = create_test_editor();
    assert_eq!(editor.staff_order(), vec![staff]);
    assert_eq!(editor.staff_middle_y(staff).unwrap(), 135);
}

#[wasm_bindgen_test]
fn test_entering_notes_needs_a_cursor() {
    let (mut editor, staff) = create_test_editor();
    assert!(editor.enter_note(0, -2, 0).is_err());

    let terminal = terminal_of(&editor, staff);
    editor.set_cursor(staff, terminal).unwrap();
    let note = editor.enter_note(0, -2, 0).unwrap();
    let rest = editor.enter_rest(-3, 1).unwrap();
    assert_ne!(note, rest);
    assert!(editor.enter_rest(-2, 9).is_err());
}

#[wasm_bindgen_test]
fn test_respace_and_hit_test() {
    let (mut editor, staff) = create_test_editor();
    let terminal = terminal_of(&editor, staff);
    editor.set_cursor(staff, terminal).unwrap();
    let note = editor.enter_note(4, -2, 0).unwrap();
    editor.respace(0, 2000).unwrap();

    let x = editor.object_x(staff, note).unwrap();
    let y = editor.staff_middle_y(staff).unwrap();
    assert!(x > 0);
    let hit = editor.hit_test(x + 1, y).unwrap();
    assert!(!hit.is_null());
    assert!(editor.average_time_ms("respace").is_some());
}

#[wasm_bindgen_test]
fn test_unknown_handles_are_errors() {
    let (editor, staff) = create_test_editor();
    assert!(editor.object_x(staff, 999_999).is_err());
    assert!(editor.slice_x(999_999).is_err());
    assert!(editor.staff_middle_y(staff + 7).is_err());
}
