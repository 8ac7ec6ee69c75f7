use note_blocks::{BlockKind, Editor, EditorConfig, Focus, Key, RawBlock};
use serde_json::json;

fn editor_with_text(text: &str) -> Editor {
    Editor::hydrate(&[RawBlock::new("text", json!(text)).with_id("a")])
}

#[test]
fn undo_and_redo_restore_document_and_focus() {
    let mut editor = editor_with_text("Hello");
    editor.set_focus(Some(Focus::at("a".into(), 2)));
    let before = editor.doc().clone();

    editor.handle_key(Key::Enter);
    let after = editor.doc().clone();
    let focus_after = editor.focus().cloned();
    assert_eq!(after.len(), 2);

    assert!(editor.undo());
    assert_eq!(editor.doc(), &before);
    assert_eq!(editor.focus(), Some(&Focus::at("a".into(), 2)));

    assert!(editor.redo());
    assert_eq!(editor.doc(), &after);
    assert_eq!(editor.focus().cloned(), focus_after);

    assert!(!editor.redo());
}

#[test]
fn new_edit_clears_redo() {
    let mut editor = editor_with_text("");
    editor.type_text("ab");

    assert!(editor.undo());
    assert!(editor.can_redo());

    editor.type_text("c");
    assert!(!editor.can_redo());
    assert_eq!(editor.blocks()[0].body.text(), Some("ac"));
}

#[test]
fn focus_changes_and_no_ops_are_not_recorded() {
    let mut editor = editor_with_text("Hello");

    editor.set_focus(Some(Focus::at("a".into(), 4)));
    editor.set_focus(None);
    editor.convert_type(&"a".into(), BlockKind::Text);
    editor.delete_backward();

    assert!(!editor.can_undo());
    assert!(!editor.undo());
}

#[test]
fn history_is_capped_by_config() {
    let config = EditorConfig {
        max_undo: 2,
        ..EditorConfig::default()
    };
    let mut editor = editor_with_text("").with_config(config);

    editor.type_text("xyz");

    assert!(editor.undo());
    assert!(editor.undo());
    assert!(!editor.undo());
    assert_eq!(editor.blocks()[0].body.text(), Some("x"));
}

#[test]
fn undo_after_remove_restores_the_block() {
    let mut editor = Editor::hydrate(&[
        RawBlock::new("text", json!("keep")).with_id("a"),
        RawBlock::new("heading", json!("drop")).with_id("b"),
    ]);

    assert!(editor.remove(&"b".into()));
    assert_eq!(editor.blocks().len(), 1);

    assert!(editor.undo());
    assert_eq!(editor.blocks().len(), 2);
    assert_eq!(editor.blocks()[1].kind(), BlockKind::Heading);
}
