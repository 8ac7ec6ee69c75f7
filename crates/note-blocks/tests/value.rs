use std::collections::HashSet;

use note_blocks::{
    BlockBody, BlockKind, Editor, EditorConfig, NoteValue, RawBlock, SCHEMA, VERSION, ValueError,
};
use serde_json::json;

#[test]
fn note_value_round_trips_through_json() {
    let mut editor = Editor::empty();
    editor.type_text("# Plan");
    editor.append(None);
    editor.type_text("[x] book flights");

    let json = editor.to_value().to_json_pretty().expect("serializes");
    let restored = Editor::from_json_str(&json).expect("parses");

    assert_eq!(restored.doc(), editor.doc());
    assert_eq!(restored.to_value().schema, SCHEMA);
    assert_eq!(restored.to_value().version, VERSION);
}

#[test]
fn bare_block_arrays_are_accepted() {
    let editor = Editor::from_json_str(
        r#"[
            { "id": "1", "type": "heading", "content": "Title", "metadata": { "level": "3" } },
            { "id": 2, "type": "todo", "content": { "checked": true } }
        ]"#,
    )
    .expect("parses");

    let ids: Vec<_> = editor.doc().ids().iter().map(|id| id.to_string()).collect();
    assert_eq!(ids, vec!["1", "2"]);
    let BlockBody::Heading(heading) = &editor.blocks()[0].body else {
        panic!("expected heading");
    };
    assert_eq!(heading.level, 3);
    let BlockBody::Todo(todo) = &editor.blocks()[1].body else {
        panic!("expected todo");
    };
    assert!(todo.checked);
    assert_eq!(todo.text, "");
}

#[test]
fn foreign_schema_and_newer_versions_are_rejected() {
    let err = NoteValue::from_json_str(r#"{ "schema": "slides", "version": 1, "blocks": [] }"#)
        .expect_err("schema mismatch");
    assert!(matches!(err, ValueError::Schema(schema) if schema == "slides"));

    let err = NoteValue::from_json_str(r#"{ "schema": "note-blocks", "version": 99 }"#)
        .expect_err("too new");
    assert!(matches!(
        err,
        ValueError::Version {
            found: 99,
            supported: VERSION
        }
    ));

    let err = NoteValue::from_json_str("{ not json").expect_err("invalid");
    assert!(matches!(err, ValueError::Json(_)));
}

#[test]
fn empty_note_hydrates_to_one_text_block() {
    let editor = Editor::from_json_str(r#"{ "blocks": [] }"#).expect("parses");

    assert_eq!(editor.blocks().len(), 1);
    assert_eq!(editor.blocks()[0].kind(), BlockKind::Text);
}

#[test]
fn non_object_entries_become_text_blocks() {
    let value = NoteValue::from_json_str(r#"["loose line", 42, null]"#).expect("parses");
    let editor = Editor::hydrate(&value.blocks);

    let texts: Vec<_> = editor
        .blocks()
        .iter()
        .map(|block| (block.kind(), block.body.plain_text()))
        .collect();
    assert_eq!(
        texts,
        vec![
            (BlockKind::Text, "loose line".to_string()),
            (BlockKind::Text, "42".to_string()),
            (BlockKind::Text, String::new()),
        ]
    );
}

#[test]
fn duplicate_and_missing_ids_are_regenerated() {
    let editor = Editor::hydrate(&[
        RawBlock::new("text", json!("a")).with_id("same"),
        RawBlock::new("text", json!("b")).with_id("same"),
        RawBlock::new("text", json!("c")),
    ]);

    let ids: HashSet<_> = editor.doc().ids().into_iter().collect();
    assert_eq!(ids.len(), 3);
    assert_eq!(editor.blocks()[0].id.as_str(), "same");
}

#[test]
fn unsupported_blocks_survive_a_save() {
    let stored = RawBlock::new("kanban", json!({ "columns": ["todo", "done"] }))
        .with_id("k")
        .with_metadata(json!({ "color": "red" }));
    let editor = Editor::hydrate(std::slice::from_ref(&stored));

    assert_eq!(editor.to_value().blocks, vec![stored]);
}

#[test]
fn saved_list_keeps_items_in_metadata() {
    let editor = Editor::hydrate(&[RawBlock::new("list", json!("one\n  two")).with_id("l")]);

    let saved = &editor.to_value().blocks[0];
    assert_eq!(saved.type_name, "list");
    assert_eq!(saved.content, json!("one\ntwo"));
    assert_eq!(saved.metadata["listType"], json!("bullet"));
    assert_eq!(saved.metadata["items"][1]["content"], json!("two"));
    assert_eq!(saved.metadata["items"][1]["indent"], json!(1));
}

#[test]
fn partial_config_json_gets_defaults() {
    let config = EditorConfig::from_json_str(r#"{ "codeIndentWidth": 4 }"#).expect("parses");

    assert_eq!(config.code_indent_width, 4);
    assert_eq!(config.max_undo, 200);
    assert_eq!(config.default_code_language, "javascript");
    assert_eq!(config.code_indent(), "    ");
}
