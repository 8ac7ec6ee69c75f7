use note_blocks::markdown::{Trigger, parse_trigger};
use note_blocks::{BlockBody, BlockKind, Editor, Focus, Key, KeyOutcome, ListStyle, RawBlock};
use serde_json::json;

#[test]
fn hash_space_converts_empty_text_into_heading() {
    let mut editor = Editor::empty();

    editor.type_text("# ");

    let block = &editor.blocks()[0];
    assert_eq!(block.kind(), BlockKind::Heading);
    assert_eq!(block.body.to_raw(), (json!(""), json!({ "level": 1 })));
    assert_eq!(editor.focus(), Some(&Focus::at(block.id.clone(), 0)));
}

#[test]
fn repeated_hashes_pick_the_heading_level() {
    let mut editor = Editor::empty();

    editor.type_text("### Title");

    let BlockBody::Heading(heading) = &editor.blocks()[0].body else {
        panic!("expected heading");
    };
    assert_eq!(heading.level, 3);
    assert_eq!(heading.text, "Title");
}

#[test]
fn seven_hashes_stay_plain_text() {
    let mut editor = Editor::empty();

    editor.type_text("####### x");

    assert_eq!(editor.blocks()[0].kind(), BlockKind::Text);
    assert_eq!(editor.blocks()[0].body.text(), Some("####### x"));
}

#[test]
fn brackets_space_converts_into_unchecked_todo() {
    let mut editor = Editor::empty();

    editor.type_text("[] ");

    let block = &editor.blocks()[0];
    assert_eq!(block.kind(), BlockKind::Todo);
    assert_eq!(
        block.body.to_raw().0,
        json!({ "text": "", "checked": false })
    );
}

#[test]
fn checked_brackets_convert_into_checked_todo() {
    let mut editor = Editor::empty();

    editor.type_text("[x] done already");

    let BlockBody::Todo(todo) = &editor.blocks()[0].body else {
        panic!("expected todo");
    };
    assert!(todo.checked);
    assert_eq!(todo.text, "done already");
}

#[test]
fn dash_and_number_triggers_create_lists() {
    let mut bullets = Editor::empty();
    bullets.type_text("- first");
    let list = bullets.blocks()[0].body.list().expect("list body");
    assert_eq!(list.style, ListStyle::Bullet);
    assert_eq!(list.items.len(), 1);
    assert_eq!(list.items[0].content, "first");

    let mut numbered = Editor::empty();
    numbered.type_text("1. ");
    let list = numbered.blocks()[0].body.list().expect("list body");
    assert_eq!(list.style, ListStyle::Numbered);
    assert_eq!(numbered.focus().and_then(|focus| focus.item), Some(0));
}

#[test]
fn quote_and_code_triggers() {
    let mut quote = Editor::empty();
    quote.type_text("> ");
    assert_eq!(quote.blocks()[0].kind(), BlockKind::Quote);

    let mut code = Editor::empty();
    code.type_text("```rust ");
    let BlockBody::Code(body) = &code.blocks()[0].body else {
        panic!("expected code");
    };
    assert_eq!(body.language, "rust");

    let mut plain = Editor::empty();
    plain.type_text("``` ");
    let BlockBody::Code(body) = &plain.blocks()[0].body else {
        panic!("expected code");
    };
    assert_eq!(body.language, "javascript");
}

#[test]
fn text_after_the_caret_survives_the_conversion() {
    let mut editor = Editor::hydrate(&[RawBlock::new("text", json!("#Intro")).with_id("a")]);
    editor.set_focus(Some(Focus::at("a".into(), 1)));

    assert_eq!(editor.handle_key(Key::Space), KeyOutcome::Handled);

    let BlockBody::Heading(heading) = &editor.blocks()[0].body else {
        panic!("expected heading");
    };
    assert_eq!(heading.text, "Intro");
    assert_eq!(heading.level, 1);
}

#[test]
fn triggers_only_fire_in_text_blocks() {
    let mut editor = Editor::hydrate(&[RawBlock::new("heading", json!("")).with_id("h")]);

    editor.type_text("- item");

    assert_eq!(editor.blocks()[0].kind(), BlockKind::Heading);
    assert_eq!(editor.blocks()[0].body.text(), Some("- item"));
}

#[test]
fn trigger_in_the_middle_of_text_does_nothing() {
    let mut editor = Editor::empty();

    editor.type_text("see - this");

    assert_eq!(editor.blocks()[0].kind(), BlockKind::Text);
    assert_eq!(editor.blocks()[0].body.text(), Some("see - this"));
}

#[test]
fn conversion_is_a_single_undo_step() {
    let mut editor = Editor::empty();
    editor.type_text("# ");

    assert!(editor.undo());

    assert_eq!(editor.blocks()[0].kind(), BlockKind::Text);
    assert_eq!(editor.blocks()[0].body.text(), Some("#"));
}

#[test]
fn parse_trigger_table() {
    assert_eq!(parse_trigger("#"), Some(Trigger::Heading(1)));
    assert_eq!(parse_trigger("######"), Some(Trigger::Heading(6)));
    assert_eq!(parse_trigger("#######"), None);
    assert_eq!(parse_trigger("*"), Some(Trigger::List(ListStyle::Bullet)));
    assert_eq!(parse_trigger("12."), Some(Trigger::List(ListStyle::Numbered)));
    assert_eq!(parse_trigger("1"), None);
    assert_eq!(parse_trigger("a."), None);
    assert_eq!(parse_trigger("[ ]"), Some(Trigger::Todo { checked: false }));
    assert_eq!(parse_trigger("[X]"), Some(Trigger::Todo { checked: true }));
    assert_eq!(
        parse_trigger("```c++"),
        Some(Trigger::Code {
            language: Some("c++".to_string())
        })
    );
    assert_eq!(parse_trigger("``` rust"), None);
    assert_eq!(parse_trigger("-x"), None);
    assert_eq!(parse_trigger(""), None);
}
