use note_blocks::{
    BlockId, BlockRegistry, Editor, Focus, IndentDirection, MAX_LIST_INDENT, RawBlock,
};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

const KEYS: &[&str] = &[
    "text", "content", "title", "checked", "completed", "done", "level", "listType", "items",
    "indent", "id", "priority", "dueDate", "language", "style", "url", "alt",
];

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-z0-9 #*\\-\\[\\]\n]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((prop::sample::select(KEYS), inner), 0..6).prop_map(|pairs| {
                let map: Map<String, Value> = pairs
                    .into_iter()
                    .map(|(key, value)| (key.to_string(), value))
                    .collect();
                Value::Object(map)
            }),
        ]
    })
}

fn text_editor(texts: &[String]) -> Editor {
    let raw: Vec<_> = texts
        .iter()
        .enumerate()
        .map(|(ix, text)| RawBlock::new("text", json!(text)).with_id(format!("b{ix}")))
        .collect();
    Editor::hydrate(&raw)
}

proptest! {
    #[test]
    fn normalization_is_idempotent(content in arb_json(), metadata in arb_json()) {
        let registry = BlockRegistry::standard();
        for kind in registry.kinds() {
            let once = registry.normalize(kind, &content, &metadata);
            let (content, metadata) = once.to_raw();
            let twice = registry.normalize(kind, &content, &metadata);
            prop_assert_eq!(&once, &twice, "kind {}", kind);
        }
    }

    #[test]
    fn removing_never_empties_the_document(
        count in 1usize..6,
        picks in prop::collection::vec(any::<usize>(), 0..12),
    ) {
        let texts: Vec<String> = (0..count).map(|ix| format!("block {ix}")).collect();
        let mut editor = text_editor(&texts);

        for pick in picks {
            let id = editor.blocks()[pick % editor.blocks().len()].id.clone();
            editor.remove(&id);
            prop_assert!(!editor.blocks().is_empty());
        }
    }

    #[test]
    fn removing_the_focused_block_moves_focus_to_a_neighbor(
        count in 2usize..6,
        focused in any::<usize>(),
        removed in any::<usize>(),
    ) {
        let texts: Vec<String> = (0..count).map(|ix| format!("block {ix}")).collect();
        let mut editor = text_editor(&texts);
        let ids: Vec<BlockId> = editor.doc().ids();
        let focused = focused % count;
        let removed = removed % count;
        editor.set_focus(Some(Focus::new(ids[focused].clone())));

        prop_assert!(editor.remove(&ids[removed]));

        let expected = if removed != focused {
            ids[focused].clone()
        } else if removed > 0 {
            ids[removed - 1].clone()
        } else {
            ids[1].clone()
        };
        prop_assert_eq!(editor.focus().map(|focus| &focus.block), Some(&expected));
    }

    #[test]
    fn list_indent_stays_in_bounds(steps in prop::collection::vec(any::<bool>(), 0..24)) {
        let mut editor = Editor::hydrate(&[RawBlock::new("list", json!("item")).with_id("l")]);
        let id = BlockId::from("l");
        let mut model: u8 = 0;

        for indent_in in steps {
            let direction = if indent_in { IndentDirection::In } else { IndentDirection::Out };
            editor.indent(&id, Some(0), direction);
            model = if indent_in {
                (model + 1).min(MAX_LIST_INDENT)
            } else {
                model.saturating_sub(1)
            };

            let indent = editor.blocks()[0].body.list().map(|list| list.items[0].indent);
            prop_assert_eq!(indent, Some(model));
            prop_assert!(model <= MAX_LIST_INDENT);
        }
    }

    #[test]
    fn merge_undoes_split(text in "\\PC{0,24}", offset in 0usize..40, heading in any::<bool>()) {
        let kind = if heading { "heading" } else { "text" };
        let mut editor = Editor::hydrate(&[RawBlock::new(kind, json!(text)).with_id("a")]);

        let tail = editor.split(&"a".into(), offset);
        prop_assert!(tail.is_some());
        prop_assert_eq!(editor.blocks().len(), 2);

        let tail = tail.unwrap_or_else(|| BlockId::from("missing"));
        prop_assert!(editor.merge_with_previous(&tail));
        prop_assert_eq!(editor.blocks().len(), 1);
        prop_assert_eq!(editor.blocks()[0].body.text(), Some(text.as_str()));
    }
}
