use std::sync::Arc;

use note_blocks::plugins::{DividerPlugin, TextPlugin};
use note_blocks::{
    Block, BlockBody, BlockKind, BlockPlugin, BlockRegistry, Document, Editor, EditorConfig,
    Focus, ImageBody, KeyEvent, KeyOutcome, RawBlock, RegistryError,
};
use serde_json::{Value, json};

/// An image kind that also claims a name already owned by text.
struct GreedyImage;

impl BlockPlugin for GreedyImage {
    fn kind(&self) -> BlockKind {
        BlockKind::Image
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["Paragraph"]
    }

    fn label(&self) -> &'static str {
        "Greedy image"
    }

    fn default_body(&self, _config: &EditorConfig) -> BlockBody {
        BlockBody::Image(ImageBody::default())
    }

    fn normalize(&self, _content: &Value, _metadata: &Value) -> BlockBody {
        BlockBody::Image(ImageBody::default())
    }

    fn render(&self, _block: &Block) -> String {
        String::new()
    }

    fn on_key_down(&self, _editor: &mut Editor, _focus: &Focus, _event: &KeyEvent) -> KeyOutcome {
        KeyOutcome::Ignored
    }
}

struct Impostor;

impl BlockPlugin for Impostor {
    fn kind(&self) -> BlockKind {
        BlockKind::Unsupported
    }

    fn label(&self) -> &'static str {
        "Impostor"
    }

    fn default_body(&self, _config: &EditorConfig) -> BlockBody {
        BlockBody::Divider
    }

    fn normalize(&self, _content: &Value, _metadata: &Value) -> BlockBody {
        BlockBody::Divider
    }

    fn render(&self, _block: &Block) -> String {
        String::new()
    }

    fn on_key_down(&self, _editor: &mut Editor, _focus: &Focus, _event: &KeyEvent) -> KeyOutcome {
        KeyOutcome::Ignored
    }
}

#[test]
fn standard_registry_covers_every_kind() {
    let registry = BlockRegistry::standard();

    let kinds: Vec<_> = registry.kinds().collect();
    assert_eq!(
        kinds,
        vec![
            BlockKind::Text,
            BlockKind::Heading,
            BlockKind::List,
            BlockKind::Todo,
            BlockKind::Quote,
            BlockKind::Code,
            BlockKind::Image,
            BlockKind::Divider,
        ]
    );
    assert!(!registry.is_registered(BlockKind::Unsupported));
}

#[test]
fn type_names_resolve_through_aliases() {
    let registry = BlockRegistry::standard();

    assert_eq!(registry.resolve_kind("paragraph"), BlockKind::Text);
    assert_eq!(registry.resolve_kind(" HEADER "), BlockKind::Heading);
    assert_eq!(registry.resolve_kind("checklist"), BlockKind::Todo);
    assert_eq!(registry.resolve_kind("blockquote"), BlockKind::Quote);
    assert_eq!(registry.resolve_kind("code_block"), BlockKind::Code);
    assert_eq!(registry.resolve_kind("hr"), BlockKind::Divider);
    assert_eq!(registry.resolve_kind(""), BlockKind::Text);
    assert_eq!(registry.resolve_kind("kanban"), BlockKind::Unsupported);
}

#[test]
fn registration_rejects_conflicts() {
    let err = BlockRegistry::new([
        Arc::new(TextPlugin) as Arc<dyn BlockPlugin>,
        Arc::new(TextPlugin),
    ])
    .expect_err("duplicate kind");
    assert_eq!(err, RegistryError::DuplicateKind(BlockKind::Text));

    let err = BlockRegistry::new([
        Arc::new(TextPlugin) as Arc<dyn BlockPlugin>,
        Arc::new(GreedyImage),
    ])
    .expect_err("duplicate alias");
    assert_eq!(
        err,
        RegistryError::DuplicateAlias {
            alias: "paragraph".to_string(),
            existing: BlockKind::Text,
        }
    );

    let mut registry = BlockRegistry::default();
    assert_eq!(
        registry.register(Arc::new(Impostor)),
        Err(RegistryError::Reserved(BlockKind::Unsupported))
    );
}

#[test]
fn failed_registration_leaves_registry_untouched() {
    let mut registry = BlockRegistry::new([Arc::new(TextPlugin) as Arc<dyn BlockPlugin>])
        .expect("valid registry");

    assert!(registry.register(Arc::new(GreedyImage)).is_err());

    assert!(!registry.is_registered(BlockKind::Image));
    assert_eq!(registry.resolve_kind("image"), BlockKind::Unsupported);
}

#[test]
fn unregistered_kinds_hydrate_as_unsupported_and_render_as_text() {
    let registry = BlockRegistry::new([
        Arc::new(TextPlugin) as Arc<dyn BlockPlugin>,
        Arc::new(DividerPlugin),
    ])
    .expect("valid registry");

    let block = registry.hydrate(&RawBlock::new("list", json!("milk\neggs")).with_id("l"));
    let BlockBody::Unsupported(raw) = &block.body else {
        panic!("expected unsupported body");
    };
    assert_eq!(raw.type_name, "list");
    assert_eq!(registry.render(&block), "milk\neggs");

    let text_render = registry.render(&Block::text("milk\neggs"));
    assert_eq!(registry.render(&block), text_render);
}

#[test]
fn conversion_to_unregistered_kind_is_refused() {
    let registry = BlockRegistry::new([Arc::new(TextPlugin) as Arc<dyn BlockPlugin>])
        .expect("valid registry");
    let doc = Document::hydrate(&[RawBlock::new("text", json!("x")).with_id("a")], &registry);
    let mut editor = Editor::new(doc, registry, EditorConfig::default());

    assert!(!editor.convert_type(&"a".into(), BlockKind::Heading));
    let id = editor.append(Some(BlockKind::Code)).expect("appended");
    assert_eq!(editor.block(&id).map(Block::kind), Some(BlockKind::Text));
}

#[test]
fn create_default_uses_config_for_code_language() {
    let registry = BlockRegistry::standard();
    let config = EditorConfig {
        default_code_language: "python".to_string(),
        ..EditorConfig::default()
    }
    .with_defaults();

    let block = registry.create_default(BlockKind::Code, &config);
    let BlockBody::Code(code) = &block.body else {
        panic!("expected code");
    };
    assert_eq!(code.language, "python");

    let list = registry.create_default(BlockKind::List, &config);
    assert_eq!(list.body.list().map(|list| list.items.len()), Some(1));
}

#[test]
fn markdown_export_renders_each_block() {
    let editor = Editor::hydrate(&[
        RawBlock::new("heading", json!("Trip")).with_metadata(json!({ "level": 1 })),
        RawBlock::new("todo", json!({ "text": "pack", "checked": true })),
        RawBlock::new("quote", json!("go far")).with_metadata(json!({ "author": "Ann" })),
        RawBlock::new("code", json!("ls")).with_metadata(json!({ "language": "sh" })),
        RawBlock::new("image", json!({ "url": "a.png", "alt": "map" })),
        RawBlock::new("divider", Value::Null),
    ]);

    assert_eq!(
        editor.to_markdown(),
        "# Trip\n\n- [x] pack\n\n> go far\n> -- Ann\n\n```sh\nls\n```\n\n![map](a.png)\n\n---"
    );
}
