use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;

use crate::block::{Block, BlockBody, BlockId, BlockKind, UnsupportedBody, clamp_to_char_boundary};
use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::error::RegistryError;
use crate::keys::{KeyEvent, KeyOutcome};
use crate::ops::{BlockPatch, Focus};
use crate::plugins::{
    CodePlugin, DividerPlugin, HeadingPlugin, ImagePlugin, ListPlugin, QuotePlugin, TextPlugin,
    TodoPlugin,
};
use crate::value::RawBlock;

/// Everything the engine needs to know about one block kind.
///
/// A plugin owns the default shape of its kind, the normalizer for stored
/// content, the plain-text renderer and the keyboard editor.
pub trait BlockPlugin: Send + Sync {
    fn kind(&self) -> BlockKind;

    /// Additional persisted type names resolving to this kind.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn label(&self) -> &'static str;

    fn default_body(&self, config: &EditorConfig) -> BlockBody;

    /// Metadata regenerated when another block is converted to this kind.
    fn default_metadata(&self, config: &EditorConfig) -> Value {
        self.default_body(config).to_raw().1
    }

    fn normalize(&self, content: &Value, metadata: &Value) -> BlockBody;

    fn render(&self, block: &Block) -> String;

    /// Whether the body has a caret-addressable string (splittable, mergeable).
    fn is_text_editable(&self) -> bool {
        true
    }

    /// Clamp a requested focus to a position that exists in `block`.
    fn on_focus(&self, block: &Block, focus: Focus) -> Focus {
        let caret = block
            .body
            .text()
            .map(|text| clamp_to_char_boundary(text, focus.caret))
            .unwrap_or(0);
        Focus {
            block: block.id.clone(),
            item: None,
            caret,
        }
    }

    /// Shallow-merge `patch` into the stored form of `current` and normalize
    /// the result as this kind.
    fn on_update(&self, current: &BlockBody, patch: &BlockPatch) -> BlockBody {
        let (content, metadata) = patch.merged_raw(current);
        self.normalize(&content, &metadata)
    }

    fn on_key_down(&self, editor: &mut Editor, focus: &Focus, event: &KeyEvent) -> KeyOutcome;
}

pub struct BlockRegistry {
    plugins: BTreeMap<BlockKind, Arc<dyn BlockPlugin>>,
    aliases: HashMap<String, BlockKind>,
    fallback: Arc<dyn BlockPlugin>,
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self {
            plugins: BTreeMap::new(),
            aliases: HashMap::new(),
            fallback: Arc::new(TextPlugin),
        }
    }
}

impl std::fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockRegistry")
            .field("kinds", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl BlockRegistry {
    pub fn new(
        plugins: impl IntoIterator<Item = Arc<dyn BlockPlugin>>,
    ) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for plugin in plugins {
            registry.register(plugin)?;
        }
        Ok(registry)
    }

    pub fn standard() -> Self {
        let plugins: Vec<Arc<dyn BlockPlugin>> = vec![
            Arc::new(TextPlugin),
            Arc::new(HeadingPlugin),
            Arc::new(ListPlugin),
            Arc::new(TodoPlugin),
            Arc::new(QuotePlugin),
            Arc::new(CodePlugin),
            Arc::new(ImagePlugin),
            Arc::new(DividerPlugin),
        ];
        Self::new(plugins).expect("standard registry must be valid")
    }

    pub fn register(&mut self, plugin: Arc<dyn BlockPlugin>) -> Result<(), RegistryError> {
        let kind = plugin.kind();
        if kind == BlockKind::Unsupported {
            return Err(RegistryError::Reserved(kind));
        }
        if self.plugins.contains_key(&kind) {
            return Err(RegistryError::DuplicateKind(kind));
        }

        let names = std::iter::once(kind.as_str()).chain(plugin.aliases().iter().copied());
        let mut pending = Vec::new();
        for name in names {
            let name = name.to_ascii_lowercase();
            if let Some(existing) = self.aliases.get(&name) {
                return Err(RegistryError::DuplicateAlias {
                    alias: name,
                    existing: *existing,
                });
            }
            pending.push(name);
        }

        for name in pending {
            self.aliases.insert(name, kind);
        }
        self.plugins.insert(kind, plugin);
        Ok(())
    }

    pub fn kinds(&self) -> impl Iterator<Item = BlockKind> + '_ {
        self.plugins.keys().copied()
    }

    pub fn is_registered(&self, kind: BlockKind) -> bool {
        self.plugins.contains_key(&kind)
    }

    /// Plugin for `kind`; unregistered and unsupported kinds get the text
    /// plugin.
    pub fn plugin(&self, kind: BlockKind) -> Arc<dyn BlockPlugin> {
        self.plugins
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    /// Map a persisted type name to a kind. An empty name is plain text.
    pub fn resolve_kind(&self, type_name: &str) -> BlockKind {
        let name = type_name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return BlockKind::Text;
        }
        self.aliases
            .get(&name)
            .copied()
            .unwrap_or(BlockKind::Unsupported)
    }

    pub fn create_default(&self, kind: BlockKind, config: &EditorConfig) -> Block {
        Block::new(BlockId::generate(), self.plugin(kind).default_body(config))
    }

    pub fn default_metadata(&self, kind: BlockKind, config: &EditorConfig) -> Value {
        self.plugin(kind).default_metadata(config)
    }

    pub fn normalize(&self, kind: BlockKind, content: &Value, metadata: &Value) -> BlockBody {
        match self.plugins.get(&kind) {
            Some(plugin) => plugin.normalize(content, metadata),
            None => BlockBody::Unsupported(UnsupportedBody {
                type_name: kind.as_str().to_string(),
                content: content.clone(),
                metadata: metadata.clone(),
            }),
        }
    }

    /// Run a typed body back through its normalizer. Unsupported bodies are
    /// raw pass-through and are returned unchanged.
    pub fn renormalize(&self, body: &BlockBody) -> BlockBody {
        if let BlockBody::Unsupported(_) = body {
            return body.clone();
        }
        let (content, metadata) = body.to_raw();
        self.normalize(body.kind(), &content, &metadata)
    }

    pub fn hydrate(&self, raw: &RawBlock) -> Block {
        let id = raw.id_string().map(BlockId::from).unwrap_or_else(|| {
            tracing::trace!(type_name = %raw.type_name, "generating id for stored block without one");
            BlockId::generate()
        });
        let kind = self.resolve_kind(&raw.type_name);
        let body = if kind == BlockKind::Unsupported {
            tracing::debug!(type_name = %raw.type_name, "hydrating unsupported block type");
            BlockBody::Unsupported(UnsupportedBody {
                type_name: raw.type_name.clone(),
                content: raw.content.clone(),
                metadata: raw.metadata.clone(),
            })
        } else {
            self.normalize(kind, &raw.content, &raw.metadata)
        };
        Block::new(id, body)
    }

    pub fn render(&self, block: &Block) -> String {
        self.plugin(block.kind()).render(block)
    }
}
