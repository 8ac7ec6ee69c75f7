use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::block::{BlockBody, BlockId, BlockKind};
use crate::normalize::aliases_of;

/// The single focused position: a block, the list item inside it (for list
/// blocks), and a byte offset into that block's or item's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Focus {
    pub block: BlockId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<usize>,
    #[serde(default)]
    pub caret: usize,
}

impl Focus {
    pub fn new(block: BlockId) -> Self {
        Self {
            block,
            item: None,
            caret: 0,
        }
    }

    pub fn at(block: BlockId, caret: usize) -> Self {
        Self {
            block,
            item: None,
            caret,
        }
    }

    pub fn in_item(block: BlockId, item: usize, caret: usize) -> Self {
        Self {
            block,
            item: Some(item),
            caret,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndentDirection {
    In,
    Out,
}

/// Partial update in stored form. `content` replaces the stored content, or
/// is merged key by key when both sides are objects; `metadata` keys are
/// merged and a `null` value removes the key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPatch {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<BlockKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl BlockPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new().content(Value::String(text.into()))
    }

    pub fn content(mut self, content: Value) -> Self {
        self.content = Some(content);
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn kind(mut self, kind: BlockKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.content.is_none() && self.metadata.is_empty()
    }

    /// Current stored form with the patch applied on top.
    ///
    /// A patched key replaces every alias of the same field, and new content
    /// without new `items` drops the stored list items so the content is
    /// rebuilt into items.
    pub(crate) fn merged_raw(&self, current: &BlockBody) -> (Value, Value) {
        let (mut content, metadata) = current.to_raw();
        let mut metadata = match metadata {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        if let Some(next) = &self.content {
            content = match (content, next) {
                (Value::Object(mut base), Value::Object(update)) => {
                    for (key, value) in update {
                        drop_aliases(&mut base, key);
                        drop_aliases(&mut metadata, key);
                        base.insert(key.clone(), value.clone());
                    }
                    Value::Object(base)
                }
                (_, next) => next.clone(),
            };
            if !self.metadata.contains_key("items") {
                metadata.remove("items");
            }
        }

        for (key, value) in &self.metadata {
            drop_aliases(&mut metadata, key);
            if !value.is_null() {
                metadata.insert(key.clone(), value.clone());
            }
        }

        (content, Value::Object(metadata))
    }
}

fn drop_aliases(map: &mut Map<String, Value>, key: &str) {
    map.remove(key);
    for alias in aliases_of(key) {
        map.remove(alias);
    }
}

/// Every engine operation as data, for hosts that queue or replay edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    InsertAfter {
        after: BlockId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<BlockKind>,
    },
    Append {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kind: Option<BlockKind>,
    },
    Split {
        block: BlockId,
        caret: usize,
    },
    MergeWithPrevious {
        block: BlockId,
    },
    Remove {
        block: BlockId,
    },
    Indent {
        block: BlockId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item: Option<usize>,
        direction: IndentDirection,
    },
    ConvertType {
        block: BlockId,
        kind: BlockKind,
    },
    Reorder {
        block: BlockId,
        target_index: usize,
    },
    Update {
        block: BlockId,
        patch: BlockPatch,
    },
    SetFocus {
        #[serde(default)]
        focus: Option<Focus>,
    },
    AddItem {
        block: BlockId,
        after_index: usize,
    },
    RemoveItem {
        block: BlockId,
        index: usize,
    },
    UpdateItem {
        block: BlockId,
        index: usize,
        content: String,
    },
    InsertText {
        text: String,
    },
    DeleteBackward,
    ToggleChecked {
        block: BlockId,
    },
}
