use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::error::ValueError;
use crate::normalize::text_of;

pub const SCHEMA: &str = "note-blocks";
pub const VERSION: u32 = 1;

fn default_schema() -> String {
    SCHEMA.to_string()
}

fn default_version() -> u32 {
    VERSION
}

/// A block exactly as the storage layer holds it: `{ id, type, content,
/// metadata }` with arbitrary JSON in the last two fields.
///
/// Deserialization never fails: non-object entries become text blocks and a
/// non-string `type` is treated as missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawBlock {
    #[serde(skip_serializing_if = "Value::is_null")]
    pub id: Value,
    #[serde(rename = "type")]
    pub type_name: String,
    pub content: Value,
    pub metadata: Value,
}

impl RawBlock {
    pub fn new(type_name: impl Into<String>, content: Value) -> Self {
        Self {
            id: Value::Null,
            type_name: type_name.into(),
            content,
            metadata: Value::Null,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Value::String(id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) => Self {
                id: map.remove("id").unwrap_or(Value::Null),
                type_name: map
                    .remove("type")
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default(),
                content: map.remove("content").unwrap_or(Value::Null),
                metadata: map.remove("metadata").unwrap_or(Value::Null),
            },
            other => Self::new("text", Value::String(text_of(&other).unwrap_or_default())),
        }
    }

    pub fn id_string(&self) -> Option<String> {
        match &self.id {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for RawBlock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

impl From<&crate::block::Block> for RawBlock {
    fn from(block: &crate::block::Block) -> Self {
        let (content, metadata) = block.body.to_raw();
        Self {
            id: Value::String(block.id.as_str().to_string()),
            type_name: block.type_name().to_string(),
            content,
            metadata,
        }
    }
}

/// Versioned envelope for a whole note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteValue {
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub blocks: Vec<RawBlock>,
}

impl NoteValue {
    pub fn from_document(document: &Document) -> Self {
        Self {
            schema: default_schema(),
            version: default_version(),
            blocks: document.to_raw(),
        }
    }

    pub fn into_blocks(self) -> Vec<RawBlock> {
        self.blocks
    }

    pub fn to_json_pretty(&self) -> Result<String, ValueError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse either the envelope or a bare array of blocks, as older notes
    /// were stored.
    pub fn from_json_str(s: &str) -> Result<Self, ValueError> {
        let value = match serde_json::from_str::<Value>(s)? {
            blocks @ Value::Array(_) => Self {
                schema: default_schema(),
                version: default_version(),
                blocks: serde_json::from_value(blocks)?,
            },
            envelope => serde_json::from_value::<Self>(envelope)?,
        };
        if value.schema != SCHEMA {
            return Err(ValueError::Schema(value.schema));
        }
        if value.version > VERSION {
            return Err(ValueError::Version {
                found: value.version,
                supported: VERSION,
            });
        }
        Ok(value)
    }
}
