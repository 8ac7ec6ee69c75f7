use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::normalize::{DEFAULT_CODE_LANGUAGE, text_of};

pub const MIN_HEADING_LEVEL: u8 = 1;
pub const MAX_HEADING_LEVEL: u8 = 6;
pub const DEFAULT_HEADING_LEVEL: u8 = 2;
pub const MAX_LIST_INDENT: u8 = 3;

/// Opaque block identifier. Generated ids are v4 uuids, so an id is never
/// handed out twice within or across documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

pub type ItemId = BlockId;

impl BlockId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    Heading,
    List,
    Todo,
    Quote,
    Code,
    Image,
    Divider,
    Unsupported,
}

impl BlockKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BlockKind::Text => "text",
            BlockKind::Heading => "heading",
            BlockKind::List => "list",
            BlockKind::Todo => "todo",
            BlockKind::Quote => "quote",
            BlockKind::Code => "code",
            BlockKind::Image => "image",
            BlockKind::Divider => "divider",
            BlockKind::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    #[default]
    Bullet,
    Numbered,
}

impl ListStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            ListStyle::Bullet => "bullet",
            ListStyle::Numbered => "numbered",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    #[default]
    Default,
    Callout,
    Warning,
    Info,
}

impl QuoteStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            QuoteStyle::Default => "default",
            QuoteStyle::Callout => "callout",
            QuoteStyle::Warning => "warning",
            QuoteStyle::Info => "info",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextBody {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadingBody {
    pub text: String,
    pub level: u8,
}

impl Default for HeadingBody {
    fn default() -> Self {
        Self {
            text: String::new(),
            level: DEFAULT_HEADING_LEVEL,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub id: ItemId,
    pub content: String,
    pub indent: u8,
}

impl ListItem {
    pub fn empty(indent: u8) -> Self {
        Self {
            id: ItemId::generate(),
            content: String::new(),
            indent: indent.min(MAX_LIST_INDENT),
        }
    }

    pub fn with_content(content: impl Into<String>, indent: u8) -> Self {
        Self {
            content: content.into(),
            ..Self::empty(indent)
        }
    }
}

/// A list always holds at least one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ListBody {
    pub style: ListStyle,
    pub items: Vec<ListItem>,
}

impl Default for ListBody {
    fn default() -> Self {
        Self {
            style: ListStyle::default(),
            items: vec![ListItem::empty(0)],
        }
    }
}

impl ListBody {
    pub fn joined_text(&self) -> String {
        self.items
            .iter()
            .map(|item| item.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TodoBody {
    pub text: String,
    pub checked: bool,
    pub priority: Option<Priority>,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuoteBody {
    pub text: String,
    pub style: QuoteStyle,
    pub author: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeBody {
    pub code: String,
    pub language: String,
    pub filename: Option<String>,
    pub show_line_numbers: bool,
}

impl Default for CodeBody {
    fn default() -> Self {
        Self {
            code: String::new(),
            language: DEFAULT_CODE_LANGUAGE.to_string(),
            filename: None,
            show_line_numbers: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageBody {
    pub url: String,
    pub alt: Option<String>,
    pub caption: Option<String>,
}

/// A persisted block whose type name is not registered. The raw content is
/// kept so that saving the document does not lose it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnsupportedBody {
    pub type_name: String,
    pub content: Value,
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockBody {
    Text(TextBody),
    Heading(HeadingBody),
    List(ListBody),
    Todo(TodoBody),
    Quote(QuoteBody),
    Code(CodeBody),
    Image(ImageBody),
    Divider,
    Unsupported(UnsupportedBody),
}

impl BlockBody {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockBody::Text(_) => BlockKind::Text,
            BlockBody::Heading(_) => BlockKind::Heading,
            BlockBody::List(_) => BlockKind::List,
            BlockBody::Todo(_) => BlockKind::Todo,
            BlockBody::Quote(_) => BlockKind::Quote,
            BlockBody::Code(_) => BlockKind::Code,
            BlockBody::Image(_) => BlockKind::Image,
            BlockBody::Divider => BlockKind::Divider,
            BlockBody::Unsupported(_) => BlockKind::Unsupported,
        }
    }

    /// The single editable string of a text-like body.
    pub fn text(&self) -> Option<&str> {
        match self {
            BlockBody::Text(b) => Some(&b.text),
            BlockBody::Heading(b) => Some(&b.text),
            BlockBody::Todo(b) => Some(&b.text),
            BlockBody::Quote(b) => Some(&b.text),
            BlockBody::Code(b) => Some(&b.code),
            BlockBody::List(_)
            | BlockBody::Image(_)
            | BlockBody::Divider
            | BlockBody::Unsupported(_) => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut String> {
        match self {
            BlockBody::Text(b) => Some(&mut b.text),
            BlockBody::Heading(b) => Some(&mut b.text),
            BlockBody::Todo(b) => Some(&mut b.text),
            BlockBody::Quote(b) => Some(&mut b.text),
            BlockBody::Code(b) => Some(&mut b.code),
            BlockBody::List(_)
            | BlockBody::Image(_)
            | BlockBody::Divider
            | BlockBody::Unsupported(_) => None,
        }
    }

    pub fn list(&self) -> Option<&ListBody> {
        match self {
            BlockBody::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn list_mut(&mut self) -> Option<&mut ListBody> {
        match self {
            BlockBody::List(list) => Some(list),
            _ => None,
        }
    }

    /// Text projection used for merges and the text fallback renderer.
    pub fn plain_text(&self) -> String {
        match self {
            BlockBody::List(list) => list.joined_text(),
            BlockBody::Image(image) => image.alt.clone().unwrap_or_default(),
            BlockBody::Divider => String::new(),
            BlockBody::Unsupported(raw) => text_of(&raw.content).unwrap_or_default(),
            body => body.text().unwrap_or_default().to_string(),
        }
    }

    /// Empty the content while keeping the kind (and, for lists, one item).
    pub fn clear_content(&mut self) {
        match self {
            BlockBody::List(list) => {
                let mut first = list.items.first().cloned().unwrap_or_else(|| ListItem::empty(0));
                first.content.clear();
                list.items = vec![first];
            }
            BlockBody::Todo(todo) => {
                *todo = TodoBody::default();
            }
            BlockBody::Image(image) => {
                *image = ImageBody::default();
            }
            BlockBody::Unsupported(raw) => {
                raw.content = Value::Null;
            }
            BlockBody::Divider => {}
            body => {
                if let Some(text) = body.text_mut() {
                    text.clear();
                }
            }
        }
    }

    /// Persisted `(content, metadata)` pair in the shapes the storage layer
    /// expects.
    pub fn to_raw(&self) -> (Value, Value) {
        match self {
            BlockBody::Text(b) => (Value::String(b.text.clone()), json!({})),
            BlockBody::Heading(b) => (Value::String(b.text.clone()), json!({ "level": b.level })),
            BlockBody::List(b) => {
                let items: Vec<Value> = b
                    .items
                    .iter()
                    .map(|item| {
                        json!({
                            "id": item.id.as_str(),
                            "content": item.content,
                            "indent": item.indent,
                        })
                    })
                    .collect();
                (
                    Value::String(b.joined_text()),
                    json!({ "listType": b.style.as_str(), "items": items }),
                )
            }
            BlockBody::Todo(b) => {
                let mut content = Map::new();
                content.insert("text".into(), Value::String(b.text.clone()));
                content.insert("checked".into(), Value::Bool(b.checked));
                if let Some(priority) = b.priority {
                    content.insert("priority".into(), Value::String(priority.as_str().into()));
                }
                if let Some(due) = b.due_date {
                    content.insert(
                        "dueDate".into(),
                        Value::String(due.format("%Y-%m-%d").to_string()),
                    );
                }
                if let Some(assignee) = &b.assigned_to {
                    content.insert("assignedTo".into(), Value::String(assignee.clone()));
                }
                (Value::Object(content), json!({}))
            }
            BlockBody::Quote(b) => {
                let mut metadata = Map::new();
                metadata.insert("style".into(), Value::String(b.style.as_str().into()));
                if let Some(author) = &b.author {
                    metadata.insert("author".into(), Value::String(author.clone()));
                }
                if let Some(source) = &b.source {
                    metadata.insert("source".into(), Value::String(source.clone()));
                }
                (Value::String(b.text.clone()), Value::Object(metadata))
            }
            BlockBody::Code(b) => {
                let mut metadata = Map::new();
                metadata.insert("language".into(), Value::String(b.language.clone()));
                if let Some(filename) = &b.filename {
                    metadata.insert("filename".into(), Value::String(filename.clone()));
                }
                metadata.insert("showLineNumbers".into(), Value::Bool(b.show_line_numbers));
                (Value::String(b.code.clone()), Value::Object(metadata))
            }
            BlockBody::Image(b) => {
                let mut content = Map::new();
                content.insert("url".into(), Value::String(b.url.clone()));
                if let Some(alt) = &b.alt {
                    content.insert("alt".into(), Value::String(alt.clone()));
                }
                if let Some(caption) = &b.caption {
                    content.insert("caption".into(), Value::String(caption.clone()));
                }
                (Value::Object(content), json!({}))
            }
            BlockBody::Divider => (Value::Null, json!({})),
            BlockBody::Unsupported(b) => (b.content.clone(), b.metadata.clone()),
        }
    }

    /// Body holding the text after `offset`, for splitting. Headings keep
    /// their level, quotes their style, code its language; todos start
    /// unchecked. `None` for bodies without a single text field.
    pub(crate) fn split_off(&mut self, offset: usize) -> Option<BlockBody> {
        let text = self.text_mut()?;
        let offset = clamp_to_char_boundary(text, offset);
        let tail = text.split_off(offset);
        let next = match self {
            BlockBody::Text(_) => BlockBody::Text(TextBody { text: tail }),
            BlockBody::Heading(b) => BlockBody::Heading(HeadingBody {
                text: tail,
                level: b.level,
            }),
            BlockBody::Todo(_) => BlockBody::Todo(TodoBody {
                text: tail,
                ..TodoBody::default()
            }),
            BlockBody::Quote(b) => BlockBody::Quote(QuoteBody {
                text: tail,
                style: b.style,
                author: None,
                source: None,
            }),
            BlockBody::Code(b) => BlockBody::Code(CodeBody {
                code: tail,
                language: b.language.clone(),
                filename: None,
                show_line_numbers: b.show_line_numbers,
            }),
            _ => return None,
        };
        Some(next)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub body: BlockBody,
}

impl Block {
    pub fn new(id: BlockId, body: BlockBody) -> Self {
        Self { id, body }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(
            BlockId::generate(),
            BlockBody::Text(TextBody { text: text.into() }),
        )
    }

    pub fn kind(&self) -> BlockKind {
        self.body.kind()
    }

    /// Persisted type name; unsupported blocks keep their original name.
    pub fn type_name(&self) -> &str {
        match &self.body {
            BlockBody::Unsupported(raw) => &raw.type_name,
            body => body.kind().as_str(),
        }
    }
}

pub(crate) fn clamp_to_char_boundary(s: &str, mut ix: usize) -> usize {
    ix = ix.min(s.len());
    while ix > 0 && !s.is_char_boundary(ix) {
        ix -= 1;
    }
    ix
}
