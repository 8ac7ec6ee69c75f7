//! Coercion of loosely shaped persisted content into typed block bodies.
//!
//! Stored notes were written by several generations of the application, so a
//! todo may carry `completed` instead of `checked`, a heading level may be a
//! string, and a list may be a plain newline-separated string. Every function
//! here accepts any JSON value and falls back to the kind's empty default;
//! none of them fail.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate};
use serde_json::Value;

use crate::block::{
    BlockBody, CodeBody, DEFAULT_HEADING_LEVEL, HeadingBody, ImageBody, ItemId, ListBody,
    ListItem, ListStyle, MAX_HEADING_LEVEL, MAX_LIST_INDENT, MIN_HEADING_LEVEL, Priority,
    QuoteBody, QuoteStyle, TextBody, TodoBody,
};

pub const DEFAULT_CODE_LANGUAGE: &str = "text";

const TEXT_KEYS: &[&str] = &["text", "content", "title", "label", "value"];
const CHECKED_KEYS: &[&str] = &["checked", "completed", "done", "isCompleted", "is_completed"];
const PRIORITY_KEYS: &[&str] = &["priority"];
const DUE_DATE_KEYS: &[&str] = &["dueDate", "due_date", "due"];
const ASSIGNEE_KEYS: &[&str] = &["assignedTo", "assigned_to", "assignee"];
const LEVEL_KEYS: &[&str] = &["level", "headingLevel", "heading_level"];
const LIST_STYLE_KEYS: &[&str] = &["listType", "list_type", "style"];
const ITEMS_KEYS: &[&str] = &["items"];
const INDENT_KEYS: &[&str] = &["indent", "level", "depth"];
const QUOTE_STYLE_KEYS: &[&str] = &["style", "variant"];
const LANGUAGE_KEYS: &[&str] = &["language", "lang"];
const LINE_NUMBER_KEYS: &[&str] = &["showLineNumbers", "show_line_numbers", "lineNumbers"];
const URL_KEYS: &[&str] = &["url", "src"];

/// Field-level alias groups; list item keys are not included.
const FIELD_ALIASES: &[&[&str]] = &[
    TEXT_KEYS,
    CHECKED_KEYS,
    DUE_DATE_KEYS,
    ASSIGNEE_KEYS,
    LEVEL_KEYS,
    LIST_STYLE_KEYS,
    QUOTE_STYLE_KEYS,
    LANGUAGE_KEYS,
    LINE_NUMBER_KEYS,
    URL_KEYS,
];

/// Every stored key that names the same field as `key`.
pub(crate) fn aliases_of(key: &str) -> impl Iterator<Item = &'static str> + '_ {
    FIELD_ALIASES
        .iter()
        .filter(move |group| group.iter().any(|alias| *alias == key))
        .flat_map(|group| group.iter().copied())
}

/// Best-effort string projection of any stored value.
///
/// Strings pass through, numbers are formatted, objects are searched for the
/// known text aliases and arrays (legacy list content) are joined by
/// newlines. Anything else has no text.
pub fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => TEXT_KEYS
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
        Value::Array(items) => {
            let lines: Vec<String> = items.iter().filter_map(text_of).collect();
            if lines.is_empty() {
                None
            } else {
                Some(lines.join("\n"))
            }
        }
        Value::Bool(_) | Value::Null => None,
    }
}

/// Lenient boolean coercion; never fails on a type mismatch.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "1" | "x" | "on" | "checked" | "done" | "completed"
        ),
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// First value found under any alias, looking in `metadata` before `content`.
fn field<'a>(content: &'a Value, metadata: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    [metadata, content]
        .into_iter()
        .filter_map(Value::as_object)
        .flat_map(|map| keys.iter().filter_map(move |key| map.get(*key)))
        .find(|value| !value.is_null())
}

/// OR of every alias in both maps: a flag set under any name wins.
fn flag(content: &Value, metadata: &Value, keys: &[&str]) -> bool {
    [metadata, content]
        .into_iter()
        .filter_map(Value::as_object)
        .flat_map(|map| keys.iter().filter_map(move |key| map.get(*key)))
        .any(coerce_bool)
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => {
            let s = s.trim().trim_start_matches(['h', 'H']);
            s.parse::<i64>().ok()
        }
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn body_text(content: &Value) -> String {
    text_of(content).unwrap_or_default()
}

pub fn normalize_text(content: &Value, _metadata: &Value) -> BlockBody {
    BlockBody::Text(TextBody {
        text: body_text(content),
    })
}

pub fn heading_level(content: &Value, metadata: &Value) -> u8 {
    field(content, metadata, LEVEL_KEYS)
        .and_then(integer)
        .map(|level| level.clamp(MIN_HEADING_LEVEL as i64, MAX_HEADING_LEVEL as i64) as u8)
        .unwrap_or(DEFAULT_HEADING_LEVEL)
}

pub fn normalize_heading(content: &Value, metadata: &Value) -> BlockBody {
    BlockBody::Heading(HeadingBody {
        text: body_text(content),
        level: heading_level(content, metadata),
    })
}

fn list_style(content: &Value, metadata: &Value) -> ListStyle {
    if flag(content, metadata, &["ordered", "numbered"]) {
        return ListStyle::Numbered;
    }
    match field(content, metadata, LIST_STYLE_KEYS).and_then(Value::as_str) {
        Some(s) => match s.trim().to_ascii_lowercase().as_str() {
            "numbered" | "ordered" | "number" | "decimal" | "ol" => ListStyle::Numbered,
            _ => ListStyle::Bullet,
        },
        None => ListStyle::Bullet,
    }
}

fn item_indent(value: Option<&Value>) -> u8 {
    value
        .and_then(integer)
        .map(|indent| indent.clamp(0, MAX_LIST_INDENT as i64) as u8)
        .unwrap_or(0)
}

fn list_item(value: &Value) -> ListItem {
    match value {
        Value::Object(map) => {
            let id = match map.get("id") {
                Some(Value::String(s)) if !s.trim().is_empty() => ItemId::from(s.as_str()),
                Some(Value::Number(n)) => ItemId::from(n.to_string()),
                _ => ItemId::generate(),
            };
            let indent = item_indent(INDENT_KEYS.iter().find_map(|key| map.get(*key)));
            ListItem {
                id,
                content: body_text(value),
                indent,
            }
        }
        other => ListItem::with_content(body_text(other), 0),
    }
}

/// A legacy list line: two leading spaces per indent level, optional bullet.
fn legacy_line(line: &str) -> ListItem {
    let trimmed = line.trim_start_matches(' ');
    let indent = ((line.len() - trimmed.len()) / 2).min(MAX_LIST_INDENT as usize) as u8;
    let content = ["- ", "* ", "• "]
        .iter()
        .find_map(|marker| trimmed.strip_prefix(marker))
        .unwrap_or(trimmed);
    ListItem::with_content(content, indent)
}

pub fn normalize_list(content: &Value, metadata: &Value) -> BlockBody {
    let mut items: Vec<ListItem> = match field(content, metadata, ITEMS_KEYS) {
        Some(Value::Array(items)) => items.iter().map(list_item).collect(),
        _ => match content {
            Value::Array(items) => items.iter().map(list_item).collect(),
            Value::String(s) if !s.is_empty() => s.lines().map(legacy_line).collect(),
            _ => Vec::new(),
        },
    };

    let mut seen = HashSet::new();
    for item in &mut items {
        if !seen.insert(item.id.clone()) {
            tracing::trace!(item = %item.id, "regenerating duplicate list item id");
            item.id = ItemId::generate();
            seen.insert(item.id.clone());
        }
    }

    if items.is_empty() {
        items.push(ListItem::empty(0));
    }

    BlockBody::List(ListBody {
        style: list_style(content, metadata),
        items,
    })
}

fn priority(value: Option<&Value>) -> Option<Priority> {
    match value? {
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" | "med" | "normal" => Some(Priority::Medium),
            "high" | "urgent" => Some(Priority::High),
            _ => None,
        },
        value => match integer(value)? {
            1 => Some(Priority::Low),
            2 => Some(Priority::Medium),
            3 => Some(Priority::High),
            _ => None,
        },
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    s.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

pub fn normalize_todo(content: &Value, metadata: &Value) -> BlockBody {
    let due_date = field(content, metadata, DUE_DATE_KEYS)
        .and_then(Value::as_str)
        .and_then(parse_date);
    BlockBody::Todo(TodoBody {
        text: body_text(content),
        checked: flag(content, metadata, CHECKED_KEYS),
        priority: priority(field(content, metadata, PRIORITY_KEYS)),
        due_date,
        assigned_to: non_empty_string(field(content, metadata, ASSIGNEE_KEYS)),
    })
}

pub fn normalize_quote(content: &Value, metadata: &Value) -> BlockBody {
    let style = match field(&Value::Null, metadata, QUOTE_STYLE_KEYS).and_then(Value::as_str) {
        Some(s) => match s.trim().to_ascii_lowercase().as_str() {
            "callout" => QuoteStyle::Callout,
            "warning" => QuoteStyle::Warning,
            "info" => QuoteStyle::Info,
            _ => QuoteStyle::Default,
        },
        None => QuoteStyle::Default,
    };
    BlockBody::Quote(QuoteBody {
        text: body_text(content),
        style,
        author: non_empty_string(field(content, metadata, &["author"])),
        source: non_empty_string(field(content, metadata, &["source"])),
    })
}

pub fn normalize_code(content: &Value, metadata: &Value) -> BlockBody {
    BlockBody::Code(CodeBody {
        code: body_text(content),
        language: non_empty_string(field(content, metadata, LANGUAGE_KEYS))
            .unwrap_or_else(|| DEFAULT_CODE_LANGUAGE.to_string()),
        filename: non_empty_string(field(content, metadata, &["filename"])),
        show_line_numbers: flag(content, metadata, LINE_NUMBER_KEYS),
    })
}

pub fn normalize_image(content: &Value, metadata: &Value) -> BlockBody {
    let url = match content {
        Value::String(s) => s.trim().to_string(),
        _ => non_empty_string(field(content, metadata, URL_KEYS)).unwrap_or_default(),
    };
    BlockBody::Image(ImageBody {
        url,
        alt: non_empty_string(field(content, metadata, &["alt"])),
        caption: non_empty_string(field(content, metadata, &["caption"])),
    })
}

pub fn normalize_divider(_content: &Value, _metadata: &Value) -> BlockBody {
    BlockBody::Divider
}
