//! Markdown-style shortcuts typed at the start of a text block.
//!
//! The parser only inspects text; converting the block is the engine's job.

use crate::block::{BlockKind, ListStyle, MAX_HEADING_LEVEL};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Heading(u8),
    List(ListStyle),
    Todo { checked: bool },
    Quote,
    Code { language: Option<String> },
}

impl Trigger {
    pub fn kind(&self) -> BlockKind {
        match self {
            Trigger::Heading(_) => BlockKind::Heading,
            Trigger::List(_) => BlockKind::List,
            Trigger::Todo { .. } => BlockKind::Todo,
            Trigger::Quote => BlockKind::Quote,
            Trigger::Code { .. } => BlockKind::Code,
        }
    }
}

/// Match the whole text before the caret, as it stands when a space is
/// pressed, against the shortcut table.
pub fn parse_trigger(before_caret: &str) -> Option<Trigger> {
    match before_caret {
        "-" | "*" => return Some(Trigger::List(ListStyle::Bullet)),
        "[]" | "[ ]" => return Some(Trigger::Todo { checked: false }),
        "[x]" | "[X]" => return Some(Trigger::Todo { checked: true }),
        ">" => return Some(Trigger::Quote),
        _ => {}
    }

    if !before_caret.is_empty() && before_caret.chars().all(|ch| ch == '#') {
        let level = before_caret.len();
        if level <= MAX_HEADING_LEVEL as usize {
            return Some(Trigger::Heading(level as u8));
        }
        return None;
    }

    if let Some(digits) = before_caret.strip_suffix('.') {
        if !digits.is_empty() && digits.chars().all(|ch| ch.is_ascii_digit()) {
            return Some(Trigger::List(ListStyle::Numbered));
        }
        return None;
    }

    if let Some(language) = before_caret.strip_prefix("```") {
        if language.is_empty() {
            return Some(Trigger::Code { language: None });
        }
        if language
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '#' | '_'))
        {
            return Some(Trigger::Code {
                language: Some(language.to_string()),
            });
        }
    }

    None
}
