//! The built-in block kinds.
//!
//! Each plugin pairs a normalizer from [`crate::normalize`] with a plain-text
//! renderer and the keyboard behavior of its block editor. Text-like kinds
//! share [`text_block_key_down`]; images and dividers share
//! [`void_block_key_down`].

use serde_json::{Value, json};

use crate::block::{
    Block, BlockBody, BlockKind, CodeBody, HeadingBody, ImageBody, ListBody, QuoteBody,
    QuoteStyle, TextBody, TodoBody, clamp_to_char_boundary,
};
use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::keys::{Key, KeyEvent, KeyOutcome};
use crate::markdown::parse_trigger;
use crate::normalize;
use crate::numbering::list_markers;
use crate::ops::{Focus, IndentDirection};
use crate::registry::BlockPlugin;

fn handled_if(applied: bool) -> KeyOutcome {
    if applied {
        KeyOutcome::Handled
    } else {
        KeyOutcome::Ignored
    }
}

/// Enter, Backspace and vertical arrows for blocks with one editable string.
///
/// - Enter at the end inserts a block of the same kind, elsewhere it splits.
/// - Backspace at offset 0 merges into the previous block; on the first
///   block it turns a formatted block back into plain text.
/// - ArrowUp at offset 0 and ArrowDown at the end move to the neighbors.
pub fn text_block_key_down(editor: &mut Editor, focus: &Focus, event: &KeyEvent) -> KeyOutcome {
    let Some(block) = editor.block(&focus.block) else {
        return KeyOutcome::Ignored;
    };
    let kind = block.kind();
    let len = block.body.text().map(str::len).unwrap_or(0);
    let is_first = editor.doc().index_of(&focus.block) == Some(0);

    match event.key {
        Key::Enter if !event.shift => {
            if focus.caret >= len {
                handled_if(editor.insert_after(&focus.block, None).is_some())
            } else {
                handled_if(editor.split(&focus.block, focus.caret).is_some())
            }
        }
        Key::Backspace if focus.caret == 0 => {
            if !is_first {
                return handled_if(editor.merge_with_previous(&focus.block));
            }
            match kind {
                BlockKind::Text | BlockKind::Unsupported => KeyOutcome::Ignored,
                _ => handled_if(editor.convert_type(&focus.block, BlockKind::Text)),
            }
        }
        Key::ArrowUp if focus.caret == 0 => handled_if(editor.focus_previous_block()),
        Key::ArrowDown if focus.caret >= len => handled_if(editor.focus_next_block()),
        _ => KeyOutcome::Ignored,
    }
}

/// Keys for blocks without a caret: Backspace deletes, Enter adds a text
/// block below, arrows leave.
pub fn void_block_key_down(editor: &mut Editor, focus: &Focus, event: &KeyEvent) -> KeyOutcome {
    match event.key {
        Key::Backspace => handled_if(editor.remove(&focus.block)),
        Key::Enter => handled_if(
            editor
                .insert_after(&focus.block, Some(BlockKind::Text))
                .is_some(),
        ),
        Key::ArrowUp => handled_if(editor.focus_previous_block()),
        Key::ArrowDown => handled_if(editor.focus_next_block()),
        _ => KeyOutcome::Ignored,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextPlugin;

impl TextPlugin {
    fn markdown_shortcut(editor: &mut Editor, focus: &Focus) -> Option<KeyOutcome> {
        let block = editor.block(&focus.block)?;
        if block.kind() != BlockKind::Text {
            return None;
        }
        let text = block.body.text()?;
        let caret = clamp_to_char_boundary(text, focus.caret);
        let trigger = parse_trigger(&text[..caret])?;
        editor
            .apply_trigger(&focus.block, caret, &trigger)
            .then_some(KeyOutcome::Handled)
    }
}

impl BlockPlugin for TextPlugin {
    fn kind(&self) -> BlockKind {
        BlockKind::Text
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["paragraph", "p", "plain"]
    }

    fn label(&self) -> &'static str {
        "Text"
    }

    fn default_body(&self, _config: &EditorConfig) -> BlockBody {
        BlockBody::Text(TextBody::default())
    }

    fn normalize(&self, content: &Value, metadata: &Value) -> BlockBody {
        normalize::normalize_text(content, metadata)
    }

    fn render(&self, block: &Block) -> String {
        block.body.plain_text()
    }

    fn on_key_down(&self, editor: &mut Editor, focus: &Focus, event: &KeyEvent) -> KeyOutcome {
        if event.key == Key::Space {
            return Self::markdown_shortcut(editor, focus).unwrap_or(KeyOutcome::Ignored);
        }
        text_block_key_down(editor, focus, event)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeadingPlugin;

impl BlockPlugin for HeadingPlugin {
    fn kind(&self) -> BlockKind {
        BlockKind::Heading
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["header", "h", "title"]
    }

    fn label(&self) -> &'static str {
        "Heading"
    }

    fn default_body(&self, _config: &EditorConfig) -> BlockBody {
        BlockBody::Heading(HeadingBody::default())
    }

    fn normalize(&self, content: &Value, metadata: &Value) -> BlockBody {
        normalize::normalize_heading(content, metadata)
    }

    fn render(&self, block: &Block) -> String {
        match &block.body {
            BlockBody::Heading(heading) => {
                format!("{} {}", "#".repeat(heading.level as usize), heading.text)
            }
            body => body.plain_text(),
        }
    }

    fn on_key_down(&self, editor: &mut Editor, focus: &Focus, event: &KeyEvent) -> KeyOutcome {
        text_block_key_down(editor, focus, event)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListPlugin;

impl BlockPlugin for ListPlugin {
    fn kind(&self) -> BlockKind {
        BlockKind::List
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["bullet_list", "bulleted_list", "list_item", "ul"]
    }

    fn label(&self) -> &'static str {
        "List"
    }

    fn default_body(&self, _config: &EditorConfig) -> BlockBody {
        BlockBody::List(ListBody::default())
    }

    /// Only the style: items rebuilt from the converted block's content must
    /// not be shadowed by a default item list.
    fn default_metadata(&self, _config: &EditorConfig) -> Value {
        json!({ "listType": ListBody::default().style.as_str() })
    }

    fn normalize(&self, content: &Value, metadata: &Value) -> BlockBody {
        normalize::normalize_list(content, metadata)
    }

    fn render(&self, block: &Block) -> String {
        let Some(list) = block.body.list() else {
            return block.body.plain_text();
        };
        list.items
            .iter()
            .zip(list_markers(list))
            .map(|(item, marker)| {
                format!("{}{} {}", "  ".repeat(item.indent as usize), marker, item.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn on_focus(&self, block: &Block, focus: Focus) -> Focus {
        let Some(list) = block.body.list() else {
            return Focus::new(block.id.clone());
        };
        let item = focus
            .item
            .unwrap_or(0)
            .min(list.items.len().saturating_sub(1));
        let caret = list
            .items
            .get(item)
            .map(|it| clamp_to_char_boundary(&it.content, focus.caret))
            .unwrap_or(0);
        Focus::in_item(block.id.clone(), item, caret)
    }

    fn on_key_down(&self, editor: &mut Editor, focus: &Focus, event: &KeyEvent) -> KeyOutcome {
        let Some(list) = editor.block(&focus.block).and_then(|b| b.body.list()) else {
            return KeyOutcome::Ignored;
        };
        let item = focus.item.unwrap_or(0);
        let count = list.items.len();
        let item_len = list.items.get(item).map(|it| it.content.len()).unwrap_or(0);

        match event.key {
            Key::Enter if !event.shift => handled_if(editor.add_item(&focus.block, item)),
            Key::Backspace if item_len == 0 => handled_if(editor.remove_item(&focus.block, item)),
            Key::Tab => {
                let direction = if event.shift {
                    IndentDirection::Out
                } else {
                    IndentDirection::In
                };
                editor.indent(&focus.block, Some(item), direction);
                KeyOutcome::Handled
            }
            Key::ArrowUp if item > 0 => {
                let target = Focus::in_item(focus.block.clone(), item - 1, focus.caret);
                editor.set_focus(Some(target));
                KeyOutcome::Handled
            }
            Key::ArrowUp => handled_if(editor.focus_previous_block()),
            Key::ArrowDown if item + 1 < count => {
                let target = Focus::in_item(focus.block.clone(), item + 1, focus.caret);
                editor.set_focus(Some(target));
                KeyOutcome::Handled
            }
            Key::ArrowDown => handled_if(editor.focus_next_block()),
            _ => KeyOutcome::Ignored,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TodoPlugin;

impl BlockPlugin for TodoPlugin {
    fn kind(&self) -> BlockKind {
        BlockKind::Todo
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["task", "checklist", "checkbox", "todo_item", "check_list"]
    }

    fn label(&self) -> &'static str {
        "To-do"
    }

    fn default_body(&self, _config: &EditorConfig) -> BlockBody {
        BlockBody::Todo(TodoBody::default())
    }

    fn normalize(&self, content: &Value, metadata: &Value) -> BlockBody {
        normalize::normalize_todo(content, metadata)
    }

    fn render(&self, block: &Block) -> String {
        let BlockBody::Todo(todo) = &block.body else {
            return block.body.plain_text();
        };
        let mut out = format!("- [{}] {}", if todo.checked { "x" } else { " " }, todo.text);
        if let Some(priority) = todo.priority {
            out.push_str(&format!(" !{}", priority.as_str()));
        }
        if let Some(due) = todo.due_date {
            out.push_str(&format!(" (due {})", due.format("%Y-%m-%d")));
        }
        if let Some(assignee) = &todo.assigned_to {
            out.push_str(&format!(" @{assignee}"));
        }
        out
    }

    fn on_key_down(&self, editor: &mut Editor, focus: &Focus, event: &KeyEvent) -> KeyOutcome {
        if event.key == Key::Enter && event.shift {
            tracing::info!(block = %focus.block, "calendar scheduling requested for todo");
            return KeyOutcome::CalendarRequested(focus.block.clone());
        }
        text_block_key_down(editor, focus, event)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuotePlugin;

impl BlockPlugin for QuotePlugin {
    fn kind(&self) -> BlockKind {
        BlockKind::Quote
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["blockquote"]
    }

    fn label(&self) -> &'static str {
        "Quote"
    }

    fn default_body(&self, _config: &EditorConfig) -> BlockBody {
        BlockBody::Quote(QuoteBody::default())
    }

    fn normalize(&self, content: &Value, metadata: &Value) -> BlockBody {
        normalize::normalize_quote(content, metadata)
    }

    fn render(&self, block: &Block) -> String {
        let BlockBody::Quote(quote) = &block.body else {
            return block.body.plain_text();
        };
        let mut lines = Vec::new();
        match quote.style {
            QuoteStyle::Default => {}
            QuoteStyle::Callout => lines.push("[!TIP]".to_string()),
            QuoteStyle::Warning => lines.push("[!WARNING]".to_string()),
            QuoteStyle::Info => lines.push("[!NOTE]".to_string()),
        }
        lines.extend(quote.text.split('\n').map(str::to_string));
        let attribution = match (&quote.author, &quote.source) {
            (Some(author), Some(source)) => Some(format!("-- {author}, {source}")),
            (Some(author), None) => Some(format!("-- {author}")),
            (None, Some(source)) => Some(format!("-- {source}")),
            (None, None) => None,
        };
        lines.extend(attribution);
        lines
            .iter()
            .map(|line| format!("> {line}").trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn on_key_down(&self, editor: &mut Editor, focus: &Focus, event: &KeyEvent) -> KeyOutcome {
        text_block_key_down(editor, focus, event)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CodePlugin;

impl BlockPlugin for CodePlugin {
    fn kind(&self) -> BlockKind {
        BlockKind::Code
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["code_block", "codeblock", "snippet", "pre"]
    }

    fn label(&self) -> &'static str {
        "Code"
    }

    fn default_body(&self, config: &EditorConfig) -> BlockBody {
        BlockBody::Code(CodeBody {
            language: config.default_code_language.clone(),
            ..CodeBody::default()
        })
    }

    fn normalize(&self, content: &Value, metadata: &Value) -> BlockBody {
        normalize::normalize_code(content, metadata)
    }

    fn render(&self, block: &Block) -> String {
        let BlockBody::Code(code) = &block.body else {
            return block.body.plain_text();
        };
        format!("```{}\n{}\n```", code.language, code.code)
    }

    /// Enter stays inside the block; Shift+Enter leaves it. Tab indents the
    /// caret position and Shift+Tab outdents the current line.
    fn on_key_down(&self, editor: &mut Editor, focus: &Focus, event: &KeyEvent) -> KeyOutcome {
        match (event.key, event.shift) {
            (Key::Enter, false) => handled_if(editor.insert_text("\n")),
            (Key::Enter, true) => handled_if(
                editor
                    .insert_after(&focus.block, Some(BlockKind::Text))
                    .is_some(),
            ),
            (Key::Tab, false) => {
                let indent = editor.config().code_indent();
                editor.insert_text(&indent);
                KeyOutcome::Handled
            }
            (Key::Tab, true) => {
                let width = editor.config().code_indent_width;
                editor.outdent_line(width);
                KeyOutcome::Handled
            }
            _ => text_block_key_down(editor, focus, event),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePlugin;

impl BlockPlugin for ImagePlugin {
    fn kind(&self) -> BlockKind {
        BlockKind::Image
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["img", "picture"]
    }

    fn label(&self) -> &'static str {
        "Image"
    }

    fn default_body(&self, _config: &EditorConfig) -> BlockBody {
        BlockBody::Image(ImageBody::default())
    }

    fn normalize(&self, content: &Value, metadata: &Value) -> BlockBody {
        normalize::normalize_image(content, metadata)
    }

    fn render(&self, block: &Block) -> String {
        let BlockBody::Image(image) = &block.body else {
            return block.body.plain_text();
        };
        let mut out = format!("![{}]({})", image.alt.as_deref().unwrap_or_default(), image.url);
        if let Some(caption) = &image.caption {
            out.push('\n');
            out.push_str(caption);
        }
        out
    }

    fn is_text_editable(&self) -> bool {
        false
    }

    fn on_key_down(&self, editor: &mut Editor, focus: &Focus, event: &KeyEvent) -> KeyOutcome {
        void_block_key_down(editor, focus, event)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DividerPlugin;

impl BlockPlugin for DividerPlugin {
    fn kind(&self) -> BlockKind {
        BlockKind::Divider
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["hr", "separator", "rule"]
    }

    fn label(&self) -> &'static str {
        "Divider"
    }

    fn default_body(&self, _config: &EditorConfig) -> BlockBody {
        BlockBody::Divider
    }

    fn normalize(&self, content: &Value, metadata: &Value) -> BlockBody {
        normalize::normalize_divider(content, metadata)
    }

    fn render(&self, _block: &Block) -> String {
        "---".to_string()
    }

    fn is_text_editable(&self) -> bool {
        false
    }

    fn on_key_down(&self, editor: &mut Editor, focus: &Focus, event: &KeyEvent) -> KeyOutcome {
        void_block_key_down(editor, focus, event)
    }
}
