use crate::block::{
    Block, BlockBody, BlockId, BlockKind, ListItem, MAX_LIST_INDENT, UnsupportedBody,
    clamp_to_char_boundary,
};
use crate::config::EditorConfig;
use crate::document::Document;
use crate::error::ValueError;
use crate::keys::{Key, KeyEvent, KeyOutcome};
use crate::markdown::Trigger;
use crate::numbering::list_markers;
use crate::ops::{BlockPatch, EditOp, Focus, IndentDirection};
use crate::registry::BlockRegistry;
use crate::value::{NoteValue, RawBlock};

/// Receives the full document after every committed change.
pub type CommitSink = Box<dyn FnMut(&Document) + Send>;

#[derive(Debug, Clone)]
struct Snapshot {
    doc: Document,
    focus: Option<Focus>,
}

/// Owns one open note: the block sequence, the focus pointer and history.
///
/// Every operation is synchronous and applied in call order. Operations
/// addressed to an unknown block, or that would break an invariant, leave the
/// document untouched and report `false` / `None`.
pub struct Editor {
    doc: Document,
    focus: Option<Focus>,
    registry: BlockRegistry,
    config: EditorConfig,
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    sink: Option<CommitSink>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("doc", &self.doc)
            .field("focus", &self.focus)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .finish()
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::empty()
    }
}

impl Editor {
    pub fn new(doc: Document, registry: BlockRegistry, config: EditorConfig) -> Self {
        let mut editor = Self {
            doc,
            focus: None,
            registry,
            config: config.with_defaults(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            sink: None,
        };
        editor.normalize_in_place();
        editor.focus = editor
            .doc
            .blocks()
            .first()
            .and_then(|block| editor.resolve_focus(Focus::new(block.id.clone())));
        editor
    }

    /// A new note: one empty text block, focused.
    pub fn empty() -> Self {
        Self::new(
            Document::new(),
            BlockRegistry::standard(),
            EditorConfig::default(),
        )
    }

    pub fn hydrate(raw: &[RawBlock]) -> Self {
        let registry = BlockRegistry::standard();
        let doc = Document::hydrate(raw, &registry);
        Self::new(doc, registry, EditorConfig::default())
    }

    pub fn from_json_str(s: &str) -> Result<Self, ValueError> {
        let value = NoteValue::from_json_str(s)?;
        Ok(Self::hydrate(&value.blocks))
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config.with_defaults();
        self
    }

    pub fn on_commit(mut self, sink: impl FnMut(&Document) + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn set_commit_sink(&mut self, sink: Option<CommitSink>) {
        self.sink = sink;
    }

    pub fn doc(&self) -> &Document {
        &self.doc
    }

    pub fn blocks(&self) -> &[Block] {
        self.doc.blocks()
    }

    pub fn block(&self, id: &BlockId) -> Option<&Block> {
        self.doc.get(id)
    }

    pub fn focus(&self) -> Option<&Focus> {
        self.focus.as_ref()
    }

    pub fn focused_block(&self) -> Option<&Block> {
        self.focus.as_ref().and_then(|focus| self.doc.get(&focus.block))
    }

    pub fn registry(&self) -> &BlockRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn to_value(&self) -> NoteValue {
        NoteValue::from_document(&self.doc)
    }

    pub fn render(&self, id: &BlockId) -> Option<String> {
        self.doc.get(id).map(|block| self.registry.render(block))
    }

    pub fn to_markdown(&self) -> String {
        self.doc.to_markdown(&self.registry)
    }

    /// Display markers of a list block, computed from item positions.
    pub fn list_markers(&self, id: &BlockId) -> Option<Vec<String>> {
        self.doc
            .get(id)
            .and_then(|block| block.body.list())
            .map(list_markers)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = Snapshot {
            doc: std::mem::replace(&mut self.doc, snapshot.doc),
            focus: std::mem::replace(&mut self.focus, snapshot.focus),
        };
        self.redo_stack.push(current);
        self.emit();
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = Snapshot {
            doc: std::mem::replace(&mut self.doc, snapshot.doc),
            focus: std::mem::replace(&mut self.focus, snapshot.focus),
        };
        self.undo_stack.push(current);
        self.emit();
        true
    }

    pub fn apply(&mut self, op: EditOp) -> bool {
        match op {
            EditOp::InsertAfter { after, kind } => self.insert_after(&after, kind).is_some(),
            EditOp::Append { kind } => self.append(kind).is_some(),
            EditOp::Split { block, caret } => self.split(&block, caret).is_some(),
            EditOp::MergeWithPrevious { block } => self.merge_with_previous(&block),
            EditOp::Remove { block } => self.remove(&block),
            EditOp::Indent {
                block,
                item,
                direction,
            } => self.indent(&block, item, direction),
            EditOp::ConvertType { block, kind } => self.convert_type(&block, kind),
            EditOp::Reorder {
                block,
                target_index,
            } => self.reorder(&block, target_index),
            EditOp::Update { block, patch } => self.update(&block, patch),
            EditOp::SetFocus { focus } => self.set_focus(focus),
            EditOp::AddItem { block, after_index } => self.add_item(&block, after_index),
            EditOp::RemoveItem { block, index } => self.remove_item(&block, index),
            EditOp::UpdateItem {
                block,
                index,
                content,
            } => self.update_item(&block, index, content),
            EditOp::InsertText { text } => self.insert_text(&text),
            EditOp::DeleteBackward => self.delete_backward(),
            EditOp::ToggleChecked { block } => self.toggle_checked(&block),
        }
    }

    /// Dispatch a key to the focused block's editor.
    pub fn handle_key(&mut self, event: impl Into<KeyEvent>) -> KeyOutcome {
        let event = event.into();
        let Some(focus) = self.focus.clone() else {
            return KeyOutcome::Ignored;
        };
        let Some(kind) = self.doc.get(&focus.block).map(Block::kind) else {
            return KeyOutcome::Ignored;
        };
        let plugin = self.registry.plugin(kind);
        let outcome = plugin.on_key_down(self, &focus, &event);
        tracing::trace!(?event, ?outcome, kind = %kind, "key handled");
        outcome
    }

    /// Feed characters as keystrokes: spaces, newlines and tabs go through
    /// key handling first, everything else is inserted at the caret.
    pub fn type_text(&mut self, text: &str) {
        let mut buf = [0u8; 4];
        for ch in text.chars() {
            let key = match ch {
                ' ' => Key::Space,
                '\n' => Key::Enter,
                '\t' => Key::Tab,
                other => Key::Char(other),
            };
            if self.handle_key(key) == KeyOutcome::Ignored {
                self.insert_text(ch.encode_utf8(&mut buf));
            }
        }
    }

    pub fn insert_after(&mut self, after: &BlockId, kind: Option<BlockKind>) -> Option<BlockId> {
        self.commit("insert_after", |ed| ed.insert_after_inner(after, kind))
    }

    /// Add a block at the end of the document (plain text by default).
    pub fn append(&mut self, kind: Option<BlockKind>) -> Option<BlockId> {
        self.commit("append", |ed| {
            let kind = ed.registered_or_text(kind.unwrap_or(BlockKind::Text));
            let block = ed.registry.create_default(kind, &ed.config);
            let id = block.id.clone();
            ed.doc.blocks_mut().push(block);
            ed.focus_on(Focus::new(id.clone()));
            Some(id)
        })
    }

    /// Split a text-like block at `caret`. On a list block this adds an
    /// empty item after the focused item instead of splitting its text.
    /// Returns the block that now holds focus.
    pub fn split(&mut self, id: &BlockId, caret: usize) -> Option<BlockId> {
        self.commit("split", |ed| ed.split_inner(id, caret))
    }

    pub fn merge_with_previous(&mut self, id: &BlockId) -> bool {
        self.commit("merge_with_previous", |ed| ed.merge_with_previous_inner(id))
            .is_some()
    }

    pub fn remove(&mut self, id: &BlockId) -> bool {
        self.commit("remove", |ed| ed.remove_inner(id)).is_some()
    }

    /// Indent a list item; `item` defaults to the focused item, then the first.
    pub fn indent(&mut self, id: &BlockId, item: Option<usize>, direction: IndentDirection) -> bool {
        self.commit("indent", |ed| ed.indent_inner(id, item, direction))
            .is_some()
    }

    pub fn convert_type(&mut self, id: &BlockId, kind: BlockKind) -> bool {
        self.commit("convert_type", |ed| ed.convert_type_inner(id, kind))
            .is_some()
    }

    pub fn reorder(&mut self, id: &BlockId, target_index: usize) -> bool {
        self.commit("reorder", |ed| ed.reorder_inner(id, target_index))
            .is_some()
    }

    pub fn update(&mut self, id: &BlockId, patch: BlockPatch) -> bool {
        self.commit("update", |ed| ed.update_inner(id, &patch))
            .is_some()
    }

    /// The only way to move focus. Unknown blocks are ignored; positions are
    /// clamped by the block's editor.
    pub fn set_focus(&mut self, focus: Option<Focus>) -> bool {
        let next = match focus {
            None => None,
            Some(focus) => match self.resolve_focus(focus) {
                Some(focus) => Some(focus),
                None => {
                    tracing::debug!("ignoring focus request for unknown block");
                    return false;
                }
            },
        };
        if next == self.focus {
            return false;
        }
        self.focus = next;
        true
    }

    pub fn focus_previous_block(&mut self) -> bool {
        let Some(ix) = self.focused_index() else {
            return false;
        };
        if ix == 0 {
            return false;
        }
        let target = self.end_focus(ix - 1);
        self.set_focus(target)
    }

    pub fn focus_next_block(&mut self) -> bool {
        let Some(ix) = self.focused_index() else {
            return false;
        };
        let Some(next) = self.doc.blocks().get(ix + 1) else {
            return false;
        };
        let target = Focus::new(next.id.clone());
        self.set_focus(Some(target))
    }

    pub fn add_item(&mut self, id: &BlockId, after_index: usize) -> bool {
        self.commit("add_item", |ed| ed.add_item_inner(id, after_index))
            .is_some()
    }

    pub fn remove_item(&mut self, id: &BlockId, index: usize) -> bool {
        self.commit("remove_item", |ed| ed.remove_item_inner(id, index))
            .is_some()
    }

    pub fn update_item(&mut self, id: &BlockId, index: usize, content: impl Into<String>) -> bool {
        let content = content.into();
        self.commit("update_item", |ed| {
            let ix = ed.doc.index_of(id)?;
            let item = ed.doc.blocks_mut()[ix]
                .body
                .list_mut()?
                .items
                .get_mut(index)?;
            if item.content == content {
                return None;
            }
            item.content = content;
            ed.renormalize_at(ix);
            ed.refocus(id);
            Some(())
        })
        .is_some()
    }

    /// Insert at the caret of the focused block or list item.
    pub fn insert_text(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.commit("insert_text", |ed| {
            ed.edit_focused_text(|s, caret| {
                s.insert_str(caret, text);
                Some(caret + text.len())
            })
        })
        .is_some()
    }

    /// Delete the character before the caret. At offset 0 nothing happens;
    /// structural Backspace is handled by the block editors.
    pub fn delete_backward(&mut self) -> bool {
        self.commit("delete_backward", |ed| {
            ed.edit_focused_text(|s, caret| {
                let prev = s[..caret].chars().next_back()?;
                let start = caret - prev.len_utf8();
                s.replace_range(start..caret, "");
                Some(start)
            })
        })
        .is_some()
    }

    /// Remove up to `width` leading spaces from the line holding the caret.
    pub fn outdent_line(&mut self, width: usize) -> bool {
        self.commit("outdent_line", |ed| {
            ed.edit_focused_text(|s, caret| {
                let line_start = s[..caret].rfind('\n').map(|ix| ix + 1).unwrap_or(0);
                let spaces = s[line_start..]
                    .chars()
                    .take(width)
                    .take_while(|ch| *ch == ' ')
                    .count();
                if spaces == 0 {
                    return None;
                }
                s.replace_range(line_start..line_start + spaces, "");
                Some(caret.saturating_sub(spaces).max(line_start))
            })
        })
        .is_some()
    }

    pub fn toggle_checked(&mut self, id: &BlockId) -> bool {
        self.commit("toggle_checked", |ed| {
            let BlockBody::Todo(todo) = &mut ed.doc.get_mut(id)?.body else {
                return None;
            };
            todo.checked = !todo.checked;
            Some(())
        })
        .is_some()
    }

    /// Replace a completed shortcut with the block kind it names. The text
    /// before `caret` (the pattern) is dropped, text after it is kept.
    pub(crate) fn apply_trigger(&mut self, id: &BlockId, caret: usize, trigger: &Trigger) -> bool {
        self.commit("markdown_trigger", |ed| {
            let ix = ed.doc.index_of(id)?;
            let text = ed.doc.blocks_mut()[ix].body.text_mut()?;
            let caret = clamp_to_char_boundary(text, caret);
            let rest = text.split_off(caret);
            *text = rest;

            ed.convert_type_inner(id, trigger.kind())?;

            match (trigger, &mut ed.doc.blocks_mut()[ix].body) {
                (Trigger::Heading(level), BlockBody::Heading(heading)) => heading.level = *level,
                (Trigger::List(style), BlockBody::List(list)) => list.style = *style,
                (Trigger::Todo { checked }, BlockBody::Todo(todo)) => todo.checked = *checked,
                (Trigger::Code { language: Some(language) }, BlockBody::Code(code)) => {
                    code.language = language.clone();
                }
                _ => {}
            }
            ed.renormalize_at(ix);
            ed.focus_on(Focus::new(id.clone()));
            tracing::debug!(block = %id, ?trigger, "markdown shortcut applied");
            Some(())
        })
        .is_some()
    }

    fn commit<T>(&mut self, op: &'static str, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let before = Snapshot {
            doc: self.doc.clone(),
            focus: self.focus.clone(),
        };

        let Some(out) = f(self) else {
            self.doc = before.doc;
            self.focus = before.focus;
            tracing::debug!(op, "operation left the document unchanged");
            return None;
        };

        if self.doc != before.doc {
            tracing::debug!(op, blocks = self.doc.len(), "committed");
            self.undo_stack.push(before);
            if self.undo_stack.len() > self.config.max_undo {
                self.undo_stack.remove(0);
            }
            self.redo_stack.clear();
            self.emit();
        }
        Some(out)
    }

    fn emit(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink(&self.doc);
        }
    }

    fn normalize_in_place(&mut self) {
        for ix in 0..self.doc.len() {
            self.renormalize_at(ix);
        }
    }

    fn renormalize_at(&mut self, ix: usize) {
        let Some(block) = self.doc.blocks().get(ix) else {
            return;
        };
        let body = self.registry.renormalize(&block.body);
        self.doc.blocks_mut()[ix].body = body;
    }

    fn registered_or_text(&self, kind: BlockKind) -> BlockKind {
        if self.registry.is_registered(kind) {
            kind
        } else {
            BlockKind::Text
        }
    }

    fn resolve_focus(&self, focus: Focus) -> Option<Focus> {
        let block = self.doc.get(&focus.block)?;
        Some(self.registry.plugin(block.kind()).on_focus(block, focus))
    }

    fn focus_on(&mut self, focus: Focus) {
        self.focus = self.resolve_focus(focus);
    }

    /// Re-clamp focus after `id` changed shape.
    fn refocus(&mut self, id: &BlockId) {
        if let Some(focus) = self.focus.clone().filter(|focus| &focus.block == id) {
            self.focus_on(focus);
        }
    }

    fn focused_index(&self) -> Option<usize> {
        self.focus
            .as_ref()
            .and_then(|focus| self.doc.index_of(&focus.block))
    }

    fn focused_item(&self, id: &BlockId) -> Option<usize> {
        self.focus
            .as_ref()
            .filter(|focus| &focus.block == id)
            .and_then(|focus| focus.item)
    }

    /// Focus at the very end of the block at `ix` (last item for lists).
    fn end_focus(&self, ix: usize) -> Option<Focus> {
        let block = self.doc.blocks().get(ix)?;
        self.resolve_focus(Focus {
            block: block.id.clone(),
            item: Some(usize::MAX),
            caret: usize::MAX,
        })
    }

    fn edit_focused_text(
        &mut self,
        edit: impl FnOnce(&mut String, usize) -> Option<usize>,
    ) -> Option<()> {
        let focus = self.focus.clone()?;
        let ix = self.doc.index_of(&focus.block)?;
        let block = &mut self.doc.blocks_mut()[ix];
        let text = match focus.item {
            Some(item) => &mut block.body.list_mut()?.items.get_mut(item)?.content,
            None => block.body.text_mut()?,
        };
        let caret = clamp_to_char_boundary(text, focus.caret);
        let caret = edit(text, caret)?;
        self.renormalize_at(ix);
        self.focus_on(Focus { caret, ..focus });
        Some(())
    }

    fn insert_after_inner(&mut self, after: &BlockId, kind: Option<BlockKind>) -> Option<BlockId> {
        let ix = self.doc.index_of(after)?;
        let reference = &self.doc.blocks()[ix];
        let kind = self.registered_or_text(kind.unwrap_or_else(|| reference.kind()));
        let inherited = reference.body.list().map(|list| {
            let item = self
                .focused_item(after)
                .and_then(|ix| list.items.get(ix))
                .or_else(|| list.items.last());
            (list.style, item.map(|item| item.indent).unwrap_or(0))
        });

        let mut block = self.registry.create_default(kind, &self.config);
        if let (Some((style, indent)), Some(list)) = (inherited, block.body.list_mut()) {
            list.style = style;
            for item in &mut list.items {
                item.indent = indent;
            }
        }

        let id = block.id.clone();
        self.doc.blocks_mut().insert(ix + 1, block);
        self.focus_on(Focus::new(id.clone()));
        tracing::debug!(after = %after, block = %id, kind = %kind, "inserted block");
        Some(id)
    }

    fn split_inner(&mut self, id: &BlockId, caret: usize) -> Option<BlockId> {
        let ix = self.doc.index_of(id)?;
        if self.doc.blocks()[ix].body.list().is_some() {
            let after = self.focused_item(id).unwrap_or(usize::MAX);
            self.add_item_inner(id, after)?;
            return Some(id.clone());
        }

        let tail = self.doc.blocks_mut()[ix].body.split_off(caret)?;
        let tail = self.registry.renormalize(&tail);
        self.renormalize_at(ix);

        let block = Block::new(BlockId::generate(), tail);
        let new_id = block.id.clone();
        self.doc.blocks_mut().insert(ix + 1, block);
        self.focus_on(Focus::new(new_id.clone()));
        Some(new_id)
    }

    fn merge_with_previous_inner(&mut self, id: &BlockId) -> Option<()> {
        let ix = self.doc.index_of(id)?;
        let prev_ix = ix.checked_sub(1)?;
        if self.doc.blocks()[ix].kind() == BlockKind::Unsupported {
            return None;
        }

        let prev = &self.doc.blocks()[prev_ix];
        let prev_id = prev.id.clone();
        let prev_kind = prev.kind();
        if !self.registry.plugin(prev_kind).is_text_editable() {
            // Nothing to merge into; Backspace deletes the previous block.
            self.doc.blocks_mut().remove(prev_ix);
            self.focus_on(Focus::new(id.clone()));
            return Some(());
        }

        let current = &self.doc.blocks()[ix].body;
        let incoming_items = current.list().map(|list| list.items.clone());
        let incoming_text = current.plain_text();

        let focus = match &mut self.doc.blocks_mut()[prev_ix].body {
            BlockBody::List(list) => {
                let item_ix = list.items.len().checked_sub(1)?;
                let indent = list.items[item_ix].indent;
                let join = list.items[item_ix].content.len();
                // Lines of plain text are appended verbatim, without marker parsing.
                let incoming = incoming_items.unwrap_or_else(|| {
                    incoming_text
                        .split('\n')
                        .map(|line| ListItem::with_content(line, indent))
                        .collect()
                });
                let mut incoming = incoming.into_iter();
                if let Some(first) = incoming.next() {
                    list.items[item_ix].content.push_str(&first.content);
                }
                list.items.extend(incoming);
                Focus::in_item(prev_id, item_ix, join)
            }
            body => {
                let text = body.text_mut()?;
                let join = text.len();
                text.push_str(&incoming_text);
                Focus::at(prev_id, join)
            }
        };

        self.doc.blocks_mut().remove(ix);
        self.renormalize_at(prev_ix);
        self.focus_on(focus);
        Some(())
    }

    fn remove_inner(&mut self, id: &BlockId) -> Option<()> {
        let ix = self.doc.index_of(id)?;
        if self.doc.len() == 1 {
            self.doc.blocks_mut()[ix].body.clear_content();
            self.renormalize_at(ix);
            self.focus_on(Focus::new(id.clone()));
            return Some(());
        }

        self.doc.blocks_mut().remove(ix);
        let removed_focus = self.focus.as_ref().is_some_and(|focus| &focus.block == id);
        if removed_focus {
            self.focus = match ix.checked_sub(1) {
                Some(prev) => self.end_focus(prev),
                None => self
                    .doc
                    .blocks()
                    .get(ix)
                    .and_then(|next| self.resolve_focus(Focus::new(next.id.clone()))),
            };
        }
        Some(())
    }

    fn indent_inner(
        &mut self,
        id: &BlockId,
        item: Option<usize>,
        direction: IndentDirection,
    ) -> Option<()> {
        let index = item.or_else(|| self.focused_item(id)).unwrap_or(0);
        let ix = self.doc.index_of(id)?;
        let list = self.doc.blocks_mut()[ix].body.list_mut()?;
        let item = list.items.get_mut(index)?;
        let next = match direction {
            IndentDirection::In => item.indent.saturating_add(1).min(MAX_LIST_INDENT),
            IndentDirection::Out => item.indent.saturating_sub(1),
        };
        if next == item.indent {
            tracing::debug!(block = %id, index, indent = next, "indent already at bound");
            return None;
        }
        item.indent = next;
        self.renormalize_at(ix);
        Some(())
    }

    fn convert_type_inner(&mut self, id: &BlockId, kind: BlockKind) -> Option<()> {
        if !self.registry.is_registered(kind) {
            return None;
        }
        let ix = self.doc.index_of(id)?;
        let block = &self.doc.blocks()[ix];
        let from = block.kind();
        if from == kind {
            return None;
        }

        let (content, _) = block.body.to_raw();
        let metadata = self.registry.default_metadata(kind, &self.config);
        let body = self.registry.normalize(kind, &content, &metadata);
        self.doc.blocks_mut()[ix].body = body;
        self.refocus(id);
        tracing::debug!(block = %id, from = %from, to = %kind, "converted block");
        Some(())
    }

    fn reorder_inner(&mut self, id: &BlockId, target_index: usize) -> Option<()> {
        let ix = self.doc.index_of(id)?;
        let target = target_index.min(self.doc.len() - 1);
        if ix == target {
            return None;
        }
        let block = self.doc.blocks_mut().remove(ix);
        self.doc.blocks_mut().insert(target, block);
        Some(())
    }

    fn update_inner(&mut self, id: &BlockId, patch: &BlockPatch) -> Option<()> {
        if patch.is_empty() {
            return None;
        }
        let ix = self.doc.index_of(id)?;
        let current = &self.doc.blocks()[ix].body;
        let kind = patch
            .kind
            .filter(|kind| self.registry.is_registered(*kind))
            .unwrap_or(current.kind());

        let body = match current {
            BlockBody::Unsupported(raw) if kind == BlockKind::Unsupported => {
                let (content, metadata) = patch.merged_raw(current);
                BlockBody::Unsupported(UnsupportedBody {
                    type_name: raw.type_name.clone(),
                    content,
                    metadata,
                })
            }
            _ => self.registry.plugin(kind).on_update(current, patch),
        };
        if body == *current {
            return None;
        }
        self.doc.blocks_mut()[ix].body = body;
        self.refocus(id);
        Some(())
    }

    fn add_item_inner(&mut self, id: &BlockId, after_index: usize) -> Option<()> {
        let ix = self.doc.index_of(id)?;
        let list = self.doc.blocks_mut()[ix].body.list_mut()?;
        let after = after_index.min(list.items.len().saturating_sub(1));
        let indent = list.items.get(after).map(|item| item.indent).unwrap_or(0);
        let at = (after + 1).min(list.items.len());
        list.items.insert(at, ListItem::empty(indent));
        self.focus_on(Focus::in_item(id.clone(), at, 0));
        Some(())
    }

    fn remove_item_inner(&mut self, id: &BlockId, index: usize) -> Option<()> {
        let ix = self.doc.index_of(id)?;
        let list = self.doc.blocks_mut()[ix].body.list_mut()?;
        if index >= list.items.len() {
            return None;
        }
        if list.items.len() == 1 {
            list.items[0].content.clear();
            self.focus_on(Focus::in_item(id.clone(), 0, 0));
            return Some(());
        }

        list.items.remove(index);
        let target = index.saturating_sub(1);
        let caret = list.items[target].content.len();
        self.focus_on(Focus::in_item(id.clone(), target, caret));
        Some(())
    }
}
