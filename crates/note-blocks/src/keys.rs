use serde::{Deserialize, Serialize};

use crate::block::BlockId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Enter,
    Backspace,
    Tab,
    Space,
    ArrowUp,
    ArrowDown,
    Char(char),
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub shift: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self { key, shift: false }
    }

    pub fn shifted(key: Key) -> Self {
        Self { key, shift: true }
    }
}

impl From<Key> for KeyEvent {
    fn from(key: Key) -> Self {
        Self::new(key)
    }
}

/// What the host should do with the native key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Not consumed; the host applies its default behavior.
    Ignored,
    /// Consumed by the editor (preventDefault).
    Handled,
    /// Consumed; the host should offer to schedule this todo in a calendar.
    CalendarRequested(BlockId),
}

impl KeyOutcome {
    pub fn prevents_default(&self) -> bool {
        !matches!(self, KeyOutcome::Ignored)
    }
}
