use serde::{Deserialize, Serialize};

const DEFAULT_MAX_UNDO: usize = 200;
const DEFAULT_CODE_INDENT_WIDTH: usize = 2;
const DEFAULT_NEW_CODE_LANGUAGE: &str = "javascript";

/// Editor tuning. Zero or empty fields are replaced by defaults, so a host
/// can deserialize a partial JSON object and pass it straight through.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub max_undo: usize,
    pub code_indent_width: usize,
    /// Language given to code blocks created in this session.
    pub default_code_language: String,
}

impl EditorConfig {
    pub fn with_defaults(mut self) -> Self {
        if self.max_undo == 0 {
            self.max_undo = DEFAULT_MAX_UNDO;
        }
        if self.code_indent_width == 0 {
            self.code_indent_width = DEFAULT_CODE_INDENT_WIDTH;
        }
        if self.default_code_language.trim().is_empty() {
            self.default_code_language = DEFAULT_NEW_CODE_LANGUAGE.to_string();
        }
        self
    }

    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(s).map(Self::with_defaults)
    }

    pub fn code_indent(&self) -> String {
        " ".repeat(self.code_indent_width.max(1))
    }
}
