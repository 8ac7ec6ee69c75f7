use thiserror::Error;

use crate::block::BlockKind;

/// Failures reading a persisted note. Malformed block content is never an
/// error; only unreadable JSON or a document from an incompatible writer is.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("invalid note JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported note schema `{0}`")]
    Schema(String),
    #[error("note version {found} is newer than supported version {supported}")]
    Version { found: u32, supported: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate block kind: {0}")]
    DuplicateKind(BlockKind),
    #[error("duplicate block type alias `{alias}` (already maps to {existing})")]
    DuplicateAlias { alias: String, existing: BlockKind },
    #[error("block kind {0} cannot be registered")]
    Reserved(BlockKind),
}
