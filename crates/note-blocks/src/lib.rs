mod block;
mod config;
mod document;
mod editor;
mod error;
mod keys;
pub mod markdown;
pub mod normalize;
mod numbering;
mod ops;
pub mod plugins;
mod registry;
mod value;

pub use crate::block::*;
pub use crate::config::*;
pub use crate::document::*;
pub use crate::editor::*;
pub use crate::error::*;
pub use crate::keys::*;
pub use crate::numbering::*;
pub use crate::ops::*;
pub use crate::registry::*;
pub use crate::value::*;
