use std::collections::HashSet;

use crate::block::{Block, BlockId};
use crate::registry::BlockRegistry;
use crate::value::RawBlock;

/// Ordered, never-empty block sequence of one note.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            blocks: vec![Block::text("")],
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from existing blocks. An empty input yields the seed text block
    /// and repeated ids are replaced so ids stay unique.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            return Self::default();
        }
        let mut seen = HashSet::new();
        let blocks = blocks
            .into_iter()
            .map(|mut block| {
                if !seen.insert(block.id.clone()) {
                    tracing::trace!(block = %block.id, "regenerating duplicate block id");
                    block.id = BlockId::generate();
                    seen.insert(block.id.clone());
                }
                block
            })
            .collect();
        Self { blocks }
    }

    pub fn hydrate(raw: &[RawBlock], registry: &BlockRegistry) -> Self {
        Self::from_blocks(raw.iter().map(|raw| registry.hydrate(raw)).collect())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: &BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| &block.id == id)
    }

    pub fn index_of(&self, id: &BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| &block.id == id)
    }

    pub fn ids(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|block| block.id.clone()).collect()
    }

    pub fn to_raw(&self) -> Vec<RawBlock> {
        self.blocks.iter().map(RawBlock::from).collect()
    }

    pub fn to_markdown(&self, registry: &BlockRegistry) -> String {
        self.blocks
            .iter()
            .map(|block| registry.render(block))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    pub(crate) fn get_mut(&mut self, id: &BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| &block.id == id)
    }
}
