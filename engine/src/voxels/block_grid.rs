use crate::voxels::{block::BlockType, coord::LocalPos};

pub const CHUNK_SIZE: u8 = 16;
// For fast division
pub const CHUNK_SIZE_LOG2: i32 = 4;

pub const CHUNK_VOLUME: usize = (CHUNK_SIZE as usize).pow(3);

/// Dense block storage of a single chunk, in YZX order.
///
/// Grids are published to other threads through an atomic pointer swap and never
/// mutated afterwards, edits produce a modified copy.
#[derive(Clone, PartialEq, Eq)]
pub struct BlockGrid {
    pub blocks: Box<[BlockType; CHUNK_VOLUME]>,
}

impl BlockGrid {
    pub fn new() -> Self {
        BlockGrid {
            blocks: Box::new([BlockType::AIR; CHUNK_VOLUME]),
        }
    }

    pub fn filled(block: BlockType) -> Self {
        BlockGrid {
            blocks: Box::new([block; CHUNK_VOLUME]),
        }
    }

    pub fn get(&self, pos: LocalPos) -> BlockType {
        self.blocks[pos.to_index()]
    }

    pub fn set(&mut self, pos: LocalPos, block: BlockType) {
        self.blocks[pos.to_index()] = block;
    }

    /// Copy of this grid with one block replaced.
    pub fn with_block(&self, pos: LocalPos, block: BlockType) -> BlockGrid {
        let mut copy = self.clone();
        copy.set(pos, block);
        copy
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocalPos, BlockType)> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| (LocalPos::from_index(index), *block))
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(|block| block.is_air())
    }

    pub fn count_non_air(&self) -> usize {
        self.blocks.iter().filter(|block| !block.is_air()).count()
    }
}

impl Default for BlockGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BlockGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockGrid")
            .field("non_air", &self.count_non_air())
            .finish()
    }
}
