use serde::{Deserialize, Serialize};

/// A block type id. Zero is air, every other id must be registered in the block registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockType(pub u8);

impl BlockType {
    pub const AIR: BlockType = BlockType(0);
    pub const STONE: BlockType = BlockType(1);
    pub const EARTH: BlockType = BlockType(2);
    pub const WOOD: BlockType = BlockType(3);
    pub const DEBUG: BlockType = BlockType(4);
    pub const GLASS: BlockType = BlockType(5);

    pub const fn is_air(self) -> bool {
        self.0 == 0
    }

    pub const fn id(self) -> u8 {
        self.0
    }
}
