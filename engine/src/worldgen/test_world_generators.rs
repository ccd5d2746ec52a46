use crate::{
    voxels::{block::BlockType, coord::WorldPos},
    worldgen::world_generator::WorldGenerator,
};

/// Stone below world y = 0, air above.
pub struct FlatWorldGenerator;

impl WorldGenerator for FlatWorldGenerator {
    fn generate_block(&self, pos: WorldPos) -> BlockType {
        if pos.0.y < 0 {
            BlockType::STONE
        } else {
            BlockType::AIR
        }
    }
}

/// Every other block filled, the worst case for face culling.
pub struct TortureTestWorldGenerator;

impl WorldGenerator for TortureTestWorldGenerator {
    fn generate_block(&self, pos: WorldPos) -> BlockType {
        if (pos.0.x + pos.0.y + pos.0.z).rem_euclid(2) == 0 {
            BlockType::STONE
        } else {
            BlockType::AIR
        }
    }
}
