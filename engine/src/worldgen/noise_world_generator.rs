use noise::{NoiseFn, SuperSimplex};

use crate::{
    jobs::cancellation::{CancellationToken, Cancelled},
    voxels::{
        block::BlockType,
        block_grid::{BlockGrid, CHUNK_SIZE, CHUNK_VOLUME},
        coord::{ChunkPos, LocalPos, WorldPos},
    },
    worldgen::world_generator::WorldGenerator,
};

const FREQUENCY: f64 = 0.035;
// Below this the first pass places stone
const STONE_THRESHOLD: f64 = 0.4;
// Below this the second pass turns stone into earth
const EARTH_THRESHOLD: f64 = 0.35;

/// Two-pass 3D simplex terrain: caves carved out of stone, with pockets of earth.
pub struct NoiseWorldGenerator {
    terrain: SuperSimplex,
    soil: SuperSimplex,
}

impl NoiseWorldGenerator {
    pub fn new(seed: u32) -> Self {
        NoiseWorldGenerator {
            terrain: SuperSimplex::new(seed),
            soil: SuperSimplex::new(seed.wrapping_add(1)),
        }
    }

    // Noise remapped from [-1, 1] to [0, 1]
    fn sample(noise: &SuperSimplex, pos: WorldPos) -> f64 {
        let pos = pos.0.as_dvec3() * FREQUENCY;
        (noise.get(pos.to_array()) + 1.0) / 2.0
    }

    fn carve(&self, pos: WorldPos) -> BlockType {
        if Self::sample(&self.terrain, pos) < STONE_THRESHOLD {
            BlockType::STONE
        } else {
            BlockType::AIR
        }
    }

    fn add_soil(&self, block: BlockType, pos: WorldPos) -> BlockType {
        if block == BlockType::STONE && Self::sample(&self.soil, pos) < EARTH_THRESHOLD {
            BlockType::EARTH
        } else {
            block
        }
    }
}

impl WorldGenerator for NoiseWorldGenerator {
    fn generate_block(&self, pos: WorldPos) -> BlockType {
        self.add_soil(self.carve(pos), pos)
    }

    #[profiling::function]
    fn generate_chunk(
        &self,
        chunk_pos: ChunkPos,
        token: &CancellationToken,
    ) -> Result<BlockGrid, Cancelled> {
        let mut grid = BlockGrid::new();
        let origin = chunk_pos.origin();
        let layer = CHUNK_SIZE as usize * CHUNK_SIZE as usize;

        for index in 0..CHUNK_VOLUME {
            if index % layer == 0 {
                token.check()?;
            }
            grid.blocks[index] = self.carve(origin + LocalPos::from_index(index));
        }

        for index in 0..CHUNK_VOLUME {
            if index % layer == 0 {
                token.check()?;
            }
            let block = grid.blocks[index];
            grid.blocks[index] = self.add_soil(block, origin + LocalPos::from_index(index));
        }

        Ok(grid)
    }
}
