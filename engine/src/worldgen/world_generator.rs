use crate::{
    jobs::cancellation::{CancellationToken, Cancelled},
    voxels::{
        block::BlockType,
        block_grid::{BlockGrid, CHUNK_SIZE, CHUNK_VOLUME},
        coord::{ChunkPos, LocalPos, WorldPos},
    },
};

/// Deterministic terrain: the same position always yields the same block, on any thread.
///
/// A single generator is shared by every worker, so implementations hold only
/// read-only state (seeds, permutation tables).
pub trait WorldGenerator: Send + Sync + 'static {
    fn generate_block(&self, pos: WorldPos) -> BlockType;

    /// Fills a whole chunk, checking `token` once per layer.
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
            grid.blocks[index] = self.generate_block(origin + LocalPos::from_index(index));
        }

        Ok(grid)
    }
}
