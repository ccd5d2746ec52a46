use std::fmt;

use crate::voxels::{block::BlockType, block_grid::CHUNK_VOLUME, chunk::ChunkStage};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunksByStage([usize; ChunkStage::TOTAL_STAGES]);

impl ChunksByStage {
    pub fn increment(&mut self, stage: ChunkStage) {
        self.0[stage as usize] += 1;
    }

    pub fn get(&self, stage: ChunkStage) -> usize {
        self.0[stage as usize]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorldStatistics {
    pub total_chunks: usize,
    pub chunks_by_stage: ChunksByStage,
    pub pending_callbacks: usize,
    /// Block grids only, meshes live on the renderer side
    pub approximate_memory_usage_bytes: usize,
}

impl WorldStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_chunk(&mut self, stage: ChunkStage, has_blocks: bool) {
        self.total_chunks += 1;
        self.chunks_by_stage.increment(stage);
        if has_blocks {
            self.approximate_memory_usage_bytes += CHUNK_VOLUME * size_of::<BlockType>();
        }
    }
}

impl fmt::Display for WorldStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} chunks ({} generating, {} with data, {} meshed), {} callbacks pending, {:.1} MiB of blocks",
            self.total_chunks,
            self.chunks_by_stage.get(ChunkStage::NoData),
            self.chunks_by_stage.get(ChunkStage::HasData),
            self.chunks_by_stage.get(ChunkStage::HasMesh),
            self.pending_callbacks,
            self.approximate_memory_usage_bytes as f64 / (1024.0 * 1024.0),
        )
    }
}
