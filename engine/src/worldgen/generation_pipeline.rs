use std::sync::Arc;

use crate::{
    chunk_store::ChunkStore,
    jobs::cancellation::Cancelled,
    mesh_generation::build_manager::ChunkBuildManager,
    rendering::ChunkRenderContext,
    voxels::{
        block::BlockType,
        chunk::{Chunk, ChunkStage},
        coord::{ChunkPos, LocalPos},
    },
    worldgen::world_generator::WorldGenerator,
};

/// Creates chunks, fills them on the worker pool and tells the build manager
/// which chunks became ready to mesh.
pub struct GenerationPipeline<R: ChunkRenderContext> {
    store: Arc<ChunkStore<R::Mesh>>,
    generator: Arc<dyn WorldGenerator>,
    build_manager: Arc<ChunkBuildManager<R>>,
    chunk_markers: bool,
}

impl<R: ChunkRenderContext> GenerationPipeline<R> {
    pub fn new(
        store: Arc<ChunkStore<R::Mesh>>,
        generator: Arc<dyn WorldGenerator>,
        build_manager: Arc<ChunkBuildManager<R>>,
        chunk_markers: bool,
    ) -> Self {
        GenerationPipeline {
            store,
            generator,
            build_manager,
            chunk_markers,
        }
    }

    /// Inserts an empty chunk at `pos` and generates it in the background.
    /// Returns false if a chunk already existed there.
    pub fn generate_chunk(self: &Arc<Self>, pos: ChunkPos) -> bool {
        let Some(chunk) = self.store.insert_if_absent(pos) else {
            return false;
        };

        let pipeline = self.clone();
        rayon::spawn(move || pipeline.generate(&chunk));
        true
    }

    fn generate(&self, chunk: &Arc<Chunk<R::Mesh>>) {
        let mut grid = match self
            .generator
            .generate_chunk(chunk.pos, chunk.lifetime_token())
        {
            Ok(grid) => grid,
            Err(Cancelled) => {
                log::trace!("Generation of {:?} cancelled, chunk was unloaded", chunk.pos);
                return;
            }
        };

        if self.chunk_markers {
            grid.set(LocalPos::new(0, 0, 0), BlockType::DEBUG);
        }

        // Blocks before stage, so anyone who sees HasData also sees the grid
        chunk.set_blocks(grid);
        chunk.set_stage(ChunkStage::HasData);

        self.propagate_readiness(chunk.pos);
    }

    /// Requests a build for this chunk and each neighbor that is now ready to mesh.
    fn propagate_readiness(&self, pos: ChunkPos) {
        let candidates =
            std::iter::once(pos).chain(pos.neighbors().into_iter().map(|(_, neighbor)| neighbor));

        for candidate in candidates {
            if !self.store.is_ready_to_mesh(candidate) {
                continue;
            }

            if let Some(chunk) = self.store.get(candidate) {
                self.build_manager.request_build(&chunk, false);
            }
        }
    }
}
