use std::sync::Arc;

use glam::Vec3;

use crate::{
    assets::blocks::BlockRegistry,
    chunk_loader::ChunkLifetimeManager,
    chunk_store::ChunkStore,
    config::streamer_config::StreamerConfig,
    gameplay::raycast::{RaycastError, RaycastHit, raycast},
    jobs::main_thread::MainThreadScheduler,
    mesh_generation::build_manager::ChunkBuildManager,
    rendering::ChunkRenderContext,
    visibility::LoadRegion,
    voxels::{
        block::BlockType,
        chunk::{Chunk, ChunkStage},
        coord::{ChunkPos, WorldPos},
        face::Face,
    },
    world_stats::WorldStatistics,
    worldgen::{generation_pipeline::GenerationPipeline, world_generator::WorldGenerator},
};

/// A streamed voxel world, and the entry point for the thread that owns the render
/// context `R`.
///
/// Chunks around the viewer are generated and meshed on the worker pool. Anything that
/// touches a mesh is queued and runs inside [`World::update`].
pub struct World<R: ChunkRenderContext> {
    registry: Arc<BlockRegistry>,
    store: Arc<ChunkStore<R::Mesh>>,
    scheduler: Arc<MainThreadScheduler<R>>,
    build_manager: Arc<ChunkBuildManager<R>>,
    lifetime: ChunkLifetimeManager<R>,
    viewer_chunk: Option<ChunkPos>,
}

impl<R: ChunkRenderContext> World<R> {
    pub fn new(
        config: &StreamerConfig,
        registry: Arc<BlockRegistry>,
        generator: Arc<dyn WorldGenerator>,
    ) -> Self {
        let store = Arc::new(ChunkStore::new());
        let scheduler = Arc::new(MainThreadScheduler::new());
        let build_manager = Arc::new(ChunkBuildManager::new(
            store.clone(),
            registry.clone(),
            scheduler.clone(),
            config,
        ));
        let pipeline = Arc::new(GenerationPipeline::new(
            store.clone(),
            generator,
            build_manager.clone(),
            config.chunk_markers,
        ));
        let lifetime = ChunkLifetimeManager::new(
            store.clone(),
            pipeline,
            scheduler.clone(),
            LoadRegion::new(config.render_distance),
            config.delete_cost,
        );

        log::info!(
            "Created world with render distance {} ({} chunks)",
            config.render_distance,
            lifetime.region().len()
        );

        World {
            registry,
            store,
            scheduler,
            build_manager,
            lifetime,
            viewer_chunk: None,
        }
    }

    pub fn registry(&self) -> &Arc<BlockRegistry> {
        &self.registry
    }

    pub fn region(&self) -> &LoadRegion {
        self.lifetime.region()
    }

    pub fn viewer_chunk(&self) -> Option<ChunkPos> {
        self.viewer_chunk
    }

    pub fn chunk(&self, pos: ChunkPos) -> Option<Arc<Chunk<R::Mesh>>> {
        self.store.get(pos)
    }

    /// Moves the load center when the viewer enters another chunk. The first call always
    /// loads. Returns true if the center moved.
    pub fn update_viewer(&mut self, position: Vec3) -> bool {
        let chunk_pos = WorldPos::from_vec3(position).to_chunk_pos();
        if self.viewer_chunk == Some(chunk_pos) {
            return false;
        }

        self.viewer_chunk = Some(chunk_pos);
        self.lifetime.move_center(chunk_pos);
        true
    }

    /// `None` if the chunk isn't loaded or still generating.
    pub fn get_block(&self, pos: WorldPos) -> Option<BlockType> {
        self.store.get_block(pos)
    }

    /// Replaces a block and rebuilds the affected meshes during the next `update`.
    /// Returns false if the chunk has no data yet or the block is unchanged.
    #[profiling::function]
    pub fn set_block(&self, pos: WorldPos, block: BlockType) -> bool {
        assert!(
            block.is_air() || self.registry.try_get(block).is_some(),
            "Block type {} is not registered",
            block.id()
        );

        let chunk_pos = pos.to_chunk_pos();
        let local_pos = pos.to_local_pos();

        let Some(chunk) = self.store.get_with_data(chunk_pos) else {
            log::debug!("Ignoring edit at {:?}, chunk {:?} is not loaded", pos, chunk_pos);
            return false;
        };

        if !chunk.replace_block(local_pos, block) {
            return false;
        }

        self.build_manager.request_build(&chunk, true);

        // A neighbor's boundary face only changes if its block there culls
        for face in Face::ALL {
            if !local_pos.is_on_boundary(face) {
                continue;
            }

            let Some(neighbor) = self.store.get_with_data(chunk_pos.neighbor(face)) else {
                continue;
            };

            let Some(neighbor_block) = neighbor.get_block(local_pos.wrapping_offset(face)) else {
                continue;
            };

            if !self.registry.reveals_neighbors(neighbor_block) {
                self.build_manager.request_build(&neighbor, true);
            }
        }

        true
    }

    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Result<Option<RaycastHit>, RaycastError> {
        raycast(origin, direction, max_distance, |pos| self.get_block(pos))
    }

    /// Runs this frame's share of main-thread work. Returns the number of callbacks run.
    #[profiling::function]
    pub fn update(&self, context: &mut R) -> usize {
        self.scheduler.execute(context)
    }

    /// Visits every meshed chunk with its world offset.
    pub fn for_each_renderable(&self, mut f: impl FnMut(ChunkPos, Vec3, &R::Mesh)) {
        for chunk in self.store.snapshot() {
            if chunk.stage() != ChunkStage::HasMesh {
                continue;
            }

            // HasMesh doesn't guarantee a mesh, disposal may have raced us
            chunk.with_mesh(|mesh| f(chunk.pos, chunk.world_offset, mesh));
        }
    }

    /// Unloads everything and frees every mesh. The next `update_viewer` loads again.
    pub fn clear(&mut self, context: &mut R) {
        self.lifetime.cancel();
        self.viewer_chunk = None;

        let chunks = self.store.drain();

        // Queued deletions own chunks that are no longer in the store
        while self.scheduler.execute(context) > 0 {}

        for chunk in &chunks {
            chunk.dispose(context);
        }

        log::info!("Cleared world, unloaded {} chunks", chunks.len());
    }

    pub fn stats(&self) -> WorldStatistics {
        let mut stats = WorldStatistics::new();
        for chunk in self.store.snapshot() {
            stats.add_chunk(chunk.stage(), chunk.blocks().is_some());
        }
        stats.pending_callbacks = self.scheduler.pending();
        stats
    }
}
