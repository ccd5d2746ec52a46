use std::sync::Arc;

use crate::{
    assets::blocks::BlockRegistry,
    chunk_store::ChunkStore,
    config::streamer_config::StreamerConfig,
    jobs::{
        cancellation::{CancellationToken, Cancelled},
        main_thread::{CallbackPriority, MainThreadScheduler},
    },
    mesh_generation::{
        chunk_builder::{ChunkMeshBuilderPool, WorldEdgePolicy},
        chunk_mesh::{BuildResult, ChunkMeshData},
    },
    rendering::ChunkRenderContext,
    voxels::chunk::{Chunk, ChunkMeshJob, ChunkStage},
};

type ChunkOf<R> = Chunk<<R as ChunkRenderContext>::Mesh>;

/// Decides where a chunk's mesh is built and hands finished meshes to the main thread.
pub struct ChunkBuildManager<R: ChunkRenderContext> {
    store: Arc<ChunkStore<R::Mesh>>,
    registry: Arc<BlockRegistry>,
    scheduler: Arc<MainThreadScheduler<R>>,
    builders: ChunkMeshBuilderPool,
    edge_policy: WorldEdgePolicy,
    sync_build_cost: f32,
    upload_cost: f32,
}

impl<R: ChunkRenderContext> ChunkBuildManager<R> {
    pub fn new(
        store: Arc<ChunkStore<R::Mesh>>,
        registry: Arc<BlockRegistry>,
        scheduler: Arc<MainThreadScheduler<R>>,
        config: &StreamerConfig,
    ) -> Self {
        ChunkBuildManager {
            store,
            registry,
            scheduler,
            builders: ChunkMeshBuilderPool::new(),
            edge_policy: config.world_edge,
            sync_build_cost: config.sync_build_cost,
            upload_cost: config.upload_cost,
        }
    }

    /// Rebuilds a chunk's mesh. A synchronous build runs on the main thread during the
    /// next scheduler frame and supersedes any async build of the same chunk.
    pub fn request_build(self: &Arc<Self>, chunk: &Arc<ChunkOf<R>>, synchronous: bool) {
        if chunk.stage() == ChunkStage::NoData {
            return;
        }

        if synchronous {
            let manager = self.clone();
            let chunk = chunk.clone();
            self.scheduler.schedule(
                CallbackPriority::SyncChunkBuild,
                self.sync_build_cost,
                move |context| manager.build_now(&chunk, context),
            );
        } else {
            let job: Arc<dyn ChunkMeshJob<R::Mesh>> = self.clone();
            chunk.build_job.start_cancel_previous((job, chunk.clone()));
        }
    }

    fn build_now(&self, chunk: &Arc<ChunkOf<R>>, context: &mut R) {
        // Anything the async job produced from now on is stale
        chunk.build_job.cancel_running();

        if chunk.is_removed() || chunk.stage() == ChunkStage::NoData {
            return;
        }

        match self.build(chunk, &CancellationToken::new()) {
            Ok(mesh) => upload_mesh(
                context,
                BuildResult {
                    chunk: chunk.clone(),
                    mesh,
                },
            ),
            Err(Cancelled) => log::warn!("Synchronous build of {:?} was cancelled", chunk.pos),
        }
    }

    fn build(
        &self,
        chunk: &ChunkOf<R>,
        token: &CancellationToken,
    ) -> Result<ChunkMeshData, Cancelled> {
        self.builders.with_builder(|builder| {
            builder.build(chunk, &self.store, &self.registry, self.edge_policy, token)
        })
    }
}

impl<R: ChunkRenderContext> ChunkMeshJob<R::Mesh> for ChunkBuildManager<R> {
    fn run(&self, chunk: &Arc<ChunkOf<R>>, token: &CancellationToken) {
        if chunk.stage() == ChunkStage::NoData {
            return;
        }

        let mesh = match self.build(chunk, token) {
            Ok(mesh) => mesh,
            Err(Cancelled) => {
                log::trace!("Async build of {:?} cancelled", chunk.pos);
                return;
            }
        };

        let token = token.clone();
        let result = BuildResult {
            chunk: chunk.clone(),
            mesh,
        };

        self.scheduler
            .schedule(CallbackPriority::UploadMesh, self.upload_cost, move |context| {
                // Superseded by a newer build, or the chunk was disposed
                if token.is_cancelled() {
                    log::trace!("Dropping stale mesh of {:?}", result.chunk.pos);
                    return;
                }
                upload_mesh(context, result);
            });
    }
}

/// Main thread only.
fn upload_mesh<R: ChunkRenderContext>(context: &mut R, result: BuildResult<R::Mesh>) {
    let BuildResult { chunk, mesh } = result;

    // A removed chunk's mesh would never be freed
    if chunk.is_removed() || chunk.stage() == ChunkStage::NoData {
        return;
    }

    {
        let mut slot = chunk.mesh_slot();
        match slot.as_mut() {
            Some(existing) => context.update_mesh(existing, mesh.vertex_floats(), &mesh.indices),
            None => {
                *slot = Some(context.create_mesh(chunk.pos, mesh.vertex_floats(), &mesh.indices))
            }
        }
    }

    // Mesh before stage, a reader seeing HasMesh finds a mesh unless it raced disposal
    chunk.set_stage(ChunkStage::HasMesh);
}
