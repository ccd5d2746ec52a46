use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwapOption;
use crossbeam::atomic::AtomicCell;
use glam::Vec3;

use crate::{
    jobs::{cancellation::CancellationToken, recurring_task::RecurringTask},
    rendering::ChunkRenderContext,
    voxels::{block::BlockType, block_grid::BlockGrid, coord::ChunkPos, coord::LocalPos},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ChunkStage {
    NoData = 0,
    HasData = 1,
    HasMesh = 2,
}

impl ChunkStage {
    /// A disposed chunk reads as `NoData`, so every "has data yet?" check also rejects it.
    pub const DISPOSED: ChunkStage = ChunkStage::NoData;

    pub const TOTAL_STAGES: usize = 3;

    pub const ALL: [ChunkStage; Self::TOTAL_STAGES] =
        [ChunkStage::NoData, ChunkStage::HasData, ChunkStage::HasMesh];
}

/// Builds a chunk's mesh. Implemented by the build manager, passed to the chunk's build
/// job on every start so the chunk never holds a reference back to its builder.
pub trait ChunkMeshJob<M: Send + 'static>: Send + Sync {
    fn run(&self, chunk: &Arc<Chunk<M>>, token: &CancellationToken);
}

pub type BuildJobArgs<M> = (Arc<dyn ChunkMeshJob<M>>, Arc<Chunk<M>>);

/// The unit of generation, meshing and streaming.
///
/// Field writers:
/// - `blocks`: the generator (once), then the edit path on the main thread
/// - `stage`: the generator (`HasData`), the upload step (`HasMesh`), disposal
/// - `mesh`: main thread only
///
/// The fields are individually atomic but not consistent with each other, a reader
/// that sees `HasMesh` must still handle a missing mesh.
pub struct Chunk<M: Send + 'static> {
    pub pos: ChunkPos,
    pub world_offset: Vec3,
    blocks: ArcSwapOption<BlockGrid>,
    stage: AtomicCell<ChunkStage>,
    mesh: Mutex<Option<M>>,
    pub(crate) build_job: RecurringTask<BuildJobArgs<M>>,
    // Cancelled once the chunk leaves the store
    lifetime: CancellationToken,
}

impl<M: Send + 'static> Chunk<M> {
    pub fn new(pos: ChunkPos) -> Self {
        Chunk {
            pos,
            world_offset: pos.origin().0.as_vec3(),
            blocks: ArcSwapOption::empty(),
            stage: AtomicCell::new(ChunkStage::NoData),
            mesh: Mutex::new(None),
            build_job: RecurringTask::new(
                "chunk mesh build",
                |token: &CancellationToken, (job, chunk): BuildJobArgs<M>| job.run(&chunk, token),
            ),
            lifetime: CancellationToken::new(),
        }
    }

    pub fn stage(&self) -> ChunkStage {
        self.stage.load()
    }

    pub(crate) fn set_stage(&self, stage: ChunkStage) {
        self.stage.store(stage);
    }

    pub fn has_data(&self) -> bool {
        self.stage() >= ChunkStage::HasData
    }

    /// Current block grid snapshot. Never torn: a reader gets either the old or the new grid.
    pub fn blocks(&self) -> Option<Arc<BlockGrid>> {
        self.blocks.load_full()
    }

    pub(crate) fn set_blocks(&self, grid: BlockGrid) {
        self.blocks.store(Some(Arc::new(grid)));
    }

    pub fn get_block(&self, pos: LocalPos) -> Option<BlockType> {
        self.blocks.load().as_ref().map(|grid| grid.get(pos))
    }

    /// Copy-on-write edit. Returns false if the chunk has no grid or the block is unchanged.
    pub(crate) fn replace_block(&self, pos: LocalPos, block: BlockType) -> bool {
        let mut changed = false;

        self.blocks.rcu(|current| {
            changed = false;
            match current {
                Some(grid) if grid.get(pos) != block => {
                    changed = true;
                    Some(Arc::new(grid.with_block(pos, block)))
                }
                other => other.clone(),
            }
        });

        changed
    }

    pub(crate) fn lifetime_token(&self) -> &CancellationToken {
        &self.lifetime
    }

    /// True once the chunk was removed from the store.
    pub fn is_removed(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    pub(crate) fn mark_removed(&self) {
        self.lifetime.cancel();
    }

    pub(crate) fn mesh_slot(&self) -> MutexGuard<'_, Option<M>> {
        // Only whole values are ever stored in the slot
        self.mesh.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn has_mesh(&self) -> bool {
        self.mesh_slot().is_some()
    }

    pub fn with_mesh<T>(&self, f: impl FnOnce(&M) -> T) -> Option<T> {
        self.mesh_slot().as_ref().map(f)
    }

    /// Main thread only. Stops any build and releases the mesh.
    pub fn dispose<R>(&self, context: &mut R)
    where
        R: ChunkRenderContext<Mesh = M>,
    {
        self.set_stage(ChunkStage::DISPOSED);
        self.build_job.cancel_running();

        if let Some(mesh) = self.mesh_slot().take() {
            context.free_mesh(mesh);
        }
    }
}

impl<M: Send + 'static> std::fmt::Debug for Chunk<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("pos", &self.pos)
            .field("stage", &self.stage())
            .field("removed", &self.is_removed())
            .finish()
    }
}
