use std::sync::Arc;

use crossbeam::atomic::AtomicCell;

use crate::{
    chunk_store::ChunkStore,
    jobs::{
        cancellation::{CancellationToken, Cancelled},
        main_thread::{CallbackPriority, MainThreadScheduler},
        recurring_task::RecurringTask,
    },
    rendering::ChunkRenderContext,
    visibility::LoadRegion,
    voxels::coord::ChunkPos,
    worldgen::generation_pipeline::GenerationPipeline,
};

/// Loads and unloads chunks around the viewer.
///
/// The create and delete passes are independent recurring tasks. They only meet
/// through the chunk store, and a new center cancels and restarts both.
pub struct ChunkLifetimeManager<R: ChunkRenderContext> {
    region: LoadRegion,
    center: AtomicCell<Option<ChunkPos>>,
    create_pass: RecurringTask<ChunkPos>,
    delete_pass: RecurringTask<ChunkPos>,
    _context: std::marker::PhantomData<fn(&mut R)>,
}

impl<R: ChunkRenderContext> ChunkLifetimeManager<R> {
    pub fn new(
        store: Arc<ChunkStore<R::Mesh>>,
        pipeline: Arc<GenerationPipeline<R>>,
        scheduler: Arc<MainThreadScheduler<R>>,
        region: LoadRegion,
        delete_cost: f32,
    ) -> Self {
        let create_region = region.clone();
        let create_pass = RecurringTask::new(
            "chunk create pass",
            move |token: &CancellationToken, center: ChunkPos| {
                match run_create_pass(&pipeline, &create_region, center, token) {
                    Ok(created) => log::debug!("Created {} chunks around {:?}", created, center),
                    Err(Cancelled) => log::trace!("Create pass around {:?} superseded", center),
                }
            },
        );

        let delete_region = region.clone();
        let delete_pass = RecurringTask::new(
            "chunk delete pass",
            move |token: &CancellationToken, center: ChunkPos| {
                match run_delete_pass(
                    &store,
                    &scheduler,
                    &delete_region,
                    center,
                    delete_cost,
                    token,
                ) {
                    Ok(removed) => log::debug!("Unloaded {} chunks around {:?}", removed, center),
                    Err(Cancelled) => log::trace!("Delete pass around {:?} superseded", center),
                }
            },
        );

        ChunkLifetimeManager {
            region,
            center: AtomicCell::new(None),
            create_pass,
            delete_pass,
            _context: std::marker::PhantomData,
        }
    }

    pub fn region(&self) -> &LoadRegion {
        &self.region
    }

    /// The last center passed to `move_center`.
    pub fn center(&self) -> Option<ChunkPos> {
        self.center.load()
    }

    /// Restarts both passes around `center`, cancelling any pass still working on an
    /// older center.
    pub fn move_center(&self, center: ChunkPos) {
        log::debug!("Moving load center to {:?}", center);
        self.center.store(Some(center));
        self.delete_pass.start_cancel_previous(center);
        self.create_pass.start_cancel_previous(center);
    }

    pub fn cancel(&self) {
        self.create_pass.cancel_running();
        self.delete_pass.cancel_running();
    }
}

impl<R: ChunkRenderContext> Drop for ChunkLifetimeManager<R> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[profiling::function]
fn run_create_pass<R: ChunkRenderContext>(
    pipeline: &Arc<GenerationPipeline<R>>,
    region: &LoadRegion,
    center: ChunkPos,
    token: &CancellationToken,
) -> Result<usize, Cancelled> {
    let mut created = 0;

    // Nearest first, so the area around the viewer fills in before the rim
    for offset in region.offsets() {
        token.check()?;
        if pipeline.generate_chunk(center + *offset) {
            created += 1;
        }
    }

    Ok(created)
}

#[profiling::function]
fn run_delete_pass<R: ChunkRenderContext>(
    store: &ChunkStore<R::Mesh>,
    scheduler: &MainThreadScheduler<R>,
    region: &LoadRegion,
    center: ChunkPos,
    delete_cost: f32,
    token: &CancellationToken,
) -> Result<usize, Cancelled> {
    let mut removed = 0;

    for chunk in store.snapshot() {
        token.check()?;

        if region.contains(center, chunk.pos) {
            continue;
        }

        if !store.remove_chunk(&chunk) {
            log::warn!("{:?} was already removed from the store", chunk.pos);
            continue;
        }

        scheduler.schedule(CallbackPriority::DeleteMesh, delete_cost, move |context| {
            chunk.dispose(context)
        });
        removed += 1;
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{
        config::streamer_config::StreamerConfig,
        mesh_generation::build_manager::ChunkBuildManager,
        testing::{RecordingContext, pump_until, registry, wait_until},
        voxels::chunk::ChunkStage,
        worldgen::test_world_generators::FlatWorldGenerator,
    };

    type Mesh = <RecordingContext as ChunkRenderContext>::Mesh;

    struct Fixture {
        store: Arc<ChunkStore<Mesh>>,
        scheduler: Arc<MainThreadScheduler<RecordingContext>>,
        manager: ChunkLifetimeManager<RecordingContext>,
        context: RecordingContext,
    }

    fn fixture(radius: i32) -> Fixture {
        let config = StreamerConfig {
            render_distance: radius,
            ..Default::default()
        };
        let store = Arc::new(ChunkStore::new());
        let scheduler = Arc::new(MainThreadScheduler::new());
        let build_manager = Arc::new(ChunkBuildManager::new(
            store.clone(),
            registry(),
            scheduler.clone(),
            &config,
        ));
        let pipeline = Arc::new(GenerationPipeline::new(
            store.clone(),
            Arc::new(FlatWorldGenerator),
            build_manager,
            false,
        ));
        let manager = ChunkLifetimeManager::new(
            store.clone(),
            pipeline,
            scheduler.clone(),
            LoadRegion::new(radius),
            config.delete_cost,
        );

        Fixture {
            store,
            scheduler,
            manager,
            context: RecordingContext::default(),
        }
    }

    fn expected_positions(region: &LoadRegion, center: ChunkPos) -> HashSet<ChunkPos> {
        region
            .offsets()
            .iter()
            .map(|offset| center + *offset)
            .collect()
    }

    fn loaded_positions(store: &ChunkStore<Mesh>) -> HashSet<ChunkPos> {
        store.positions().into_iter().collect()
    }

    #[test]
    fn test_create_pass_fills_region() {
        let f = fixture(3);
        let center = ChunkPos::new(4, 0, -2);
        f.manager.move_center(center);

        let expected = expected_positions(f.manager.region(), center);
        assert!(wait_until(|| loaded_positions(&f.store) == expected));
        assert_eq!(f.manager.center(), Some(center));
    }

    #[test]
    fn test_moving_unloads_and_frees_meshes() {
        let mut f = fixture(2);
        f.manager.move_center(ChunkPos::ORIGIN);

        let first = expected_positions(f.manager.region(), ChunkPos::ORIGIN);
        assert!(pump_until(&f.scheduler, &mut f.context, |_| {
            loaded_positions(&f.store) == first
                && f.store
                    .snapshot()
                    .iter()
                    .all(|chunk| chunk.stage() == ChunkStage::HasMesh)
        }));
        let old_chunks = f.store.snapshot();

        // Far enough that nothing overlaps
        let center = ChunkPos::new(40, 0, 0);
        f.manager.move_center(center);

        let second = expected_positions(f.manager.region(), center);
        assert!(pump_until(&f.scheduler, &mut f.context, |context| {
            loaded_positions(&f.store) == second && context.freed.len() == first.len()
        }));

        for chunk in old_chunks {
            assert!(chunk.is_removed());
            assert!(!chunk.has_mesh());
            assert_eq!(chunk.stage(), ChunkStage::DISPOSED);
        }
    }

    #[test]
    fn test_fast_moves_load_the_latest_center() {
        let mut f = fixture(2);
        for x in 0..20 {
            f.manager.move_center(ChunkPos::new(x * 3, 0, 0));
        }

        let last = ChunkPos::new(57, 0, 0);
        let expected = expected_positions(f.manager.region(), last);
        assert!(pump_until(&f.scheduler, &mut f.context, |_| {
            expected.is_subset(&loaded_positions(&f.store))
        }));

        // Another move around the same center clears whatever older passes left behind
        std::thread::sleep(std::time::Duration::from_millis(20));
        f.manager.move_center(last);
        assert!(pump_until(&f.scheduler, &mut f.context, |_| {
            loaded_positions(&f.store) == expected
        }));
    }

    #[test]
    fn test_cancel_stops_passes() {
        let f = fixture(2);
        f.manager.move_center(ChunkPos::ORIGIN);
        f.manager.cancel();

        // Whatever got created before the cancellation stays inside the region
        std::thread::sleep(std::time::Duration::from_millis(20));
        let region = f.manager.region();
        assert!(
            f.store
                .positions()
                .iter()
                .all(|pos| region.contains(ChunkPos::ORIGIN, *pos))
        );
    }
}
