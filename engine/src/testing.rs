//! Fixtures shared by the unit tests.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use crate::{
    assets::blocks::BlockRegistry,
    chunk_store::ChunkStore,
    jobs::main_thread::MainThreadScheduler,
    mesh_generation::chunk_mesh::{ChunkVertex, FLOATS_PER_VERTEX},
    rendering::ChunkRenderContext,
    voxels::{
        block::BlockType,
        block_grid::{BlockGrid, CHUNK_SIZE},
        chunk::{Chunk, ChunkStage},
        coord::{ChunkPos, LocalPos},
    },
};

pub const TIMEOUT: Duration = Duration::from_secs(10);

/// Polls `condition` until it holds or `TIMEOUT` passes.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    condition()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedMesh {
    pub pos: ChunkPos,
    pub vertex_count: usize,
    pub index_count: usize,
    pub version: u32,
}

/// Keeps a log of every mesh operation instead of touching a GPU.
#[derive(Debug, Default)]
pub struct RecordingContext {
    pub created: Vec<ChunkPos>,
    pub updated: Vec<ChunkPos>,
    pub freed: Vec<ChunkPos>,
}

impl RecordingContext {
    pub fn live_meshes(&self) -> usize {
        self.created.len() - self.freed.len()
    }
}

impl ChunkRenderContext for RecordingContext {
    type Mesh = RecordedMesh;

    fn create_mesh(&mut self, pos: ChunkPos, vertices: &[f32], indices: &[u32]) -> RecordedMesh {
        self.created.push(pos);
        RecordedMesh {
            pos,
            vertex_count: vertices.len() / FLOATS_PER_VERTEX,
            index_count: indices.len(),
            version: 0,
        }
    }

    fn update_mesh(&mut self, mesh: &mut RecordedMesh, vertices: &[f32], indices: &[u32]) {
        self.updated.push(mesh.pos);
        mesh.vertex_count = vertices.len() / FLOATS_PER_VERTEX;
        mesh.index_count = indices.len();
        mesh.version += 1;
    }

    fn free_mesh(&mut self, mesh: RecordedMesh) {
        self.freed.push(mesh.pos);
    }
}

pub fn registry() -> Arc<BlockRegistry> {
    Arc::new(BlockRegistry::with_default_blocks())
}

/// Inserts a chunk that already has data, bypassing the generator.
pub fn insert_with_grid<M: Send + 'static>(
    store: &ChunkStore<M>,
    pos: ChunkPos,
    grid: BlockGrid,
) -> Arc<Chunk<M>> {
    let chunk = store
        .insert_if_absent(pos)
        .unwrap_or_else(|| panic!("Chunk {:?} already exists", pos));
    chunk.set_blocks(grid);
    chunk.set_stage(ChunkStage::HasData);
    chunk
}

pub fn single_block_grid(pos: LocalPos, block: BlockType) -> BlockGrid {
    let mut grid = BlockGrid::new();
    grid.set(pos, block);
    grid
}

/// Runs scheduler frames until nothing is pending and `condition` holds.
pub fn pump_until<C>(
    scheduler: &MainThreadScheduler<C>,
    context: &mut C,
    mut condition: impl FnMut(&C) -> bool,
) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        scheduler.execute(context);
        if scheduler.pending() == 0 && condition(context) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

/// Each emitted quad as its bounding box, sorted, so emission order doesn't matter.
pub fn face_set(vertices: &[ChunkVertex]) -> Vec<[i32; 6]> {
    let mut faces = vertices
        .chunks_exact(4)
        .map(|quad| {
            let min = quad
                .iter()
                .map(|vertex| glam::Vec3::from(vertex.position))
                .fold(glam::Vec3::splat(CHUNK_SIZE as f32 * 4.0), glam::Vec3::min);
            let max = quad
                .iter()
                .map(|vertex| glam::Vec3::from(vertex.position))
                .fold(glam::Vec3::splat(-(CHUNK_SIZE as f32) * 4.0), glam::Vec3::max);
            let min = min.as_ivec3();
            let max = max.as_ivec3();
            [min.x, min.y, min.z, max.x, max.y, max.z]
        })
        .collect::<Vec<_>>();
    faces.sort();
    faces
}
