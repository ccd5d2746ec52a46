use std::sync::Arc;

use crossbeam::queue::SegQueue;
use serde::{Deserialize, Serialize};

use crate::{
    assets::blocks::BlockRegistry,
    chunk_store::ChunkStore,
    jobs::cancellation::{CancellationToken, Cancelled},
    mesh_generation::chunk_mesh::ChunkMeshData,
    voxels::{
        block_grid::BlockGrid,
        chunk::Chunk,
        coord::{ChunkPos, LocalPos},
        face::Face,
    },
};

/// What to do with a boundary face whose neighbor chunk isn't loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorldEdgePolicy {
    /// Treat the missing chunk as solid, the face isn't emitted
    #[default]
    HideFaces,
    /// Treat the missing chunk as air, the face is emitted
    ShowFaces,
}

/// Neighbor grids captured once per build, indexed by `Face`.
/// Only neighbors that already had data at capture time are included.
struct NeighborSnapshot {
    grids: [Option<Arc<BlockGrid>>; 6],
}

impl NeighborSnapshot {
    fn capture<M: Send + 'static>(store: &ChunkStore<M>, pos: ChunkPos) -> Self {
        NeighborSnapshot {
            grids: Face::ALL.map(|face| {
                store
                    .get_with_data(pos.neighbor(face))
                    .and_then(|neighbor| neighbor.blocks())
            }),
        }
    }

    fn get(&self, face: Face) -> Option<&BlockGrid> {
        self.grids[face as usize].as_deref()
    }
}

/// Turns a chunk's blocks into a face-culled mesh. Holds reusable scratch buffers,
/// so one builder is used by one thread at a time (see [`ChunkMeshBuilderPool`]).
#[derive(Default)]
pub struct ChunkMeshBuilder {
    scratch: ChunkMeshData,
}

impl ChunkMeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the mesh of `chunk`, checking `token` before every block.
    ///
    /// Panics if the chunk has no block grid.
    #[profiling::function]
    pub fn build<M: Send + 'static>(
        &mut self,
        chunk: &Chunk<M>,
        store: &ChunkStore<M>,
        registry: &BlockRegistry,
        edge_policy: WorldEdgePolicy,
        token: &CancellationToken,
    ) -> Result<ChunkMeshData, Cancelled> {
        let result = self.emit_faces(chunk, store, registry, edge_policy, token);

        let mesh = result.map(|()| self.scratch.clone());
        self.scratch.vertices.clear();
        self.scratch.indices.clear();
        mesh
    }

    fn emit_faces<M: Send + 'static>(
        &mut self,
        chunk: &Chunk<M>,
        store: &ChunkStore<M>,
        registry: &BlockRegistry,
        edge_policy: WorldEdgePolicy,
        token: &CancellationToken,
    ) -> Result<(), Cancelled> {
        let Some(grid) = chunk.blocks() else {
            panic!("Tried to mesh chunk {:?} which has no block data", chunk.pos);
        };

        let neighbors = NeighborSnapshot::capture(store, chunk.pos);
        let atlas = registry.atlas();

        for (index, block) in grid.blocks.iter().enumerate() {
            token.check()?;

            if block.is_air() {
                continue;
            }

            let local = LocalPos::from_index(index);
            let origin = local.0.as_vec3();
            let entry = registry.get(*block);

            if entry.params.is_dont_cull() {
                entry.model.build_mesh(origin, atlas, &mut self.scratch);
                continue;
            }

            for face in Face::ALL {
                if is_face_visible(&grid, &neighbors, local, face, registry, edge_policy) {
                    entry
                        .model
                        .build_face(face, origin, atlas, &mut self.scratch);
                }
            }
        }

        Ok(())
    }
}

fn is_face_visible(
    grid: &BlockGrid,
    neighbors: &NeighborSnapshot,
    local: LocalPos,
    face: Face,
    registry: &BlockRegistry,
    edge_policy: WorldEdgePolicy,
) -> bool {
    let adjacent = match local.offset(face) {
        Some(inner) => grid.get(inner),
        None => match neighbors.get(face) {
            Some(neighbor) => neighbor.get(local.wrapping_offset(face)),
            None => return edge_policy == WorldEdgePolicy::ShowFaces,
        },
    };

    registry.reveals_neighbors(adjacent)
}

/// Builders shared by the worker threads. A builder is taken for the duration of one
/// build and handed back afterwards, with empty scratch buffers.
#[derive(Default)]
pub struct ChunkMeshBuilderPool {
    builders: SegQueue<ChunkMeshBuilder>,
}

impl ChunkMeshBuilderPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builder<T>(&self, f: impl FnOnce(&mut ChunkMeshBuilder) -> T) -> T {
        let mut builder = self.builders.pop().unwrap_or_default();
        let result = f(&mut builder);
        self.builders.push(builder);
        result
    }

    pub fn idle_builders(&self) -> usize {
        self.builders.len()
    }
}
