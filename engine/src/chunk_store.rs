use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};

use crate::voxels::{
    block::BlockType,
    chunk::{Chunk, ChunkStage},
    coord::{ChunkPos, WorldPos},
};

/// Concurrent map of every loaded chunk. Lookups, inserts and removals are safe from
/// any thread without an outer lock.
pub struct ChunkStore<M: Send + 'static> {
    chunks: DashMap<ChunkPos, Arc<Chunk<M>>, ahash::RandomState>,
}

impl<M: Send + 'static> Default for ChunkStore<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Send + 'static> ChunkStore<M> {
    pub fn new() -> Self {
        ChunkStore {
            chunks: DashMap::with_hasher(ahash::RandomState::new()),
        }
    }

    pub fn get(&self, pos: ChunkPos) -> Option<Arc<Chunk<M>>> {
        self.chunks.get(&pos).map(|chunk| chunk.value().clone())
    }

    pub fn contains(&self, pos: ChunkPos) -> bool {
        self.chunks.contains_key(&pos)
    }

    /// Inserts a fresh `NoData` chunk unless one already exists.
    /// Returns the new chunk, or `None` if the position was taken.
    pub fn insert_if_absent(&self, pos: ChunkPos) -> Option<Arc<Chunk<M>>> {
        match self.chunks.entry(pos) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                let chunk = Arc::new(Chunk::new(pos));
                vacant.insert(chunk.clone());
                Some(chunk)
            }
        }
    }

    /// Removes the chunk and cancels its lifetime token. The mesh is left for the
    /// caller to release on the main thread.
    pub fn remove(&self, pos: ChunkPos) -> Option<Arc<Chunk<M>>> {
        let (_, chunk) = self.chunks.remove(&pos)?;
        chunk.mark_removed();
        Some(chunk)
    }

    /// Removes exactly this chunk, leaving a newer chunk at the same position alone.
    pub fn remove_chunk(&self, chunk: &Arc<Chunk<M>>) -> bool {
        let removed = self
            .chunks
            .remove_if(&chunk.pos, |_, existing| Arc::ptr_eq(existing, chunk));

        match removed {
            Some((_, chunk)) => {
                chunk.mark_removed();
                true
            }
            None => false,
        }
    }

    /// A point-in-time copy of the loaded chunks. Never holds a shard lock after returning,
    /// so callers may insert or remove while walking it.
    pub fn snapshot(&self) -> Vec<Arc<Chunk<M>>> {
        self.chunks
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn positions(&self) -> Vec<ChunkPos> {
        self.chunks.iter().map(|entry| *entry.key()).collect()
    }

    /// A chunk that exists and has finished generating.
    pub fn get_with_data(&self, pos: ChunkPos) -> Option<Arc<Chunk<M>>> {
        self.get(pos).filter(|chunk| chunk.has_data())
    }

    /// `None` if the chunk isn't loaded or has no data yet.
    pub fn get_block(&self, pos: WorldPos) -> Option<BlockType> {
        let chunk = self.get_with_data(pos.to_chunk_pos())?;
        chunk.get_block(pos.to_local_pos())
    }

    /// Ready to mesh: present with data, and each neighbor either has data or is absent.
    /// An absent neighbor is outside the loaded region and isn't waited on.
    pub fn is_ready_to_mesh(&self, pos: ChunkPos) -> bool {
        let Some(chunk) = self.get(pos) else {
            return false;
        };

        if chunk.stage() == ChunkStage::NoData {
            return false;
        }

        pos.neighbors()
            .into_iter()
            .all(|(_, neighbor_pos)| match self.get(neighbor_pos) {
                Some(neighbor) => neighbor.has_data(),
                None => true,
            })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Removes every chunk and returns them.
    pub fn drain(&self) -> Vec<Arc<Chunk<M>>> {
        self.positions()
            .into_iter()
            .filter_map(|pos| self.remove(pos))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec3;

    use super::*;
    use crate::voxels::{block_grid::BlockGrid, coord::LocalPos};

    fn with_data(store: &ChunkStore<()>, pos: ChunkPos) -> Arc<Chunk<()>> {
        let chunk = store.insert_if_absent(pos).unwrap();
        chunk.set_blocks(BlockGrid::new());
        chunk.set_stage(ChunkStage::HasData);
        chunk
    }

    #[test]
    fn test_insert_if_absent_keeps_first_chunk() {
        let store = ChunkStore::<()>::new();
        let pos = ChunkPos::new(0, 1, 2);

        let first = store.insert_if_absent(pos).unwrap();
        assert!(store.insert_if_absent(pos).is_none());
        assert!(Arc::ptr_eq(&first, &store.get(pos).unwrap()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_cancels_lifetime() {
        let store = ChunkStore::<()>::new();
        let chunk = store.insert_if_absent(ChunkPos::ORIGIN).unwrap();
        assert!(!chunk.is_removed());

        let removed = store.remove(ChunkPos::ORIGIN).unwrap();
        assert!(Arc::ptr_eq(&chunk, &removed));
        assert!(chunk.is_removed());
        assert!(store.remove(ChunkPos::ORIGIN).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_chunk_ignores_replacement() {
        let store = ChunkStore::<()>::new();
        let stale = store.insert_if_absent(ChunkPos::ORIGIN).unwrap();
        store.remove(ChunkPos::ORIGIN);
        let fresh = store.insert_if_absent(ChunkPos::ORIGIN).unwrap();

        assert!(!store.remove_chunk(&stale));
        assert!(!fresh.is_removed());
        assert!(store.remove_chunk(&fresh));
        assert!(fresh.is_removed());
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_block_requires_data() {
        let store = ChunkStore::<()>::new();
        let pos = WorldPos::new(-1, 5, 17);
        assert_eq!(store.get_block(pos), None);

        let chunk = store.insert_if_absent(pos.to_chunk_pos()).unwrap();
        chunk.set_blocks(BlockGrid::filled(BlockType::STONE));
        assert_eq!(store.get_block(pos), None, "Still NoData");

        chunk.set_stage(ChunkStage::HasData);
        assert_eq!(store.get_block(pos), Some(BlockType::STONE));
        assert_eq!(
            chunk.get_block(LocalPos::new(15, 5, 1)),
            Some(BlockType::STONE)
        );
    }

    #[test]
    fn test_readiness_in_three_cubed_block_with_missing_corner() {
        let store = ChunkStore::<()>::new();
        let missing = ChunkPos::new(1, 1, 1);

        for x in -1..=1 {
            for y in -1..=1 {
                for z in -1..=1 {
                    let pos = ChunkPos::new(x, y, z);
                    if pos != missing {
                        with_data(&store, pos);
                    }
                }
            }
        }

        // Absent chunks count as ready, so every present chunk is eligible,
        // including the ones next to the missing corner
        for pos in store.positions() {
            assert!(store.is_ready_to_mesh(pos), "{:?} should be ready", pos);
        }
        assert!(!store.is_ready_to_mesh(missing));

        // A neighbor that exists but is still generating blocks readiness
        store.insert_if_absent(missing).unwrap();
        let adjacent = [
            ChunkPos::new(0, 1, 1),
            ChunkPos::new(1, 0, 1),
            ChunkPos::new(1, 1, 0),
        ];
        for pos in store.positions() {
            let expected = pos != missing && !adjacent.contains(&pos);
            assert_eq!(store.is_ready_to_mesh(pos), expected, "{:?}", pos);
        }
    }

    #[test]
    fn test_snapshot_tolerates_concurrent_removal() {
        let store = ChunkStore::<()>::new();
        for x in 0..10 {
            store.insert_if_absent(ChunkPos(IVec3::new(x, 0, 0)));
        }

        for chunk in store.snapshot() {
            store.remove(chunk.pos);
        }

        assert!(store.is_empty());
    }
}
