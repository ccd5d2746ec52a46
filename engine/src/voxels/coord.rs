use std::ops::{Add, Sub};

use glam::{IVec3, U8Vec3, Vec3};

use crate::voxels::{
    block_grid::{CHUNK_SIZE, CHUNK_SIZE_LOG2},
    face::Face,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// A position of a block within a chunk
pub struct LocalPos(pub U8Vec3);

impl LocalPos {
    pub fn new(x: u8, y: u8, z: u8) -> Self {
        if x >= CHUNK_SIZE || y >= CHUNK_SIZE || z >= CHUNK_SIZE {
            panic!("LocalPos out of bounds: ({}, {}, {})", x, y, z);
        }
        LocalPos(U8Vec3 { x, y, z })
    }

    /// Inverse of [`LocalPos::to_index`]
    pub fn from_index(index: usize) -> Self {
        let size = CHUNK_SIZE as usize;
        LocalPos::new(
            (index % size) as u8,
            (index / (size * size)) as u8,
            ((index / size) % size) as u8,
        )
    }

    /// Index into a block grid. Blocks are stored in YZX order.
    pub fn to_index(&self) -> usize {
        let size = CHUNK_SIZE as usize;
        (self.0.y as usize * size * size) + (self.0.z as usize * size) + self.0.x as usize
    }

    /// The neighboring position in the same chunk, if there is one.
    pub fn offset(&self, face: Face) -> Option<LocalPos> {
        let new_pos = self.0.as_ivec3() + face.to_ivec3();

        if new_pos.cmplt(IVec3::ZERO).any() || new_pos.cmpge(IVec3::splat(CHUNK_SIZE as i32)).any()
        {
            None
        } else {
            Some(LocalPos(new_pos.as_u8vec3()))
        }
    }

    /// The neighboring position, wrapped into the adjacent chunk when it leaves this one.
    /// `(15, y, z)` stepped towards `Right` becomes `(0, y, z)`.
    pub fn wrapping_offset(&self, face: Face) -> LocalPos {
        let new_pos = (self.0.as_ivec3() + face.to_ivec3()).rem_euclid(IVec3::splat(CHUNK_SIZE as i32));
        LocalPos(new_pos.as_u8vec3())
    }

    /// True if stepping towards `face` leaves the chunk.
    pub fn is_on_boundary(&self, face: Face) -> bool {
        self.offset(face).is_none()
    }

    pub fn x(&self) -> u8 {
        self.0.x
    }

    pub fn y(&self) -> u8 {
        self.0.y
    }

    pub fn z(&self) -> u8 {
        self.0.z
    }
}

impl From<U8Vec3> for LocalPos {
    fn from(value: U8Vec3) -> Self {
        LocalPos::new(value.x, value.y, value.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Coordinates identifying a chunk in chunk space (world coordinates divided by chunk size and floored)
pub struct ChunkPos(pub IVec3);

impl ChunkPos {
    pub const ORIGIN: ChunkPos = ChunkPos(IVec3::ZERO);

    pub fn new(x: i32, y: i32, z: i32) -> Self {
        ChunkPos(IVec3 { x, y, z })
    }

    pub fn x(&self) -> i32 {
        self.0.x
    }

    pub fn y(&self) -> i32 {
        self.0.y
    }

    pub fn z(&self) -> i32 {
        self.0.z
    }

    pub fn origin(&self) -> WorldPos {
        WorldPos(self.0 << CHUNK_SIZE_LOG2)
    }

    pub fn neighbor(&self, face: Face) -> ChunkPos {
        ChunkPos(self.0 + face.to_ivec3())
    }

    pub fn neighbors(&self) -> [(Face, ChunkPos); 6] {
        Face::ALL.map(|face| (face, self.neighbor(face)))
    }
}

impl Add<IVec3> for ChunkPos {
    type Output = ChunkPos;

    fn add(self, offset: IVec3) -> ChunkPos {
        ChunkPos(self.0 + offset)
    }
}

impl Sub for ChunkPos {
    type Output = IVec3;

    fn sub(self, other: ChunkPos) -> IVec3 {
        self.0 - other.0
    }
}

/// A position of a block in world space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorldPos(pub IVec3);

impl WorldPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        WorldPos(IVec3 { x, y, z })
    }

    /// The block containing a point in world space.
    pub fn from_vec3(position: Vec3) -> Self {
        WorldPos(position.floor().as_ivec3())
    }

    pub fn to_chunk_pos(&self) -> ChunkPos {
        ChunkPos(self.0 >> CHUNK_SIZE_LOG2)
    }

    pub fn to_local_pos(&self) -> LocalPos {
        let converted_pos = self.0.rem_euclid(IVec3::splat(CHUNK_SIZE as i32));
        LocalPos(converted_pos.as_u8vec3())
    }

    pub fn from_chunk_and_local(chunk_pos: ChunkPos, local_pos: LocalPos) -> Self {
        chunk_pos.origin() + local_pos
    }

    pub fn offset(&self, face: Face) -> WorldPos {
        WorldPos(self.0 + face.to_ivec3())
    }
}

impl From<IVec3> for WorldPos {
    fn from(value: IVec3) -> Self {
        WorldPos(value)
    }
}

impl From<[i32; 3]> for WorldPos {
    fn from(value: [i32; 3]) -> Self {
        WorldPos(IVec3::from(value))
    }
}

impl Add<LocalPos> for WorldPos {
    type Output = WorldPos;

    fn add(self, other: LocalPos) -> WorldPos {
        WorldPos(self.0 + other.0.as_ivec3())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_to_chunk_and_local_negative() {
        let pos = WorldPos::new(-1, 16, -17);
        assert_eq!(pos.to_chunk_pos(), ChunkPos::new(-1, 1, -2));
        assert_eq!(pos.to_local_pos(), LocalPos::new(15, 0, 15));
        assert_eq!(
            WorldPos::from_chunk_and_local(pos.to_chunk_pos(), pos.to_local_pos()),
            pos
        );
    }

    #[test]
    fn test_from_vec3_floors() {
        assert_eq!(
            WorldPos::from_vec3(Vec3::new(-0.5, 0.5, 15.99)),
            WorldPos::new(-1, 0, 15)
        );
    }

    #[test]
    fn test_index_round_trip_and_order() {
        assert_eq!(LocalPos::new(1, 0, 0).to_index(), 1);
        assert_eq!(LocalPos::new(0, 0, 1).to_index(), 16);
        assert_eq!(LocalPos::new(0, 1, 0).to_index(), 256);

        for index in [0, 17, 300, 4095] {
            assert_eq!(LocalPos::from_index(index).to_index(), index);
        }
    }

    #[test]
    fn test_boundary_offsets() {
        let edge = LocalPos::new(15, 3, 0);
        assert_eq!(edge.offset(Face::Right), None);
        assert_eq!(edge.wrapping_offset(Face::Right), LocalPos::new(0, 3, 0));
        assert_eq!(edge.wrapping_offset(Face::Front), LocalPos::new(15, 3, 15));
        assert_eq!(edge.offset(Face::Left), Some(LocalPos::new(14, 3, 0)));
        assert!(edge.is_on_boundary(Face::Front));
        assert!(!edge.is_on_boundary(Face::Top));
    }

    #[test]
    #[should_panic]
    fn test_local_pos_out_of_range_panics() {
        LocalPos::new(16, 0, 0);
    }
}
