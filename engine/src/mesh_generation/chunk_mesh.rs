use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::{assets::blocks::MeshSink, voxels::chunk::Chunk};

pub const FLOATS_PER_VERTEX: usize = 6;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
/// A chunk mesh vertex, laid out as 6 consecutive floats.
pub struct ChunkVertex {
    /// Chunk-local, in blocks
    pub position: [f32; 3],
    pub uv: [f32; 2],
    pub brightness: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkMeshData {
    pub vertices: Vec<ChunkVertex>,
    pub indices: Vec<u32>,
}

impl ChunkMeshData {
    pub fn new() -> Self {
        Self::default()
    }

    /// The vertex buffer as the flat float array handed to the renderer.
    pub fn vertex_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn total_faces(&self) -> usize {
        self.vertices.len() / 4
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Two counter-clockwise triangles over a quad starting at `start_index`.
pub fn quad_indices(start_index: u32) -> [u32; 6] {
    [
        start_index,
        start_index + 1,
        start_index + 2,
        start_index,
        start_index + 2,
        start_index + 3,
    ]
}

impl MeshSink for ChunkMeshData {
    fn push_quad(&mut self, corners: [Vec3; 4], uvs: [Vec2; 4], brightness: f32) {
        let start_index = self.vertex_count();

        self.vertices
            .extend(corners.iter().zip(uvs.iter()).map(|(corner, uv)| ChunkVertex {
                position: corner.to_array(),
                uv: uv.to_array(),
                brightness,
            }));
        self.indices.extend(quad_indices(start_index));
    }

    fn vertex_count(&self) -> u32 {
        self.vertices.len() as u32
    }
}

/// A finished mesh build, consumed once by the upload step.
pub struct BuildResult<M: Send + 'static> {
    pub chunk: Arc<Chunk<M>>,
    pub mesh: ChunkMeshData,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_floats_layout() {
        let mesh = ChunkMeshData {
            vertices: vec![ChunkVertex {
                position: [1.0, 2.0, 3.0],
                uv: [0.25, 0.5],
                brightness: 0.7,
            }],
            indices: vec![],
        };

        assert_eq!(std::mem::size_of::<ChunkVertex>(), FLOATS_PER_VERTEX * 4);
        assert_eq!(mesh.vertex_floats(), &[1.0, 2.0, 3.0, 0.25, 0.5, 0.7]);
    }

    #[test]
    fn test_indices_follow_running_vertex_count() {
        let mut mesh = ChunkMeshData::new();
        mesh.push_quad([Vec3::ZERO; 4], [Vec2::ZERO; 4], 1.0);
        mesh.push_quad([Vec3::ONE; 4], [Vec2::ONE; 4], 0.5);

        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.total_faces(), 2);
        assert_eq!(&mesh.indices[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(mesh.vertices[4].brightness, 0.5);
    }
}
