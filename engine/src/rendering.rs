use crate::voxels::coord::ChunkPos;

/// The renderer side of chunk meshes. Every method is called on the main thread only,
/// from callbacks run by the main-thread scheduler.
///
/// Vertex data is a flat list of [`ChunkVertex`](crate::mesh_generation::chunk_mesh::ChunkVertex)
/// values: position (3), texture UV (2), brightness (1).
pub trait ChunkRenderContext: 'static {
    type Mesh: Send + 'static;

    fn create_mesh(&mut self, pos: ChunkPos, vertices: &[f32], indices: &[u32]) -> Self::Mesh;

    /// Replaces the contents of an existing mesh.
    fn update_mesh(&mut self, mesh: &mut Self::Mesh, vertices: &[f32], indices: &[u32]);

    fn free_mesh(&mut self, mesh: Self::Mesh);
}
