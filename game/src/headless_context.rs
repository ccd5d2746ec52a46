use voxel_streamer::{
    mesh_generation::chunk_mesh::FLOATS_PER_VERTEX, rendering::ChunkRenderContext,
    voxels::coord::ChunkPos,
};

/// Keeps chunk meshes in CPU memory, standing in for GPU buffers.
#[derive(Debug)]
pub struct CpuMesh {
    pub pos: ChunkPos,
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl CpuMesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    pub fn size_bytes(&self) -> usize {
        size_of_val(self.vertices.as_slice()) + size_of_val(self.indices.as_slice())
    }
}

#[derive(Debug, Default)]
pub struct HeadlessRenderContext {
    pub meshes_created: u64,
    pub meshes_updated: u64,
    pub meshes_freed: u64,
    pub uploaded_bytes: u64,
}

impl HeadlessRenderContext {
    pub fn live_meshes(&self) -> u64 {
        self.meshes_created - self.meshes_freed
    }
}

impl ChunkRenderContext for HeadlessRenderContext {
    type Mesh = CpuMesh;

    fn create_mesh(&mut self, pos: ChunkPos, vertices: &[f32], indices: &[u32]) -> CpuMesh {
        let mesh = CpuMesh {
            pos,
            vertices: vertices.to_vec(),
            indices: indices.to_vec(),
        };
        self.meshes_created += 1;
        self.uploaded_bytes += mesh.size_bytes() as u64;
        mesh
    }

    fn update_mesh(&mut self, mesh: &mut CpuMesh, vertices: &[f32], indices: &[u32]) {
        mesh.vertices.clear();
        mesh.vertices.extend_from_slice(vertices);
        mesh.indices.clear();
        mesh.indices.extend_from_slice(indices);
        self.meshes_updated += 1;
        self.uploaded_bytes += mesh.size_bytes() as u64;
    }

    fn free_mesh(&mut self, mesh: CpuMesh) {
        log::trace!("Freeing mesh of {:?}", mesh.pos);
        self.meshes_freed += 1;
    }
}
