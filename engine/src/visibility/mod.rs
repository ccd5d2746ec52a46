use std::sync::Arc;

use glam::IVec3;

use crate::voxels::coord::ChunkPos;

/// The cylinder of chunks kept loaded around the viewer: horizontal radius `R`
/// (exclusive), vertical half-height `R / 2` (inclusive).
#[derive(Debug, Clone)]
pub struct LoadRegion {
    radius: i32,
    // Every offset inside the cylinder, nearest first
    offsets: Arc<[IVec3]>,
}

impl LoadRegion {
    pub fn new(radius: i32) -> Self {
        assert!(radius > 0, "Load radius must be positive, got {}", radius);

        let half_height = radius / 2;
        let mut offsets = Vec::new();

        for x in -radius..=radius {
            for y in -half_height..=half_height {
                for z in -radius..=radius {
                    let offset = IVec3::new(x, y, z);
                    if cylinder_contains(radius, offset) {
                        offsets.push(offset);
                    }
                }
            }
        }

        offsets.sort_by_key(|offset| offset.length_squared());

        LoadRegion {
            radius,
            offsets: offsets.into(),
        }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn half_height(&self) -> i32 {
        self.radius / 2
    }

    pub fn contains_offset(&self, offset: IVec3) -> bool {
        cylinder_contains(self.radius, offset)
    }

    pub fn contains(&self, center: ChunkPos, pos: ChunkPos) -> bool {
        self.contains_offset(pos - center)
    }

    pub fn offsets(&self) -> &[IVec3] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

pub fn cylinder_contains(radius: i32, offset: IVec3) -> bool {
    offset.y.abs() <= radius / 2 && offset.x * offset.x + offset.z * offset.z < radius * radius
}
