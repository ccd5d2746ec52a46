use glam::{IVec3, Vec3};
use thiserror::Error;

use crate::voxels::{block::BlockType, coord::WorldPos, face::Face};

#[derive(Debug, Error, PartialEq)]
pub enum RaycastError {
    #[error("Ray direction must have a non-zero length")]
    ZeroDirection,
    #[error("Ray origin, direction and max distance must be finite")]
    NonFinite,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub pos: WorldPos,
    pub block: BlockType,
    /// The face the ray entered through, `None` if the ray started inside the block
    pub face: Option<Face>,
    pub distance: f32,
}

impl RaycastHit {
    /// Where a block placed against the hit face would go.
    pub fn adjacent_pos(&self) -> Option<WorldPos> {
        self.face.map(|face| self.pos.offset(face))
    }
}

// The face crossed when stepping forward (index 0) or backward (index 1) along each axis
const ENTRY_FACES: [[Face; 2]; 3] = [
    [Face::Left, Face::Right],
    [Face::Bottom, Face::Top],
    [Face::Front, Face::Back],
];

/// Walks the blocks along a ray with a fast voxel traversal (Amanatides & Woo) and
/// returns the first non-air block within `max_distance`. Blocks for which `get_block`
/// returns `None` are treated as air.
#[profiling::function]
pub fn raycast(
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    get_block: impl Fn(WorldPos) -> Option<BlockType>,
) -> Result<Option<RaycastHit>, RaycastError> {
    // The traversal only ends past max_distance, which NaN or infinity never reach
    if !origin.is_finite() || !direction.is_finite() || !max_distance.is_finite() {
        return Err(RaycastError::NonFinite);
    }

    let direction = direction.try_normalize().ok_or(RaycastError::ZeroDirection)?;

    let mut pos = origin.floor().as_ivec3();
    let step = IVec3::new(
        step_sign(direction.x),
        step_sign(direction.y),
        step_sign(direction.z),
    );

    let mut t_delta = [f32::INFINITY; 3];
    let mut t_max = [f32::INFINITY; 3];
    for axis in 0..3 {
        let d = direction[axis];
        if d == 0.0 {
            continue;
        }

        t_delta[axis] = 1.0 / d.abs();
        let boundary = if d > 0.0 {
            pos[axis] as f32 + 1.0 - origin[axis]
        } else {
            origin[axis] - pos[axis] as f32
        };
        t_max[axis] = boundary * t_delta[axis];
    }

    let mut face = None;
    let mut distance = 0.0;

    loop {
        let world_pos = WorldPos(pos);
        if let Some(block) = get_block(world_pos).filter(|block| !block.is_air()) {
            return Ok(Some(RaycastHit {
                pos: world_pos,
                block,
                face,
                distance,
            }));
        }

        let axis = if t_max[0] < t_max[1] {
            if t_max[0] < t_max[2] { 0 } else { 2 }
        } else if t_max[1] < t_max[2] {
            1
        } else {
            2
        };

        distance = t_max[axis];
        if distance > max_distance {
            return Ok(None);
        }

        pos[axis] += step[axis];
        t_max[axis] += t_delta[axis];
        face = Some(ENTRY_FACES[axis][if step[axis] > 0 { 0 } else { 1 }]);
    }
}

fn step_sign(d: f32) -> i32 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}
