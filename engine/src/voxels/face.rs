use glam::{IVec3, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Face {
    /// Y+
    #[default]
    Top = 0,
    /// Y-
    Bottom,
    /// X-
    Left,
    /// X+
    Right,
    /// Z-
    Front,
    /// Z+
    Back,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Top,
        Face::Bottom,
        Face::Left,
        Face::Right,
        Face::Front,
        Face::Back,
    ];

    pub fn to_ivec3(&self) -> IVec3 {
        match self {
            Face::Top => IVec3::Y,
            Face::Bottom => -IVec3::Y,
            Face::Left => -IVec3::X,
            Face::Right => IVec3::X,
            Face::Front => -IVec3::Z,
            Face::Back => IVec3::Z,
        }
    }

    pub fn opposite(self) -> Face {
        match self {
            Face::Top => Face::Bottom,
            Face::Bottom => Face::Top,
            Face::Left => Face::Right,
            Face::Right => Face::Left,
            Face::Front => Face::Back,
            Face::Back => Face::Front,
        }
    }

    /// Corners of this face on a unit cube, counter-clockwise when seen from outside.
    pub fn corners(self) -> [Vec3; 4] {
        match self {
            Face::Top => [
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(1.0, 1.0, 0.0),
            ],
            Face::Bottom => [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            Face::Left => [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            Face::Right => [
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(1.0, 0.0, 1.0),
            ],
            Face::Front => [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
            ],
            Face::Back => [
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
            ],
        }
    }

    /// Flat directional shading
    pub fn brightness(self) -> f32 {
        match self {
            Face::Top => 1.0,
            Face::Right => 0.85,
            Face::Back => 0.75,
            Face::Bottom | Face::Left | Face::Front => 0.7,
        }
    }
}
