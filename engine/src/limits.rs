// Radius of the loaded cylinder around the viewer, in chunks.
// The cylinder's half-height is half of this.
pub const DEFAULT_RENDER_DISTANCE: i32 = 6;

pub const DEFAULT_SEED: u32 = 69420;

// Frame budget costs of the main-thread callbacks, out of 1.0 per frame
pub const SYNC_BUILD_COST: f32 = 0.25;
pub const UPLOAD_COST: f32 = 0.125;
pub const DELETE_COST: f32 = 0.0625;
