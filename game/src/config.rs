use serde::{Deserialize, Serialize};
use voxel_streamer::config::config_manager::Config;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// The demo exits after rendering this many frames
    pub frames: u64,
    pub updates_per_s: u32,
    /// Viewer speed along the flight path, in blocks per second
    pub viewer_speed: f32,
    pub edit_interval_s: f32,
    /// Chunk the viewer was in when the previous run ended
    pub last_center: Option<(i32, i32, i32)>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        DemoConfig {
            frames: 600,
            updates_per_s: 60,
            viewer_speed: 24.0,
            edit_interval_s: 0.5,
            last_center: None,
        }
    }
}

impl Config for DemoConfig {
    fn get_path() -> &'static str {
        "demo.ron"
    }

    fn is_valid(&self) -> bool {
        self.updates_per_s > 0
            && self.viewer_speed.is_finite()
            && self.viewer_speed >= 0.0
            && self.edit_interval_s > 0.0
    }
}
