use serde::{Deserialize, Serialize};

use crate::{
    config::config_manager::Config,
    limits::{DEFAULT_RENDER_DISTANCE, DEFAULT_SEED, DELETE_COST, SYNC_BUILD_COST, UPLOAD_COST},
    mesh_generation::chunk_builder::WorldEdgePolicy,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamerConfig {
    /// Radius of the loaded cylinder, in chunks. Its half-height is half of this.
    pub render_distance: i32,
    pub seed: u32,
    /// Size of the global worker pool, `None` lets rayon decide
    pub worker_threads: Option<usize>,
    pub world_edge: WorldEdgePolicy,
    pub sync_build_cost: f32,
    pub upload_cost: f32,
    pub delete_cost: f32,
    /// Stamps a debug block at the origin of every generated chunk
    pub chunk_markers: bool,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        StreamerConfig {
            render_distance: DEFAULT_RENDER_DISTANCE,
            seed: DEFAULT_SEED,
            worker_threads: None,
            world_edge: WorldEdgePolicy::default(),
            sync_build_cost: SYNC_BUILD_COST,
            upload_cost: UPLOAD_COST,
            delete_cost: DELETE_COST,
            chunk_markers: false,
        }
    }
}

impl Config for StreamerConfig {
    fn get_path() -> &'static str {
        "streamer.ron"
    }

    fn is_valid(&self) -> bool {
        let cost_range = 0.0..=1.0;

        self.render_distance > 0
            && self.worker_threads != Some(0)
            && cost_range.contains(&self.sync_build_cost)
            && cost_range.contains(&self.upload_cost)
            && cost_range.contains(&self.delete_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(StreamerConfig::default().is_valid());
    }

    #[test]
    fn test_invalid_values() {
        let invalid = [
            StreamerConfig {
                render_distance: 0,
                ..Default::default()
            },
            StreamerConfig {
                worker_threads: Some(0),
                ..Default::default()
            },
            StreamerConfig {
                upload_cost: 1.5,
                ..Default::default()
            },
            StreamerConfig {
                delete_cost: f32::NAN,
                ..Default::default()
            },
        ];

        for config in invalid {
            assert!(!config.is_valid(), "{:?} should be invalid", config);
        }
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: StreamerConfig = ron::from_str("(render_distance: 3, world_edge: ShowFaces)").unwrap();
        assert_eq!(config.render_distance, 3);
        assert_eq!(config.world_edge, WorldEdgePolicy::ShowFaces);
        assert_eq!(config.seed, DEFAULT_SEED);
    }
}
