use bytesize::ByteSize;
use glam::Vec3;
use voxel_streamer::{
    config::config_manager::ConfigManager,
    game_loop::{Game, GameLoopTime},
    voxels::{block::BlockType, coord::ChunkPos},
    world::World,
};

use crate::{
    config::DemoConfig, fps_counter::FpsCounter, headless_context::HeadlessRenderContext,
    viewer::ViewerPath,
};

const STATS_INTERVAL_FRAMES: u64 = 120;
const EDIT_REACH: f32 = 64.0;

/// Flies a viewer around the world and pokes at the terrain below it.
pub struct DemoGame {
    pub world: World<HeadlessRenderContext>,
    pub context: HeadlessRenderContext,
    config: ConfigManager<DemoConfig>,
    path: ViewerPath,
    viewer_speed: f32,
    travelled: f32,
    edit_interval_s: f32,
    since_last_edit_s: f32,
    place_next: bool,
    frames: u64,
    fps_counter: FpsCounter,
}

impl DemoGame {
    pub fn new(world: World<HeadlessRenderContext>, config: ConfigManager<DemoConfig>) -> Self {
        let settings = config.snapshot();
        let start_chunk = settings
            .last_center
            .map(|(x, y, z)| ChunkPos::new(x, y, z))
            .unwrap_or(ChunkPos::ORIGIN);

        // High enough to look down at the terrain
        let center = start_chunk.origin().0.as_vec3() + Vec3::new(8.0, 24.0, 8.0);

        DemoGame {
            world,
            context: HeadlessRenderContext::default(),
            config,
            path: ViewerPath::square(center, 96.0),
            viewer_speed: settings.viewer_speed,
            travelled: 0.0,
            edit_interval_s: settings.edit_interval_s,
            since_last_edit_s: 0.0,
            place_next: true,
            frames: 0,
            fps_counter: FpsCounter::new(),
        }
    }

    pub fn viewer_position(&self) -> Vec3 {
        self.path.position_at(self.travelled)
    }

    fn edit_below_viewer(&mut self) {
        let origin = self.viewer_position();
        let hit = match self.world.raycast(origin, Vec3::NEG_Y, EDIT_REACH) {
            Ok(Some(hit)) => hit,
            Ok(None) => return,
            Err(err) => {
                log::error!("Raycast from {:?} failed: {}", origin, err);
                return;
            }
        };

        let (pos, block) = match hit.adjacent_pos() {
            Some(above) if self.place_next => (above, BlockType::WOOD),
            _ => (hit.pos, BlockType::AIR),
        };

        if self.world.set_block(pos, block) {
            log::debug!("Set {:?} to {:?}", pos, block);
            self.place_next = !self.place_next;
        }
    }

    fn log_stats(&self) {
        let stats = self.world.stats();
        let mut draw_calls = 0;
        let mut mesh_bytes = 0;
        self.world.for_each_renderable(|_, _, mesh| {
            draw_calls += 1;
            mesh_bytes += mesh.size_bytes();
        });

        log::info!("Frame {}: {}", self.frames, self.fps_counter.summary());
        log::info!("World: {}", stats);
        log::info!(
            "Renderer: {} draw calls, {} in meshes, {} live meshes, {} uploaded",
            draw_calls,
            ByteSize(mesh_bytes as u64),
            self.context.live_meshes(),
            ByteSize(self.context.uploaded_bytes)
        );
    }

    /// Unloads the world and frees every mesh.
    pub fn shutdown(&mut self) {
        self.log_stats();
        self.world.clear(&mut self.context);
        log::info!(
            "Shut down with {} live meshes ({} created, {} freed)",
            self.context.live_meshes(),
            self.context.meshes_created,
            self.context.meshes_freed
        );
    }
}

impl Game for DemoGame {
    #[profiling::function]
    fn update(&mut self, time: &GameLoopTime) -> anyhow::Result<()> {
        let delta_time_s = time.delta_time_s as f32;
        self.travelled += self.viewer_speed * delta_time_s;

        if self.world.update_viewer(self.viewer_position()) {
            if let Some(center) = self.world.viewer_chunk() {
                log::debug!("Viewer entered {:?}", center);
                self.config.update_and_save(|config| {
                    config.last_center = Some((center.x(), center.y(), center.z()));
                });
            }
        }

        self.since_last_edit_s += delta_time_s;
        if self.since_last_edit_s >= self.edit_interval_s {
            self.since_last_edit_s = 0.0;
            self.edit_below_viewer();
        }

        Ok(())
    }

    #[profiling::function]
    fn render(&mut self, _time: &GameLoopTime) -> anyhow::Result<()> {
        self.world.update(&mut self.context);
        self.fps_counter.tick();
        self.frames += 1;

        if self.frames % STATS_INTERVAL_FRAMES == 0 {
            self.log_stats();
        }

        profiling::finish_frame!();
        Ok(())
    }
}
