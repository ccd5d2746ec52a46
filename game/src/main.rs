use std::{sync::Arc, time::Duration};

use voxel_streamer::{
    config::config_manager::{Config, ConfigManager},
    game_loop::{GameLoop, GameLoopConfig, GameLoopResult},
    init_streamer,
    world::World,
    worldgen::noise_world_generator::NoiseWorldGenerator,
};

use crate::{config::DemoConfig, demo_game::DemoGame};

mod config;
mod demo_game;
mod fps_counter;
mod headless_context;
mod viewer;

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init_timed();
    log::info!("Starting streamer demo...");

    let context = init_streamer()?;
    let streamer_config = context.config.snapshot();

    let demo_config = DemoConfig::create_manager().unwrap_or_else(|err| {
        log::error!("{:#}, using defaults", err);
        ConfigManager::new(DemoConfig::get_path().into())
    });
    let settings = demo_config.snapshot();

    let world = World::new(
        &streamer_config,
        context.registry.clone(),
        Arc::new(NoiseWorldGenerator::new(streamer_config.seed)),
    );

    let mut game_loop = GameLoop::new(
        DemoGame::new(world, demo_config),
        GameLoopConfig {
            updates_per_s: settings.updates_per_s,
            ..Default::default()
        },
    );
    let frame_time = Duration::from_secs_f64(1.0 / settings.updates_per_s as f64);

    while game_loop.number_of_frames() < settings.frames {
        if game_loop.next_frame()? == GameLoopResult::Exit {
            break;
        }
        std::thread::sleep(frame_time);
    }

    game_loop.game.shutdown();
    Ok(())
}
