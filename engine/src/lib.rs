use std::{path::Path, sync::Arc};

use crate::{
    assets::blocks::{BLOCK_DEFS_PATH, BlockRegistry},
    config::{
        config_manager::{Config, ConfigManager},
        streamer_config::StreamerConfig,
    },
};

pub mod assets;
pub mod chunk_loader;
pub mod chunk_store;
pub mod config;
pub mod game_loop;
pub mod gameplay;
pub mod jobs;
pub mod limits;
pub mod mesh_generation;
pub mod rendering;
pub mod visibility;
pub mod voxels;
pub mod world;
pub mod world_stats;
pub mod worldgen;

#[cfg(test)]
mod testing;

pub struct StreamerContext {
    pub config: ConfigManager<StreamerConfig>,
    pub registry: Arc<BlockRegistry>,
}

/// Loads the streamer config and block definitions, and sizes the worker pool.
pub fn init_streamer() -> anyhow::Result<StreamerContext> {
    let config = StreamerConfig::create_manager()?;
    init_worker_pool(config.snapshot().worker_threads);

    let defs_path = Path::new(BLOCK_DEFS_PATH);
    let registry = if defs_path.exists() {
        BlockRegistry::load_from_file(defs_path)?
    } else {
        log::info!("{} not found, using the built-in blocks", BLOCK_DEFS_PATH);
        BlockRegistry::with_default_blocks()
    };
    log::info!("Registered {} block types", registry.len());

    Ok(StreamerContext {
        config,
        registry: Arc::new(registry),
    })
}

/// Builds the global rayon pool that runs generation, meshing and the lifetime passes.
/// Only the first call has any effect.
pub fn init_worker_pool(worker_threads: Option<usize>) {
    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(|index| format!("Streamer worker {}", index));
    if let Some(threads) = worker_threads {
        builder = builder.num_threads(threads);
    }

    match builder.build_global() {
        Ok(()) => log::info!(
            "Started {} worker threads",
            rayon::current_num_threads()
        ),
        Err(err) => log::warn!("Worker pool was already initialized: {}", err),
    }
}
