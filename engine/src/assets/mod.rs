pub mod blocks;
pub mod texture_atlas;
