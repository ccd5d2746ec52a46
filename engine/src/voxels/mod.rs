pub mod block;
pub mod block_grid;
pub mod chunk;
pub mod coord;
pub mod face;
