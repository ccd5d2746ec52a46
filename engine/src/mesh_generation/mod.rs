pub mod build_manager;
pub mod chunk_builder;
pub mod chunk_mesh;
