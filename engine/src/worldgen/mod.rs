pub mod generation_pipeline;
pub mod noise_world_generator;
pub mod test_world_generators;
pub mod world_generator;
