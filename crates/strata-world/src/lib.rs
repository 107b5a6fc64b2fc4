//! World sizing, terrain configuration, and deterministic voxel sampling.
#![forbid(unsafe_code)]

mod chunk_coord;
pub mod config;
mod error;
pub mod hash;
mod sampler;
mod voxel;

pub use chunk_coord::ChunkCoord;
pub use config::{MesherKind, Overhangs, SeamPolicy, TerrainConfig, load_config_from_path};
pub use error::ConfigError;
pub use sampler::VoxelSampler;
pub use voxel::Voxel;
