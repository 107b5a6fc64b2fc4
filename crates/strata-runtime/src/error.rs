use strata_world::ChunkCoord;
use thiserror::Error;

/// A chunk build that did not produce a mesh. The slot goes back to the pool
/// and the coordinate is eligible for admission again.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("build for chunk ({}, {}) panicked: {message}", coord.cx, coord.cz)]
    Panicked { coord: ChunkCoord, message: String },
}

impl BuildError {
    pub fn coord(&self) -> ChunkCoord {
        match self {
            BuildError::Panicked { coord, .. } => *coord,
        }
    }
}
