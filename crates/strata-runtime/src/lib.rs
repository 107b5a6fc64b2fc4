//! Chunk streaming runtime: slot recycling, scheduling, and background build
//! workers.
#![forbid(unsafe_code)]

mod error;
mod slot;
mod streamer;
mod worker;

pub use error::BuildError;
pub use slot::{ChunkSlot, SlotState};
pub use streamer::{ChunkRender, StreamerStats, TerrainStreamer, TickReport};
pub use worker::{BuildJob, BuiltChunk, JobOut, Runtime};
