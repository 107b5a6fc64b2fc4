use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration failures. Any of these aborts streamer construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unload radius {unload} is smaller than load radius {load}")]
    UnloadInsideLoad { load: i32, unload: i32 },

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
