use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::{ChunkCoord, ConfigError};

/// Mesh extraction strategy, chosen once at startup.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MesherKind {
    #[default]
    FaceCull,
    MarchingCubes,
}

/// How neighbor lookups behave past the edge of a chunk's own grid.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeamPolicy {
    /// Out-of-grid neighbors read as empty; seam faces are always emitted.
    #[default]
    Isolated,
    /// Out-of-grid horizontal neighbors are re-sampled from the generator.
    Sampled,
}

/// Deterministic thinning above the surface that leaves floating fragments.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Overhangs {
    #[serde(default)]
    pub enable: bool,
    /// Chance that the cell directly above the surface is solid; fades to 0
    /// at `depth` cells up.
    #[serde(default = "default_overhang_probability")]
    pub probability: f32,
    #[serde(default = "default_overhang_depth")]
    pub depth: u32,
}

fn default_overhang_probability() -> f32 {
    0.35
}
fn default_overhang_depth() -> u32 {
    3
}

impl Default for Overhangs {
    fn default() -> Self {
        Self {
            enable: false,
            probability: default_overhang_probability(),
            depth: default_overhang_depth(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TerrainConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_height")]
    pub chunk_height: usize,
    #[serde(default = "default_load_radius")]
    pub load_radius: i32,
    #[serde(default = "default_unload_radius")]
    pub unload_radius: i32,
    #[serde(default = "default_max_parallel_loads")]
    pub max_parallel_loads: usize,
    #[serde(default = "default_noise_scale")]
    pub noise_scale: f32,
    #[serde(default = "default_seed")]
    pub seed: i32,
    #[serde(default)]
    pub base_y: f32,
    #[serde(default)]
    pub mesher: MesherKind,
    #[serde(default)]
    pub iso_level: f32,
    #[serde(default)]
    pub seams: SeamPolicy,
    #[serde(default)]
    pub overhangs: Overhangs,
    /// Fixed cache-pool size; derived from `unload_radius` when absent.
    #[serde(default)]
    pub pool_capacity: Option<usize>,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

fn default_chunk_size() -> usize {
    16
}
fn default_chunk_height() -> usize {
    64
}
fn default_load_radius() -> i32 {
    6
}
fn default_unload_radius() -> i32 {
    8
}
fn default_max_parallel_loads() -> usize {
    4
}
fn default_noise_scale() -> f32 {
    0.05
}
fn default_seed() -> i32 {
    1337
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_height: default_chunk_height(),
            load_radius: default_load_radius(),
            unload_radius: default_unload_radius(),
            max_parallel_loads: default_max_parallel_loads(),
            noise_scale: default_noise_scale(),
            seed: default_seed(),
            base_y: 0.0,
            mesher: MesherKind::default(),
            iso_level: 0.0,
            seams: SeamPolicy::default(),
            overhangs: Overhangs::default(),
            pool_capacity: None,
            worker_threads: None,
        }
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl TerrainConfig {
    /// Checks every startup constraint; the first violation is returned.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(invalid("chunk_size", "must be > 0"));
        }
        if self.chunk_height == 0 {
            return Err(invalid("chunk_height", "must be > 0"));
        }
        if self.chunk_height > usize::from(u16::MAX) {
            return Err(invalid("chunk_height", "must fit in 16 bits"));
        }
        if self.load_radius <= 0 {
            return Err(invalid("load_radius", "must be > 0"));
        }
        if self.unload_radius < self.load_radius {
            return Err(ConfigError::UnloadInsideLoad {
                load: self.load_radius,
                unload: self.unload_radius,
            });
        }
        if self.max_parallel_loads == 0 {
            return Err(invalid("max_parallel_loads", "must be > 0"));
        }
        if !(self.noise_scale > 0.0 && self.noise_scale <= 1.0) {
            return Err(invalid(
                "noise_scale",
                format!("{} is outside (0, 1]", self.noise_scale),
            ));
        }
        if !self.iso_level.is_finite() {
            return Err(invalid("iso_level", "must be finite"));
        }
        if !self.base_y.is_finite() {
            return Err(invalid("base_y", "must be finite"));
        }
        if self.overhangs.enable && !(0.0..=1.0).contains(&self.overhangs.probability) {
            return Err(invalid("overhangs.probability", "must be within [0, 1]"));
        }
        if self.pool_capacity == Some(0) {
            return Err(invalid("pool_capacity", "must be > 0 when set"));
        }
        if self.worker_threads == Some(0) {
            return Err(invalid("worker_threads", "must be > 0 when set"));
        }
        Ok(())
    }

    /// Total number of chunk slots created at startup.
    pub fn slot_capacity(&self) -> usize {
        self.pool_capacity
            .unwrap_or_else(|| ChunkCoord::disc_len(self.unload_radius))
    }

    /// Background thread count for build jobs.
    pub fn worker_count(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4);
            self.max_parallel_loads.min(cores).max(1)
        })
    }

    #[inline]
    pub fn cells_per_chunk(&self) -> usize {
        self.chunk_size * self.chunk_height * self.chunk_size
    }
}

/// Reads and validates a TOML terrain config.
pub fn load_config_from_path(path: &Path) -> Result<TerrainConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: TerrainConfig = toml::from_str(&s).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = TerrainConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.slot_capacity() >= ChunkCoord::disc_len(cfg.load_radius));
    }

    #[test]
    fn unload_inside_load_is_rejected() {
        let cfg = TerrainConfig {
            load_radius: 6,
            unload_radius: 3,
            ..TerrainConfig::default()
        };
        match cfg.validate() {
            Err(ConfigError::UnloadInsideLoad { load, unload }) => {
                assert_eq!((load, unload), (6, 3));
            }
            other => panic!("expected UnloadInsideLoad, got {other:?}"),
        }
    }

    #[test]
    fn equal_radii_are_accepted() {
        let cfg = TerrainConfig {
            load_radius: 4,
            unload_radius: 4,
            ..TerrainConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_sizes_and_bad_scale_are_rejected() {
        let bad = [
            TerrainConfig {
                chunk_size: 0,
                ..TerrainConfig::default()
            },
            TerrainConfig {
                chunk_height: 0,
                ..TerrainConfig::default()
            },
            TerrainConfig {
                max_parallel_loads: 0,
                ..TerrainConfig::default()
            },
            TerrainConfig {
                noise_scale: 0.0,
                ..TerrainConfig::default()
            },
            TerrainConfig {
                noise_scale: 1.5,
                ..TerrainConfig::default()
            },
            TerrainConfig {
                pool_capacity: Some(0),
                ..TerrainConfig::default()
            },
        ];
        for cfg in bad {
            assert!(
                matches!(cfg.validate(), Err(ConfigError::Invalid { .. })),
                "{cfg:?} should be invalid"
            );
        }
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: TerrainConfig = toml::from_str(
            r#"
chunk_size = 8
mesher = "marching_cubes"
seams = "sampled"

[overhangs]
enable = true
"#,
        )
        .unwrap();
        assert_eq!(cfg.chunk_size, 8);
        assert_eq!(cfg.chunk_height, 64);
        assert_eq!(cfg.mesher, MesherKind::MarchingCubes);
        assert_eq!(cfg.seams, SeamPolicy::Sampled);
        assert!(cfg.overhangs.enable);
        assert_eq!(cfg.overhangs.depth, 3);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn explicit_pool_capacity_wins() {
        let cfg = TerrainConfig {
            pool_capacity: Some(12),
            ..TerrainConfig::default()
        };
        assert_eq!(cfg.slot_capacity(), 12);
    }
}
