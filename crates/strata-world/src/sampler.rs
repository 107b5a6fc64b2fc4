use fastnoise_lite::{FastNoiseLite, NoiseType};

use crate::config::{Overhangs, TerrainConfig};
use crate::hash::{hash3, unit};
use crate::Voxel;

const DIRT_DEPTH: i32 = 3;

/// Deterministic heightfield generator. Holds no mutable state, so one instance
/// is shared by every worker and any cell can be re-sampled independently of
/// generation order.
pub struct VoxelSampler {
    noise: FastNoiseLite,
    seed: i32,
    overhangs: Overhangs,
}

impl VoxelSampler {
    pub fn new(seed: i32, noise_scale: f32, overhangs: Overhangs) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::Perlin));
        noise.set_frequency(Some(noise_scale));
        Self {
            noise,
            seed,
            overhangs,
        }
    }

    pub fn from_config(cfg: &TerrainConfig) -> Self {
        Self::new(cfg.seed, cfg.noise_scale, cfg.overhangs.clone())
    }

    #[inline]
    pub fn seed(&self) -> i32 {
        self.seed
    }

    /// Surface height of the column at world `(wx, wz)`, in `[0, height]`.
    /// Cells below it are solid.
    #[inline]
    pub fn surface_height(&self, wx: i32, wz: i32, height: usize) -> i32 {
        let n = self.noise.get_noise_2d(wx as f32, wz as f32);
        let t = ((n + 1.0) * 0.5).clamp(0.0, 1.0);
        let h = (t * height as f32).round() as i32;
        h.clamp(0, height as i32)
    }

    /// Writes one full column (`column.len()` cells, bottom first).
    pub fn fill_column(&self, wx: i32, wz: i32, column: &mut [Voxel]) {
        assert!(!column.is_empty(), "column height must be > 0");
        let h = self.surface_height(wx, wz, column.len());
        for (y, cell) in column.iter_mut().enumerate() {
            *cell = self.classify(wx, y as i32, wz, h);
        }
    }

    /// Value of a single world cell for a world of `height` cells.
    pub fn cell_at(&self, wx: i32, wy: i32, wz: i32, height: usize) -> Voxel {
        if wy < 0 || wy >= height as i32 {
            return Voxel::EMPTY;
        }
        let h = self.surface_height(wx, wz, height);
        self.classify(wx, wy, wz, h)
    }

    #[inline]
    fn classify(&self, wx: i32, wy: i32, wz: i32, surface: i32) -> Voxel {
        if wy < surface {
            return if wy == surface - 1 {
                Voxel::GRASS
            } else if wy >= surface - 1 - DIRT_DEPTH {
                Voxel::DIRT
            } else {
                Voxel::STONE
            };
        }
        if self.overhangs.enable && self.overhangs.depth > 0 {
            let above = (wy - surface) as u32;
            if above < self.overhangs.depth {
                let fade = 1.0 - above as f32 / self.overhangs.depth as f32;
                let p = self.overhangs.probability * fade;
                if unit(hash3(self.seed as u32, wx, wy, wz)) < p {
                    return Voxel::DIRT;
                }
            }
        }
        Voxel::EMPTY
    }
}
