use serde::{Deserialize, Serialize};
use strata_geom::Vec3;

/// Horizontal grid position of a chunk. Chunks span the full configured height,
/// so there is no vertical component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    #[inline]
    pub fn offset(self, dx: i32, dz: i32) -> Self {
        Self {
            cx: self.cx.saturating_add(dx),
            cz: self.cz.saturating_add(dz),
        }
    }

    /// Clamps both axes to `-limit..=limit`.
    #[inline]
    pub fn clamped(self, limit: i32) -> Self {
        let limit = limit.max(0);
        Self {
            cx: self.cx.clamp(-limit, limit),
            cz: self.cz.clamp(-limit, limit),
        }
    }

    /// Largest chunk index on either axis whose voxels, and those of the
    /// chunk beyond it, still have `i32` world coordinates.
    #[inline]
    pub fn max_index(chunk_size: usize) -> i32 {
        let s = i32::try_from(chunk_size.max(1)).unwrap_or(i32::MAX);
        (i32::MAX / s - 2).max(0)
    }

    #[inline]
    pub fn distance_sq(self, other: ChunkCoord) -> i64 {
        let dx = i64::from(self.cx) - i64::from(other.cx);
        let dz = i64::from(self.cz) - i64::from(other.cz);
        dx * dx + dz * dz
    }

    /// True when `other` lies within `radius` chunks (euclidean, inclusive).
    #[inline]
    pub fn within(self, other: ChunkCoord, radius: i32) -> bool {
        self.distance_sq(other) <= i64::from(radius) * i64::from(radius)
    }

    /// Chunk containing the world-space point. Uses floor division so negative
    /// positions map to negative chunks. Points past [`ChunkCoord::max_index`]
    /// map to the outermost chunk.
    #[inline]
    pub fn containing(pos: Vec3, chunk_size: usize) -> Self {
        Self::floor_div(pos, chunk_size).clamped(Self::max_index(chunk_size))
    }

    /// Like [`ChunkCoord::containing`], but `None` past the addressable range.
    #[inline]
    pub fn try_containing(pos: Vec3, chunk_size: usize) -> Option<Self> {
        let c = Self::floor_div(pos, chunk_size);
        let limit = Self::max_index(chunk_size).unsigned_abs();
        (c.cx.unsigned_abs() <= limit && c.cz.unsigned_abs() <= limit).then_some(c)
    }

    #[inline]
    fn floor_div(pos: Vec3, chunk_size: usize) -> Self {
        let s = chunk_size as f32;
        Self {
            cx: (pos.x / s).floor() as i32,
            cz: (pos.z / s).floor() as i32,
        }
    }

    /// World-space integer origin of the chunk's minimum corner (x, z).
    /// Saturates outside [`ChunkCoord::max_index`].
    #[inline]
    pub fn base_xz(self, chunk_size: usize) -> (i32, i32) {
        let s = i32::try_from(chunk_size).unwrap_or(i32::MAX);
        (self.cx.saturating_mul(s), self.cz.saturating_mul(s))
    }

    #[inline]
    pub fn world_origin(self, chunk_size: usize, base_y: f32) -> Vec3 {
        let (bx, bz) = self.base_xz(chunk_size);
        Vec3::new(bx as f32, base_y, bz as f32)
    }

    /// Every coordinate within `radius` of `self`, nearest first; ties broken
    /// by x then z.
    pub fn disc(self, radius: i32) -> Vec<ChunkCoord> {
        if radius < 0 {
            return Vec::new();
        }
        let mut coords = Vec::new();
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                let c = self.offset(dx, dz);
                if self.within(c, radius) {
                    coords.push(c);
                }
            }
        }
        coords.sort_by_key(|c| (self.distance_sq(*c), c.cx, c.cz));
        coords
    }

    /// Number of cells `disc(radius)` yields, without allocating.
    pub fn disc_len(radius: i32) -> usize {
        if radius < 0 {
            return 0;
        }
        let r_sq = i64::from(radius) * i64::from(radius);
        let mut n = 0usize;
        for dx in -radius..=radius {
            for dz in -radius..=radius {
                if i64::from(dx) * i64::from(dx) + i64::from(dz) * i64::from(dz) <= r_sq {
                    n += 1;
                }
            }
        }
        n
    }
}

impl From<(i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl From<ChunkCoord> for (i32, i32) {
    fn from(value: ChunkCoord) -> Self {
        (value.cx, value.cz)
    }
}
