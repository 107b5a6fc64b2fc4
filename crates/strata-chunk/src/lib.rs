//! Chunk voxel storage, generation, and neighbor lookup.
#![forbid(unsafe_code)]

mod neighbors;

pub use neighbors::{BoundedNeighbors, Direction, NeighborIndex, SampledNeighbors};

use strata_world::{ChunkCoord, Voxel, VoxelSampler};

/// Dense `sx * sy * sz` voxel block for one chunk, stored y-major then z then x.
#[derive(Clone, Debug)]
pub struct VoxelGrid {
    pub coord: ChunkCoord,
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    pub cells: Vec<Voxel>,
}

impl VoxelGrid {
    /// All-empty grid.
    pub fn new(coord: ChunkCoord, sx: usize, sy: usize, sz: usize) -> Self {
        Self::from_cells(coord, sx, sy, sz, Vec::new())
    }

    /// Takes ownership of `cells`, resizing to the exact length. Contents that
    /// survive the resize are kept as-is.
    pub fn from_cells(
        coord: ChunkCoord,
        sx: usize,
        sy: usize,
        sz: usize,
        cells: Vec<Voxel>,
    ) -> Self {
        let mut c = cells;
        let expect = sx * sy * sz;
        if c.len() != expect {
            c.resize(expect, Voxel::EMPTY);
        }
        VoxelGrid {
            coord,
            sx,
            sy,
            sz,
            cells: c,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.sz + z) * self.sx + x
    }

    #[inline]
    pub fn in_bounds(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.sx
            && (y as usize) < self.sy
            && (z as usize) < self.sz
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> Voxel {
        self.cells[self.idx(x, y, z)]
    }

    /// Signed local lookup; `None` outside the grid.
    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<Voxel> {
        if !self.in_bounds(x, y, z) {
            return None;
        }
        Some(self.get_local(x as usize, y as usize, z as usize))
    }

    #[inline]
    pub fn set_local(&mut self, x: usize, y: usize, z: usize, v: Voxel) {
        let i = self.idx(x, y, z);
        self.cells[i] = v;
    }

    /// World-space cell position of local `(0, 0, 0)`.
    #[inline]
    pub fn base(&self) -> (i32, i32) {
        let sx = i32::try_from(self.sx).unwrap_or(i32::MAX);
        let sz = i32::try_from(self.sz).unwrap_or(i32::MAX);
        (self.coord.cx.saturating_mul(sx), self.coord.cz.saturating_mul(sz))
    }

    #[inline]
    fn to_local(&self, wx: i32, wz: i32) -> Option<(i32, i32)> {
        let (bx, bz) = self.base();
        Some((wx.checked_sub(bx)?, wz.checked_sub(bz)?))
    }

    #[inline]
    pub fn contains_world(&self, wx: i32, wy: i32, wz: i32) -> bool {
        self.to_local(wx, wz)
            .is_some_and(|(x, z)| self.in_bounds(x, wy, z))
    }

    #[inline]
    pub fn get_world(&self, wx: i32, wy: i32, wz: i32) -> Option<Voxel> {
        let (x, z) = self.to_local(wx, wz)?;
        self.get(x, wy, z)
    }

    #[inline]
    pub fn has_solid(&self) -> bool {
        self.cells.iter().any(|v| v.is_solid())
    }

    #[inline]
    pub fn is_all_empty(&self) -> bool {
        !self.has_solid()
    }

    /// Number of solid cells.
    pub fn solid_count(&self) -> usize {
        self.cells.iter().filter(|v| v.is_solid()).count()
    }

    /// Hands back the storage so a pooled slot can reuse the allocation.
    pub fn into_cells(self) -> Vec<Voxel> {
        self.cells
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkOccupancy {
    Empty,
    Populated,
}

impl ChunkOccupancy {
    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, ChunkOccupancy::Empty)
    }

    #[inline]
    pub fn has_blocks(self) -> bool {
        matches!(self, ChunkOccupancy::Populated)
    }
}

#[derive(Clone, Debug)]
pub struct ChunkGenerateResult {
    pub grid: VoxelGrid,
    pub occupancy: ChunkOccupancy,
}

/// Samples a full `size x height x size` chunk at `coord`. `reuse` is recycled
/// storage from a pooled slot; its previous contents are overwritten.
pub fn generate_chunk(
    sampler: &VoxelSampler,
    coord: ChunkCoord,
    size: usize,
    height: usize,
    reuse: Vec<Voxel>,
) -> ChunkGenerateResult {
    assert!(size > 0, "chunk size must be > 0");
    assert!(height > 0, "chunk height must be > 0");
    let mut grid = VoxelGrid::from_cells(coord, size, height, size, reuse);
    let (base_x, base_z) = grid.base();
    let mut column = vec![Voxel::EMPTY; height];
    let mut has_blocks = false;
    for z in 0..size {
        for x in 0..size {
            let wx = base_x.saturating_add(x as i32);
            let wz = base_z.saturating_add(z as i32);
            sampler.fill_column(wx, wz, &mut column);
            for (y, &v) in column.iter().enumerate() {
                if v.is_solid() {
                    has_blocks = true;
                }
                grid.set_local(x, y, z, v);
            }
        }
    }
    ChunkGenerateResult {
        grid,
        occupancy: if has_blocks {
            ChunkOccupancy::Populated
        } else {
            ChunkOccupancy::Empty
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_world::Overhangs;

    fn sampler() -> VoxelSampler {
        VoxelSampler::new(7, 0.05, Overhangs::default())
    }

    #[test]
    fn generated_grid_matches_sampler_cells() {
        let s = sampler();
        let coord = ChunkCoord::new(-2, 3);
        let res = generate_chunk(&s, coord, 8, 24, Vec::new());
        let g = &res.grid;
        assert_eq!(g.len(), 8 * 24 * 8);
        let (bx, bz) = g.base();
        for z in 0..8 {
            for y in 0..24 {
                for x in 0..8 {
                    let expect = s.cell_at(bx + x as i32, y as i32, bz + z as i32, 24);
                    assert_eq!(g.get_local(x, y, z), expect);
                }
            }
        }
        assert_eq!(res.occupancy.has_blocks(), g.has_solid());
    }

    #[test]
    fn reused_storage_is_fully_overwritten() {
        let s = sampler();
        let coord = ChunkCoord::new(4, 4);
        let fresh = generate_chunk(&s, coord, 6, 10, Vec::new());
        let dirty = vec![Voxel::STONE; 6 * 10 * 6 + 17];
        let reused = generate_chunk(&s, coord, 6, 10, dirty);
        assert_eq!(fresh.grid.cells, reused.grid.cells);
    }

    #[test]
    #[should_panic(expected = "chunk size must be > 0")]
    fn zero_size_is_a_contract_violation() {
        generate_chunk(&sampler(), ChunkCoord::default(), 0, 4, Vec::new());
    }

    #[test]
    #[should_panic(expected = "chunk height must be > 0")]
    fn zero_height_is_a_contract_violation() {
        generate_chunk(&sampler(), ChunkCoord::default(), 4, 0, Vec::new());
    }
}
