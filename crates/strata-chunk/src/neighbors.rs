use strata_world::{Voxel, VoxelSampler};

use crate::VoxelGrid;

/// The six axis directions, in face-table order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    PosZ,
    PosX,
    NegZ,
    NegX,
    PosY,
    NegY,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::PosZ,
        Direction::PosX,
        Direction::NegZ,
        Direction::NegX,
        Direction::PosY,
        Direction::NegY,
    ];

    #[inline]
    pub const fn delta(self) -> (i32, i32, i32) {
        match self {
            Direction::PosZ => (0, 0, 1),
            Direction::PosX => (1, 0, 0),
            Direction::NegZ => (0, 0, -1),
            Direction::NegX => (-1, 0, 0),
            Direction::PosY => (0, 1, 0),
            Direction::NegY => (0, -1, 0),
        }
    }

    #[inline]
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::PosZ => Direction::NegZ,
            Direction::PosX => Direction::NegX,
            Direction::NegZ => Direction::PosZ,
            Direction::NegX => Direction::PosX,
            Direction::PosY => Direction::NegY,
            Direction::NegY => Direction::PosY,
        }
    }

    /// Position in [`Direction::ALL`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Voxel lookup around a chunk's own grid. Implementations decide what lies
/// past the grid edge.
pub trait NeighborIndex {
    /// Cell at signed local coordinates, which may fall outside `grid`.
    fn cell(&self, grid: &VoxelGrid, x: i32, y: i32, z: i32) -> Voxel;

    /// The 6-connected neighbor of local cell `(x, y, z)`.
    #[inline]
    fn neighbor(&self, grid: &VoxelGrid, x: usize, y: usize, z: usize, dir: Direction) -> Voxel {
        let (dx, dy, dz) = dir.delta();
        self.cell(grid, x as i32 + dx, y as i32 + dy, z as i32 + dz)
    }
}

/// Everything outside the grid is empty, so chunk seams always emit faces.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundedNeighbors;

impl NeighborIndex for BoundedNeighbors {
    #[inline]
    fn cell(&self, grid: &VoxelGrid, x: i32, y: i32, z: i32) -> Voxel {
        grid.get(x, y, z).unwrap_or(Voxel::EMPTY)
    }
}

/// Answers out-of-grid horizontal lookups by re-sampling the generator for that
/// world cell. Cells above or below the grid stay empty.
pub struct SampledNeighbors<'a> {
    sampler: &'a VoxelSampler,
}

impl<'a> SampledNeighbors<'a> {
    pub fn new(sampler: &'a VoxelSampler) -> Self {
        Self { sampler }
    }
}

impl NeighborIndex for SampledNeighbors<'_> {
    fn cell(&self, grid: &VoxelGrid, x: i32, y: i32, z: i32) -> Voxel {
        if let Some(v) = grid.get(x, y, z) {
            return v;
        }
        if y < 0 || y >= grid.sy as i32 {
            return Voxel::EMPTY;
        }
        let (bx, bz) = grid.base();
        self.sampler
            .cell_at(bx.saturating_add(x), y, bz.saturating_add(z), grid.sy)
    }
}
