use serde::{Deserialize, Serialize};

/// One grid cell. `id == 0` is empty; any other value is a solid material id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Voxel {
    pub id: u16,
}

impl Voxel {
    pub const EMPTY: Voxel = Voxel { id: 0 };
    pub const STONE: Voxel = Voxel { id: 1 };
    pub const DIRT: Voxel = Voxel { id: 2 };
    pub const GRASS: Voxel = Voxel { id: 3 };

    #[inline]
    pub const fn new(id: u16) -> Self {
        Self { id }
    }

    #[inline]
    pub const fn is_solid(self) -> bool {
        self.id != 0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.id == 0
    }

    /// Scalar used as marching-cubes density: 1 for any solid material, 0 when
    /// empty.
    #[inline]
    pub fn density(self) -> f32 {
        if self.is_solid() { 1.0 } else { 0.0 }
    }
}
