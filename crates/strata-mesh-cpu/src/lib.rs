//! CPU meshing crate: face-culling and marching-cubes extractors.
#![forbid(unsafe_code)]

use std::sync::Arc;

use strata_chunk::{NeighborIndex, VoxelGrid};
use strata_world::MesherKind;

mod face_cull;
mod marching;
pub mod marching_tables;
mod mesh_build;

pub use face_cull::FaceCullMesher;
pub use marching::MarchingCubesMesher;
pub use mesh_build::ChunkMesh;

/// Turns one chunk's voxels into a flat vertex/index buffer in chunk-local
/// space. Implementations hold no mutable state and run on worker threads.
pub trait MeshExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// Appends the surface of `grid` to `out`, which is cleared first.
    fn extract_into(&self, grid: &VoxelGrid, neighbors: &dyn NeighborIndex, out: &mut ChunkMesh);

    fn extract(&self, grid: &VoxelGrid, neighbors: &dyn NeighborIndex) -> ChunkMesh {
        let mut out = ChunkMesh::default();
        self.extract_into(grid, neighbors, &mut out);
        out
    }
}

/// Builds the extractor selected in configuration.
pub fn extractor_for(kind: MesherKind, iso_level: f32) -> Arc<dyn MeshExtractor> {
    match kind {
        MesherKind::FaceCull => Arc::new(FaceCullMesher),
        MesherKind::MarchingCubes => Arc::new(MarchingCubesMesher::new(iso_level)),
    }
}

#[inline]
pub(crate) fn check_grid(grid: &VoxelGrid) {
    assert_eq!(
        grid.cells.len(),
        grid.sx * grid.sy * grid.sz,
        "voxel grid storage does not match its dimensions"
    );
}
