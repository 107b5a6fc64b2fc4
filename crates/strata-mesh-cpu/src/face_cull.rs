use strata_chunk::{Direction, NeighborIndex, VoxelGrid};
use strata_geom::Vec3;

use crate::{ChunkMesh, MeshExtractor, check_grid};

/// Unit-cube corners, shared with the marching-cubes corner numbering.
pub(crate) const CUBE_CORNERS: [[u8; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

/// Corner indices per face in `Direction::ALL` order, counter-clockwise seen
/// from outside the cube.
const FACE_CORNERS: [[usize; 4]; 6] = [
    [4, 5, 6, 7], // +Z
    [1, 2, 6, 5], // +X
    [0, 3, 2, 1], // -Z
    [0, 4, 7, 3], // -X
    [3, 7, 6, 2], // +Y
    [0, 1, 5, 4], // -Y
];

#[inline]
fn corner(origin: Vec3, i: usize) -> Vec3 {
    let c = CUBE_CORNERS[i];
    origin + Vec3::new(f32::from(c[0]), f32::from(c[1]), f32::from(c[2]))
}

/// Blocky mesher: one unit quad per solid cell face whose neighbor is empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct FaceCullMesher;

impl MeshExtractor for FaceCullMesher {
    fn name(&self) -> &'static str {
        "face_cull"
    }

    fn extract_into(&self, grid: &VoxelGrid, neighbors: &dyn NeighborIndex, out: &mut ChunkMesh) {
        check_grid(grid);
        out.clear_keep_capacity();
        for y in 0..grid.sy {
            for z in 0..grid.sz {
                for x in 0..grid.sx {
                    if grid.get_local(x, y, z).is_empty() {
                        continue;
                    }
                    let origin = Vec3::new(x as f32, y as f32, z as f32);
                    for dir in Direction::ALL {
                        if neighbors.neighbor(grid, x, y, z, dir).is_solid() {
                            continue;
                        }
                        let f = FACE_CORNERS[dir.index()];
                        out.add_quad(
                            corner(origin, f[0]),
                            corner(origin, f[1]),
                            corner(origin, f[2]),
                            corner(origin, f[3]),
                        );
                    }
                }
            }
        }
        log::trace!(
            target: "mesh",
            "face_cull {:?}: {} quads",
            grid.coord,
            out.indices.len() / 6
        );
    }
}
