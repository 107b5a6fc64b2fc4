use hashbrown::HashMap;

use strata_chunk::{NeighborIndex, VoxelGrid};
use strata_geom::Vec3;

use crate::marching_tables::{CORNERS, EDGES, case_triangles};
use crate::{ChunkMesh, MeshExtractor, check_grid};

/// Smooth mesher over cell densities. Marches the `(sx-1) x (sy-1) x (sz-1)`
/// cubes whose corners are cell centers; a corner is inside when its density
/// exceeds `iso_level`.
#[derive(Clone, Copy, Debug)]
pub struct MarchingCubesMesher {
    pub iso_level: f32,
}

impl Default for MarchingCubesMesher {
    fn default() -> Self {
        Self { iso_level: 0.0 }
    }
}

impl MarchingCubesMesher {
    pub fn new(iso_level: f32) -> Self {
        Self { iso_level }
    }

    /// Point on the segment where the density crosses the iso level. Flat
    /// segments resolve to the midpoint.
    #[inline]
    fn crossing(&self, p0: Vec3, v0: f32, p1: Vec3, v1: f32) -> Vec3 {
        let delta = v1 - v0;
        let t = if delta.abs() <= f32::EPSILON {
            0.5
        } else {
            ((self.iso_level - v0) / delta).clamp(0.0, 1.0)
        };
        p0.lerp(p1, t)
    }
}

impl MeshExtractor for MarchingCubesMesher {
    fn name(&self) -> &'static str {
        "marching_cubes"
    }

    fn extract_into(&self, grid: &VoxelGrid, neighbors: &dyn NeighborIndex, out: &mut ChunkMesh) {
        check_grid(grid);
        out.clear_keep_capacity();
        let (nx, ny, nz) = (
            grid.sx.saturating_sub(1),
            grid.sy.saturating_sub(1),
            grid.sz.saturating_sub(1),
        );
        // (lower corner cell index, axis) -> vertex, so neighboring cubes share.
        let mut edge_verts: HashMap<(usize, u8), u32> = HashMap::new();
        let mut values = [0.0f32; 8];
        for y in 0..ny {
            for z in 0..nz {
                for x in 0..nx {
                    let mut case = 0u8;
                    for (i, c) in CORNERS.iter().enumerate() {
                        let v = neighbors
                            .cell(
                                grid,
                                (x + c[0] as usize) as i32,
                                (y + c[1] as usize) as i32,
                                (z + c[2] as usize) as i32,
                            )
                            .density();
                        values[i] = v;
                        if v > self.iso_level {
                            case |= 1 << i;
                        }
                    }
                    let tris = case_triangles(case);
                    if tris.is_empty() {
                        continue;
                    }
                    for tri in tris {
                        let mut ids = [0u32; 3];
                        for (k, &e) in tri.iter().enumerate() {
                            let [a, b] = EDGES[e as usize];
                            let (lo, hi) = if CORNERS[a as usize] <= CORNERS[b as usize] {
                                (a as usize, b as usize)
                            } else {
                                (b as usize, a as usize)
                            };
                            let cl = CORNERS[lo];
                            let ch = CORNERS[hi];
                            let axis = (0..3).find(|&i| cl[i] != ch[i]).unwrap_or(0) as u8;
                            let (lx, ly, lz) =
                                (x + cl[0] as usize, y + cl[1] as usize, z + cl[2] as usize);
                            let key = (grid.idx(lx, ly, lz), axis);
                            ids[k] = *edge_verts.entry(key).or_insert_with(|| {
                                let p0 = Vec3::new(lx as f32, ly as f32, lz as f32);
                                let p1 = Vec3::new(
                                    (x + ch[0] as usize) as f32,
                                    (y + ch[1] as usize) as f32,
                                    (z + ch[2] as usize) as f32,
                                );
                                out.push_vertex(self.crossing(p0, values[lo], p1, values[hi]))
                            });
                        }
                        out.add_triangle(ids[0], ids[1], ids[2]);
                    }
                }
            }
        }
        log::trace!(
            target: "mesh",
            "marching_cubes {:?}: {} triangles",
            grid.coord,
            out.triangle_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_chunk::BoundedNeighbors;
    use strata_world::{ChunkCoord, Voxel};

    fn grid_with(n: usize, solid: &[(usize, usize, usize)]) -> VoxelGrid {
        let mut g = VoxelGrid::new(ChunkCoord::new(0, 0), n, n, n);
        for &(x, y, z) in solid {
            g.set_local(x, y, z, Voxel::DIRT);
        }
        g
    }

    fn is_closed(m: &ChunkMesh) -> bool {
        let mut directed: HashMap<(u32, u32), i32> = HashMap::new();
        for t in m.indices.chunks_exact(3) {
            for k in 0..3 {
                *directed.entry((t[k], t[(k + 1) % 3])).or_default() += 1;
            }
        }
        directed
            .iter()
            .all(|(&(a, b), &n)| directed.get(&(b, a)).copied().unwrap_or(0) == n)
    }

    #[test]
    fn isolated_cell_is_an_octahedron() {
        let g = grid_with(3, &[(1, 1, 1)]);
        let m = MarchingCubesMesher::new(0.5).extract(&g, &BoundedNeighbors);
        assert_eq!(m.triangle_count(), 8);
        assert_eq!(m.vertices.len(), 6);
        assert!(is_closed(&m));
        assert!((m.signed_volume() - 1.0 / 6.0).abs() < 1e-5);
        for v in &m.vertices {
            assert!(((*v - Vec3::new(1.0, 1.0, 1.0)).length_sq() - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_and_full_grids_have_no_surface() {
        let mc = MarchingCubesMesher::default();
        let empty = grid_with(4, &[]);
        assert!(mc.extract(&empty, &BoundedNeighbors).is_empty());
        let mut full = grid_with(4, &[]);
        full.cells.fill(Voxel::STONE);
        assert!(mc.extract(&full, &BoundedNeighbors).is_empty());
    }

    #[test]
    fn single_cell_grid_has_no_cubes() {
        let g = grid_with(1, &[(0, 0, 0)]);
        let m = MarchingCubesMesher::default().extract(&g, &BoundedNeighbors);
        assert!(m.vertices.is_empty() && m.indices.is_empty());
    }

    #[test]
    fn flat_segment_uses_midpoint() {
        let mc = MarchingCubesMesher::new(1.0);
        let p = mc.crossing(Vec3::ZERO, 1.0, Vec3::new(1.0, 0.0, 0.0), 1.0);
        assert_eq!(p, Vec3::new(0.5, 0.0, 0.0));
    }
}
