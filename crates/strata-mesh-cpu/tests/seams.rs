use strata_chunk::{BoundedNeighbors, SampledNeighbors, VoxelGrid, generate_chunk};
use strata_geom::Vec3;
use strata_mesh_cpu::{ChunkMesh, FaceCullMesher, MeshExtractor, extractor_for};
use strata_world::{ChunkCoord, MesherKind, Overhangs, Voxel, VoxelSampler};

/// Quads lying in the plane `x = plane` (chunk-local).
fn quads_on_x_plane(m: &ChunkMesh, plane: f32) -> usize {
    m.vertices
        .chunks_exact(4)
        .filter(|q| q.iter().all(|v| v.x == plane))
        .count()
}

#[test]
fn isolated_seams_emit_shared_face_on_both_sides() {
    let mut a = VoxelGrid::new(ChunkCoord::new(0, 0), 2, 1, 1);
    let mut b = VoxelGrid::new(ChunkCoord::new(1, 0), 2, 1, 1);
    a.set_local(1, 0, 0, Voxel::STONE);
    b.set_local(0, 0, 0, Voxel::STONE);

    let ma = FaceCullMesher.extract(&a, &BoundedNeighbors);
    let mb = FaceCullMesher.extract(&b, &BoundedNeighbors);
    assert_eq!(ma.vertices.len(), 24);
    assert_eq!(mb.vertices.len(), 24);
    // A's +X face and B's -X face coincide in world space.
    assert_eq!(quads_on_x_plane(&ma, 2.0), 1);
    assert_eq!(quads_on_x_plane(&mb, 0.0), 1);
}

#[test]
fn sampled_seams_cull_against_generated_neighbor() {
    let s = VoxelSampler::new(4242, 0.07, Overhangs::default());
    let (size, height) = (8, 32);
    let a = generate_chunk(&s, ChunkCoord::new(0, 0), size, height, Vec::new()).grid;
    let b = generate_chunk(&s, ChunkCoord::new(1, 0), size, height, Vec::new()).grid;

    let mut expect = 0;
    let mut buried = 0;
    for y in 0..height {
        for z in 0..size {
            if a.get_local(size - 1, y, z).is_solid() {
                if b.get_local(0, y, z).is_empty() {
                    expect += 1;
                } else {
                    buried += 1;
                }
            }
        }
    }
    assert!(buried > 0, "seed should give overlapping columns at the seam");

    let sampled = FaceCullMesher.extract(&a, &SampledNeighbors::new(&s));
    let isolated = FaceCullMesher.extract(&a, &BoundedNeighbors);
    let plane = size as f32;
    assert_eq!(quads_on_x_plane(&sampled, plane), expect);
    assert_eq!(quads_on_x_plane(&isolated, plane), expect + buried);
}

#[test]
fn extractor_for_selects_strategy() {
    assert_eq!(extractor_for(MesherKind::FaceCull, 0.0).name(), "face_cull");
    let mc = extractor_for(MesherKind::MarchingCubes, 0.5);
    assert_eq!(mc.name(), "marching_cubes");

    let mut g = VoxelGrid::new(ChunkCoord::new(0, 0), 3, 3, 3);
    g.set_local(1, 1, 1, Voxel::GRASS);
    let m = mc.extract(&g, &BoundedNeighbors);
    assert!(m.vertices.iter().all(|v| (*v - Vec3::new(1.0, 1.0, 1.0)).length_sq() <= 0.25 + 1e-6));
}
