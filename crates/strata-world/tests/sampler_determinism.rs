use proptest::prelude::*;
use strata_world::{Overhangs, Voxel, VoxelSampler};

proptest! {
    // Two independently constructed samplers agree on every column
    #[test]
    fn identical_inputs_identical_columns(
        seed in any::<i32>(),
        scale in 0.001f32..=1.0,
        wx in -50_000i32..50_000,
        wz in -50_000i32..50_000,
        height in 1usize..=96,
        thin in any::<bool>(),
    ) {
        let overhangs = Overhangs { enable: thin, ..Overhangs::default() };
        let a = VoxelSampler::new(seed, scale, overhangs.clone());
        let b = VoxelSampler::new(seed, scale, overhangs);
        let mut ca = vec![Voxel::EMPTY; height];
        let mut cb = vec![Voxel::STONE; height];
        a.fill_column(wx, wz, &mut ca);
        b.fill_column(wx, wz, &mut cb);
        prop_assert_eq!(ca, cb);
    }

    // Surface height never leaves [0, height]
    #[test]
    fn surface_height_in_range(seed in any::<i32>(), wx in any::<i16>(), wz in any::<i16>(), height in 1usize..=512) {
        let s = VoxelSampler::new(seed, 0.05, Overhangs::default());
        let h = s.surface_height(i32::from(wx), i32::from(wz), height);
        prop_assert!(h >= 0 && h as usize <= height);
    }
}

#[test]
fn different_seeds_differ_somewhere() {
    let a = VoxelSampler::new(1, 0.05, Overhangs::default());
    let b = VoxelSampler::new(2, 0.05, Overhangs::default());
    let differs = (0..64).any(|x| a.surface_height(x, 0, 64) != b.surface_height(x, 0, 64));
    assert!(differs);
}
