use strata_geom::{Aabb, Vec3};

fn approx_eq(a: f32, b: f32, eps: f32) -> bool {
    (a - b).abs() <= eps
}

fn vec3_approx_eq(a: Vec3, b: Vec3, eps: f32) -> bool {
    approx_eq(a.x, b.x, eps) && approx_eq(a.y, b.y, eps) && approx_eq(a.z, b.z, eps)
}

#[test]
fn vec3_add_sub() {
    let a = Vec3::new(1.0, 2.0, 3.0);
    let b = Vec3::new(-4.0, 5.0, -6.0);
    let c = a + b;
    assert!(vec3_approx_eq(c, Vec3::new(-3.0, 7.0, -3.0), 1e-6));
    assert!(vec3_approx_eq(c - a, b, 1e-6));

    let mut v = Vec3::new(1.0, 1.0, 1.0);
    v += Vec3::new(2.0, 3.0, 4.0);
    assert!(vec3_approx_eq(v, Vec3::new(3.0, 4.0, 5.0), 1e-6));
}

#[test]
fn vec3_cross_basis() {
    let i = Vec3::new(1.0, 0.0, 0.0);
    let j = Vec3::new(0.0, 1.0, 0.0);
    let k = Vec3::new(0.0, 0.0, 1.0);
    assert!(vec3_approx_eq(i.cross(j), k, 1e-6));
    assert!(vec3_approx_eq(j.cross(k), i, 1e-6));
    assert!(vec3_approx_eq(k.cross(i), j, 1e-6));
}

#[test]
fn vec3_lerp_endpoints_and_midpoint() {
    let a = Vec3::new(0.0, 2.0, -4.0);
    let b = Vec3::new(2.0, 4.0, 4.0);
    assert!(vec3_approx_eq(a.lerp(b, 0.0), a, 1e-6));
    assert!(vec3_approx_eq(a.lerp(b, 1.0), b, 1e-6));
    assert!(vec3_approx_eq(a.lerp(b, 0.5), Vec3::new(1.0, 3.0, 0.0), 1e-6));
}

#[test]
fn aabb_from_origin_size() {
    let b = Aabb::from_origin_size(Vec3::new(16.0, 0.0, -16.0), Vec3::new(16.0, 64.0, 16.0));
    assert_eq!(b.min, Vec3::new(16.0, 0.0, -16.0));
    assert_eq!(b.max, Vec3::new(32.0, 64.0, 0.0));
    assert!(vec3_approx_eq(b.size(), Vec3::new(16.0, 64.0, 16.0), 1e-6));
}

#[test]
fn aabb_enclosing_points() {
    assert_eq!(Aabb::enclosing(&[]), None);
    let pts = [
        Vec3::new(1.0, 5.0, -2.0),
        Vec3::new(-3.0, 0.5, 4.0),
        Vec3::new(0.0, 2.0, 0.0),
    ];
    let b = Aabb::enclosing(&pts).unwrap();
    assert!(vec3_approx_eq(b.min, Vec3::new(-3.0, 0.5, -2.0), 1e-6));
    assert!(vec3_approx_eq(b.max, Vec3::new(1.0, 5.0, 4.0), 1e-6));
    assert!(vec3_approx_eq(b.size(), Vec3::new(4.0, 4.5, 6.0), 1e-6));
}
