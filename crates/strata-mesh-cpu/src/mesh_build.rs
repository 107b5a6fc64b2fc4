use strata_geom::{Aabb, Vec3};

/// Output of one extraction: chunk-local positions and a triangle list.
#[derive(Default, Clone, Debug, PartialEq)]
pub struct ChunkMesh {
    pub vertices: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl ChunkMesh {
    /// Clears both arrays but retains capacity for reuse by the next chunk.
    #[inline]
    pub fn clear_keep_capacity(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Pre-reserve capacity for approximately `n_quads` quads worth of data.
    #[inline]
    pub fn reserve_quads(&mut self, n_quads: usize) {
        self.vertices.reserve(n_quads * 4);
        self.indices.reserve(n_quads * 6);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn push_vertex(&mut self, v: Vec3) -> u32 {
        let i = self.vertices.len() as u32;
        self.vertices.push(v);
        i
    }

    /// Appends a quad `a b c d` given counter-clockwise as seen from the front,
    /// split into `(a, b, c)` and `(a, c, d)`.
    pub fn add_quad(&mut self, a: Vec3, b: Vec3, c: Vec3, d: Vec3) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&[a, b, c, d]);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    #[inline]
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    /// Local-space bounds, or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::enclosing(&self.vertices)
    }

    /// Face normal of triangle `t` (not normalized).
    pub fn triangle_normal(&self, t: usize) -> Vec3 {
        let a = self.vertices[self.indices[t * 3] as usize];
        let b = self.vertices[self.indices[t * 3 + 1] as usize];
        let c = self.vertices[self.indices[t * 3 + 2] as usize];
        (b - a).cross(c - a)
    }

    /// Signed enclosed volume; positive when triangles face outward.
    pub fn signed_volume(&self) -> f32 {
        let mut vol = 0.0;
        for tri in self.indices.chunks_exact(3) {
            let a = self.vertices[tri[0] as usize];
            let b = self.vertices[tri[1] as usize];
            let c = self.vertices[tri[2] as usize];
            vol += a.dot(b.cross(c));
        }
        vol / 6.0
    }
}
