//! Marching-cubes case tables, derived at first use from the cube topology
//! rather than transcribed.
//!
//! Corners follow [`CORNERS`]; a case index has bit `i` set when corner `i` is
//! inside the surface. Every case resolves ambiguous faces the same way (inside
//! corners on a face are never joined diagonally), so neighboring cubes always
//! agree on their shared face and the result is watertight.

use std::sync::OnceLock;

pub const CASE_COUNT: usize = 256;
pub const MAX_CASE_TRIANGLES: usize = 5;

pub const CORNERS: [[u8; 3]; 8] = crate::face_cull::CUBE_CORNERS;

/// Corner pairs for the 12 cube edges.
pub const EDGES: [[u8; 2]; 12] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 0],
    [4, 5],
    [5, 6],
    [6, 7],
    [7, 4],
    [0, 4],
    [1, 5],
    [2, 6],
    [3, 7],
];

/// Corner loops for the six cube faces, counter-clockwise from outside.
const FACES: [[u8; 4]; 6] = [
    [0, 3, 2, 1],
    [4, 5, 6, 7],
    [0, 4, 7, 3],
    [1, 2, 6, 5],
    [0, 1, 5, 4],
    [3, 7, 6, 2],
];

/// Triangles for one case, as edge-index triples wound outward.
pub type CaseTriangles = Vec<[u8; 3]>;

fn edge_between(a: u8, b: u8) -> u8 {
    EDGES
        .iter()
        .position(|e| (e[0] == a && e[1] == b) || (e[0] == b && e[1] == a))
        .unwrap_or_else(|| unreachable!("corners {a} and {b} share no edge")) as u8
}

fn gen_triangles_for_case(case: u8) -> CaseTriangles {
    let inside = |c: u8| (case >> c) & 1 == 1;
    // next[exit edge] = entry edge, walking the surface boundary on each face.
    let mut next: [Option<u8>; 12] = [None; 12];
    for f in FACES {
        for i in 0..4 {
            let prev = f[(i + 3) % 4];
            if !inside(f[i]) || inside(prev) {
                continue;
            }
            let enter = edge_between(prev, f[i]);
            let mut j = i;
            while inside(f[(j + 1) % 4]) {
                j = (j + 1) % 4;
            }
            let exit = edge_between(f[j], f[(j + 1) % 4]);
            next[exit as usize] = Some(enter);
        }
    }
    let mut out = Vec::new();
    let mut seen = [false; 12];
    for start in 0..12u8 {
        if seen[start as usize] || next[start as usize].is_none() {
            continue;
        }
        let mut ring = vec![start];
        seen[start as usize] = true;
        let mut cur = next[start as usize];
        while let Some(e) = cur {
            if e == start {
                break;
            }
            ring.push(e);
            seen[e as usize] = true;
            cur = next[e as usize];
        }
        // Rings circulate clockwise seen from outside; fan them reversed.
        for t in 1..ring.len().saturating_sub(1) {
            out.push([ring[0], ring[t + 1], ring[t]]);
        }
    }
    out
}

fn build_case_table() -> [CaseTriangles; CASE_COUNT] {
    std::array::from_fn(|i| gen_triangles_for_case(i as u8))
}

/// Edge-index triangles for the corner-inside mask `case`.
pub fn case_triangles(case: u8) -> &'static [[u8; 3]] {
    static CASES: OnceLock<[CaseTriangles; CASE_COUNT]> = OnceLock::new();
    let t = CASES.get_or_init(build_case_table);
    &t[case as usize]
}
