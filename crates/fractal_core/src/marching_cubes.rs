//! Marching cubes over a `VoxelSource`.
//!
//! Vertices are shared between neighbouring cubes: each crossed lattice edge
//! is keyed by its lower endpoint and axis, and the crossing is always
//! interpolated from that lower endpoint, so every cube touching the edge sees
//! the same vertex. Output stays in voxel-index space.
use crate::mesh::Mesh;
use crate::traits::VoxelSource;
use marching_cubes::tables::{EDGE_TABLE, TRI_TABLE};
use nalgebra::Point3;
use std::collections::HashMap;
use tracing::debug;

const CUBE_CORNER_OFFSETS: [[usize; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];

const CUBE_EDGE_CORNERS: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Extracts the zero level set of `source`, negative values being inside.
///
/// Triangles wind counter-clockwise seen from outside, so accumulated normals
/// point from negative toward positive values.
pub fn march_cubes<S: VoxelSource + ?Sized>(source: &S) -> Mesh {
    let n = source.resolution();
    let mut mesh = Mesh::new();
    if n < 2 {
        return mesh;
    }
    let mut edge_vertices: HashMap<usize, u32> = HashMap::new();

    for k in 0..n - 1 {
        for j in 0..n - 1 {
            for i in 0..n - 1 {
                let corners = CUBE_CORNER_OFFSETS.map(|[di, dj, dk]| [i + di, j + dj, k + dk]);
                let values = corners.map(|[ci, cj, ck]| source.value_at(ci, cj, ck));

                let mut cube_index = 0usize;
                for (corner, value) in values.iter().enumerate() {
                    if *value < 0.0 {
                        cube_index |= 1 << corner;
                    }
                }
                let edge_mask = EDGE_TABLE[cube_index] as i32;
                if edge_mask == 0 {
                    continue;
                }

                let mut cube_vertices = [0u32; 12];
                for (edge, &(ca, cb)) in CUBE_EDGE_CORNERS.iter().enumerate() {
                    if (edge_mask & (1 << edge)) == 0 {
                        continue;
                    }
                    let (lo, hi) = if corners[ca] < corners[cb] {
                        (ca, cb)
                    } else {
                        (cb, ca)
                    };
                    let lower = corners[lo];
                    let axis = (0..3)
                        .find(|&axis| corners[lo][axis] != corners[hi][axis])
                        .unwrap_or(0);
                    let key = 3 * (lower[0] + n * (lower[1] + n * lower[2])) + axis;
                    cube_vertices[edge] = *edge_vertices.entry(key).or_insert_with(|| {
                        let t = interpolate_factor(values[lo], values[hi]);
                        let mut position =
                            Point3::new(lower[0] as f64, lower[1] as f64, lower[2] as f64);
                        position[axis] += t;
                        mesh.push_vertex(position)
                    });
                }

                let tri_row = TRI_TABLE[cube_index];
                let mut tri_offset = 0usize;
                while tri_offset + 2 < tri_row.len() && tri_row[tri_offset] != -1 {
                    let e0 = tri_row[tri_offset] as usize;
                    let e1 = tri_row[tri_offset + 1] as usize;
                    let e2 = tri_row[tri_offset + 2] as usize;
                    // Table order faces the negative corners; swap to face outward.
                    mesh.push_triangle([cube_vertices[e0], cube_vertices[e2], cube_vertices[e1]]);
                    tri_offset += 3;
                }
            }
        }
    }

    debug!(
        resolution = n,
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "marching cubes finished"
    );
    mesh
}

/// Position of the zero crossing along an edge, as a fraction from `v0`.
/// Equal values resolve to the midpoint.
fn interpolate_factor(v0: f64, v1: f64) -> f64 {
    let denominator = v0 - v1;
    if denominator.abs() <= 1e-12 {
        0.5
    } else {
        (v0 / denominator).clamp(0.0, 1.0)
    }
}
