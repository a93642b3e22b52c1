//! Cube geometry: 4 vertices per face so each face gets its own texture
//! coordinates.

use bytemuck::{Pod, Zeroable};

/// Interleaved position + texture coordinate.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CubeVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

const fn v(x: f32, y: f32, z: f32, u: f32, t: f32) -> CubeVertex {
    CubeVertex {
        position: [x, y, z],
        tex_coord: [u, t],
    }
}

#[rustfmt::skip]
pub const CUBE_VERTICES: [CubeVertex; 24] = [
    // Front
    v(-0.5, -0.5,  0.5, 0.0, 0.0),
    v( 0.5, -0.5,  0.5, 1.0, 0.0),
    v( 0.5,  0.5,  0.5, 1.0, 1.0),
    v(-0.5,  0.5,  0.5, 0.0, 1.0),
    // Back
    v(-0.5, -0.5, -0.5, 1.0, 0.0),
    v(-0.5,  0.5, -0.5, 1.0, 1.0),
    v( 0.5,  0.5, -0.5, 0.0, 1.0),
    v( 0.5, -0.5, -0.5, 0.0, 0.0),
    // Top
    v(-0.5,  0.5, -0.5, 0.0, 1.0),
    v(-0.5,  0.5,  0.5, 0.0, 0.0),
    v( 0.5,  0.5,  0.5, 1.0, 0.0),
    v( 0.5,  0.5, -0.5, 1.0, 1.0),
    // Bottom
    v(-0.5, -0.5, -0.5, 0.0, 0.0),
    v( 0.5, -0.5, -0.5, 1.0, 0.0),
    v( 0.5, -0.5,  0.5, 1.0, 1.0),
    v(-0.5, -0.5,  0.5, 0.0, 1.0),
    // Right
    v( 0.5, -0.5, -0.5, 1.0, 0.0),
    v( 0.5,  0.5, -0.5, 1.0, 1.0),
    v( 0.5,  0.5,  0.5, 0.0, 1.0),
    v( 0.5, -0.5,  0.5, 0.0, 0.0),
    // Left
    v(-0.5, -0.5, -0.5, 0.0, 0.0),
    v(-0.5, -0.5,  0.5, 1.0, 0.0),
    v(-0.5,  0.5,  0.5, 1.0, 1.0),
    v(-0.5,  0.5, -0.5, 0.0, 1.0),
];

#[rustfmt::skip]
pub const CUBE_INDICES: [u32; 36] = [
     0,  1,  2,   2,  3,  0,
     4,  5,  6,   6,  7,  4,
     8,  9, 10,  10, 11,  8,
    12, 13, 14,  14, 15, 12,
    16, 17, 18,  18, 19, 16,
    20, 21, 22,  22, 23, 20,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_index_is_in_range_and_every_vertex_used() {
        let mut used = [false; CUBE_VERTICES.len()];
        for &i in &CUBE_INDICES {
            used[i as usize] = true;
        }
        assert!(used.iter().all(|u| *u));
    }

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<CubeVertex>(), 20);
    }
}
