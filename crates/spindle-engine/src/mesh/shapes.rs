//! Built-in demo shapes.
//!
//! Coordinates are in clip-like model space, roughly within the unit cube.

use super::Mesh;

pub const TETRAHEDRON_POSITIONS: [[f32; 3]; 4] = [
    [-0.8, -0.3333, -0.47],
    [0.8, -0.3333, -0.4714],
    [0.0, -0.3333, 0.9428],
    [0.0, 1.0, 0.0],
];

pub const TETRAHEDRON_INDICES: [u16; 12] = [
    0, 2, 1, // bottom, facing -y
    0, 1, 3, // back, facing -z
    1, 2, 3, // right, facing +x
    2, 0, 3, // left, facing -x
];

// Tetrahedron plus a lower ring of three vertices forming the "house" body.
pub const HOUSE_POSITIONS: [[f32; 3]; 7] = [
    [-0.8, -0.3333, -0.47],
    [0.8, -0.3333, -0.4714],
    [0.0, -0.3333, 0.9428],
    [0.0, 1.0, 0.0],
    [-0.8, -1.0, 0.47],
    [0.0, -1.0, 0.9428],
    [0.8, -1.0, -0.47],
];

pub const HOUSE_INDICES: [u16; 24] = [
    0, 2, 1,
    0, 1, 3,
    1, 2, 3,
    2, 0, 3,
    0, 4, 2,
    2, 4, 5,
    2, 5, 6,
    1, 2, 6,
];

/// Four-faced pyramid: 4 vertices, 4 triangles.
pub fn tetrahedron() -> Mesh {
    built(&TETRAHEDRON_POSITIONS, &TETRAHEDRON_INDICES)
}

/// Pyramid roof over a triangular body: 7 vertices, 8 triangles.
pub fn house() -> Mesh {
    built(&HOUSE_POSITIONS, &HOUSE_INDICES)
}

fn built(positions: &[[f32; 3]], indices: &[u16]) -> Mesh {
    match Mesh::from_positions(positions, indices) {
        Ok(mesh) => mesh,
        // Constant tables; covered by the tests below.
        Err(e) => unreachable!("built-in shape is malformed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tetrahedron_counts() {
        let m = tetrahedron();
        assert_eq!(m.vertex_count(), 4);
        assert_eq!(m.triangle_count(), 4);
    }

    #[test]
    fn house_counts() {
        let m = house();
        assert_eq!(m.vertex_count(), 7);
        assert_eq!(m.triangle_count(), 8);
    }

    #[test]
    fn house_extends_tetrahedron() {
        let h = house();
        let t = tetrahedron();
        assert_eq!(&h.indices()[..12], t.indices());
        assert_eq!(h.vertices()[3], t.vertices()[3]);
    }
}
