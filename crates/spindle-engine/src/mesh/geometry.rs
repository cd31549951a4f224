use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{RenderError, Result};

use super::Vertex;

/// Process-unique mesh identity.
///
/// Backends key their uploaded buffers by this id, so it must never be reused
/// while a backend is alive.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Indexed triangle mesh.
///
/// Invariants (checked by [`Mesh::build`]):
/// - `indices.len() % 3 == 0`
/// - every index is `< vertices.len()`
#[derive(Debug, Clone)]
pub struct Mesh {
    id: MeshId,
    vertices: Vec<Vertex>,
    indices: Vec<u16>,
}

impl Mesh {
    /// Validates a mesh description and takes ownership of it.
    pub fn build(vertices: impl Into<Vec<Vertex>>, indices: impl Into<Vec<u16>>) -> Result<Self> {
        let vertices = vertices.into();
        let indices = indices.into();

        if indices.len() % 3 != 0 {
            return Err(RenderError::InvalidGeometry(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }

        if let Some((pos, &index)) = indices
            .iter()
            .enumerate()
            .find(|(_, i)| usize::from(**i) >= vertices.len())
        {
            return Err(RenderError::InvalidGeometry(format!(
                "index {index} at position {pos} is out of bounds for {} vertices",
                vertices.len()
            )));
        }

        Ok(Self {
            id: MeshId::next(),
            vertices,
            indices,
        })
    }

    /// Builds from raw `[x, y, z]` positions.
    pub fn from_positions(positions: &[[f32; 3]], indices: &[u16]) -> Result<Self> {
        let vertices: Vec<Vertex> = positions.iter().copied().map(Vertex::from).collect();
        Self::build(vertices, indices)
    }

    #[inline]
    pub fn id(&self) -> MeshId {
        self.id
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterates triangles as index triples in declaration order.
    pub fn triangles(&self) -> impl Iterator<Item = [u16; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }
}
