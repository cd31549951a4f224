//! Mesh store.
//!
//! Meshes are immutable once built. GPU upload is the backend's business and
//! may be deferred until a mesh is first drawn; `Mesh::id` is the cache key.

mod geometry;
mod store;
mod vertex;

pub mod shapes;

pub use geometry::{Mesh, MeshId};
pub use store::MeshStore;
pub use vertex::Vertex;
