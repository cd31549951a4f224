use std::collections::HashMap;

use crate::error::{RenderError, Result};

use super::{Mesh, MeshId};

/// Named, insertion-ordered collection of built meshes.
///
/// The store owns its meshes for the application's lifetime; there is no
/// removal.
#[derive(Debug, Default)]
pub struct MeshStore {
    meshes: Vec<(String, Mesh)>,
    by_name: HashMap<String, usize>,
}

impl MeshStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a mesh under a unique name.
    pub fn insert(&mut self, name: impl Into<String>, mesh: Mesh) -> Result<MeshId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(RenderError::InvalidScene(format!("duplicate mesh name `{name}`")));
        }

        let id = mesh.id();
        self.by_name.insert(name.clone(), self.meshes.len());
        self.meshes.push((name, mesh));
        Ok(id)
    }

    pub fn get(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.iter().map(|(_, m)| m).find(|m| m.id() == id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Mesh> {
        self.by_name.get(name).map(|&i| &self.meshes[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Mesh)> {
        self.meshes.iter().map(|(n, m)| (n.as_str(), m))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
