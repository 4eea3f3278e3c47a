//! Indexed triangle meshes in render winding

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Transform, Vec3};
use crate::physics::collider::GeometryError;

use super::GeneratorError;

/// Indexed triangle mesh
///
/// Triangles are stored in clockwise render winding, i.e. the right-hand
/// normal of `(i0, i1, i2)` points into the solid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Creates a mesh from vertices and a triangle index list
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Vertex positions
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Raw index buffer
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Number of whole triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Iterate over triangles as index triples
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]])
    }

    /// Check index ranges and vertex values
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.indices.len() % 3 != 0 {
            return Err(GeneratorError::IncompleteTriangle(self.indices.len()));
        }
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= self.vertices.len()) {
            return Err(GeneratorError::InvalidIndex { index, vertex_count: self.vertices.len() });
        }
        if !self.vertices.iter().all(utils::is_finite) {
            return Err(GeometryError::NonFinite("mesh vertex").into());
        }
        Ok(())
    }

    /// Copy of the mesh with every vertex transformed
    ///
    /// A mirroring transform would flip the winding, so triangles are
    /// reversed to keep render winding clockwise.
    pub fn transformed(&self, transform: &Transform) -> Mesh {
        if transform.is_identity() {
            return self.clone();
        }

        let matrix = transform.to_matrix();
        let vertices = self
            .vertices
            .iter()
            .map(|v| matrix.transform_point(&(*v).into()).coords)
            .collect();

        let indices = if transform.is_mirroring() {
            self.triangles().flat_map(|[a, b, c]| [a, c, b]).collect()
        } else {
            self.indices.clone()
        };

        Mesh { vertices, indices }
    }
}
