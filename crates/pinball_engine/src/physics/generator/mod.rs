//! Collider generation from item meshes
//!
//! Items with a render mesh (wire guides, custom meshes) are turned into a
//! set of triangle, edge and vertex colliders:
//!
//! 1. every render triangle (clockwise) is reversed to counter-clockwise and
//!    emitted as a triangle collider, followed by those of its three edges
//!    that were not seen before
//! 2. after all triangles, one point collider per mesh vertex
//!
//! Edge colliders are deduplicated through an [`EdgeSet`] scoped to a single
//! generation call.

pub mod mesh;
pub mod wire_guide;

use std::collections::HashSet;

use crate::physics::collider::{ColliderShape, GeometryError, Line3D, Point, Triangle};

pub use mesh::Mesh;
pub use wire_guide::WireGuideParams;

/// Errors raised while generating colliders for an item
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeneratorError {
    /// Invalid primitive geometry
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Not enough control points to build a shape
    #[error("need at least {required} points, got {found}")]
    TooFewPoints {
        /// Minimum number of points
        required: usize,
        /// Number of points supplied
        found: usize,
    },

    /// A triangle references a vertex that does not exist
    #[error("index {index} out of range for {vertex_count} vertices")]
    InvalidIndex {
        /// Offending index
        index: u32,
        /// Number of vertices in the mesh
        vertex_count: usize,
    },

    /// Index buffer does not describe whole triangles
    #[error("index count {0} is not a multiple of 3")]
    IncompleteTriangle(usize),

    /// Mesh yields no usable triangle
    #[error("mesh has no non-degenerate triangle")]
    EmptyMesh,

    /// A shape parameter is out of range
    #[error("invalid parameter {name} = {value}")]
    InvalidParameter {
        /// Parameter name
        name: &'static str,
        /// Supplied value
        value: f32,
    },

    /// Material coefficients are non-finite or out of range
    #[error("invalid material")]
    InvalidMaterial,
}

/// Set of undirected edges between mesh vertex indices
#[derive(Debug, Default)]
pub struct EdgeSet {
    edges: HashSet<(u32, u32)>,
}

impl EdgeSet {
    /// Create an empty edge set
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonical key of the undirected edge `a`-`b`
    pub fn key(a: u32, b: u32) -> (u32, u32) {
        (a.min(b), a.max(b))
    }

    /// Record the edge; returns `true` the first time it is seen
    pub fn insert(&mut self, a: u32, b: u32) -> bool {
        self.edges.insert(Self::key(a, b))
    }

    /// Whether the edge has been recorded, in either direction
    pub fn contains(&self, a: u32, b: u32) -> bool {
        self.edges.contains(&Self::key(a, b))
    }

    /// Number of distinct edges
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether no edge was recorded
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

/// Derive triangle, edge and point collider shapes from a render mesh
///
/// Triangles with zero area are skipped, as are edges of zero length. A mesh
/// with invalid indices or non-finite vertices is rejected as a whole.
pub fn mesh_to_shapes(mesh: &Mesh) -> Result<Vec<ColliderShape>, GeneratorError> {
    mesh.validate()?;

    let vertices = mesh.vertices();
    let mut shapes = Vec::with_capacity(mesh.triangle_count() * 3 + vertices.len());
    let mut edges = EdgeSet::new();
    let mut skipped = 0usize;

    for [i0, i1, i2] in mesh.triangles() {
        // clockwise render winding to counter-clockwise collision winding
        let (a, b, c) = (i0, i2, i1);
        let triangle = ColliderShape::Triangle(Triangle::new(
            vertices[a as usize],
            vertices[b as usize],
            vertices[c as usize],
        ));
        if triangle.validate().is_err() {
            skipped += 1;
            continue;
        }
        shapes.push(triangle);

        for (from, to) in [(a, b), (b, c), (c, a)] {
            let edge = ColliderShape::Line3D(Line3D::new(vertices[from as usize], vertices[to as usize]));
            if edge.validate().is_ok() && edges.insert(from, to) {
                shapes.push(edge);
            }
        }
    }

    if shapes.is_empty() {
        return Err(GeneratorError::EmptyMesh);
    }
    if skipped > 0 {
        log::debug!("Skipped {skipped} degenerate triangles");
    }

    shapes.extend(vertices.iter().map(|v| ColliderShape::Point(Point::new(*v))));
    Ok(shapes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::physics::collider::ColliderType;

    fn count(shapes: &[ColliderShape], ty: ColliderType) -> usize {
        shapes.iter().filter(|s| s.collider_type() == ty).count()
    }

    fn cube() -> Mesh {
        let vertices = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ];
        // clockwise seen from outside
        let indices = vec![
            0, 1, 2, 0, 2, 3, // bottom
            4, 6, 5, 4, 7, 6, // top
            0, 5, 1, 0, 4, 5, // front
            2, 7, 3, 2, 6, 7, // back
            1, 6, 2, 1, 5, 6, // right
            3, 4, 0, 3, 7, 4, // left
        ];
        Mesh::new(vertices, indices)
    }

    fn tetrahedron() -> Mesh {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let indices = vec![0, 1, 2, 0, 3, 1, 0, 2, 3, 1, 3, 2];
        Mesh::new(vertices, indices)
    }

    #[test]
    fn test_edge_set_is_undirected() {
        let mut edges = EdgeSet::new();
        assert!(edges.insert(3, 1));
        assert!(!edges.insert(1, 3));
        assert!(edges.contains(3, 1));
        assert_eq!(EdgeSet::key(9, 2), (2, 9));
        assert_eq!(edges.len(), 1);
    }

    #[test]
    fn test_tetrahedron_collider_counts() {
        let shapes = mesh_to_shapes(&tetrahedron()).unwrap();
        assert_eq!(count(&shapes, ColliderType::Triangle), 4);
        assert_eq!(count(&shapes, ColliderType::Line3D), 6);
        assert_eq!(count(&shapes, ColliderType::Point), 4);
    }

    #[test]
    fn test_cube_edges_are_unique_regardless_of_order() {
        let mesh = cube();
        let forward = mesh_to_shapes(&mesh).unwrap();
        assert_eq!(count(&forward, ColliderType::Line3D), 18);

        let mut reversed_indices: Vec<u32> = mesh
            .triangles()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .flatten()
            .collect();
        reversed_indices.rotate_left(3);
        let reversed = mesh_to_shapes(&Mesh::new(mesh.vertices().to_vec(), reversed_indices)).unwrap();
        assert_eq!(count(&reversed, ColliderType::Line3D), 18);
    }

    #[test]
    fn test_cube_triangles_face_outwards() {
        let shapes = mesh_to_shapes(&cube()).unwrap();
        for shape in &shapes {
            if let ColliderShape::Triangle(tri) = shape {
                // cube centered at the origin
                assert!(tri.normal().dot(&tri.centroid()) > 0.0, "inward triangle {tri:?}");
            }
        }
    }

    #[test]
    fn test_points_follow_triangles_and_edges() {
        let shapes = mesh_to_shapes(&tetrahedron()).unwrap();
        let first_point = shapes
            .iter()
            .position(|s| s.collider_type() == ColliderType::Point)
            .unwrap();
        assert!(shapes[first_point..].iter().all(|s| s.collider_type() == ColliderType::Point));
        assert_eq!(shapes[0].collider_type(), ColliderType::Triangle);
    }

    #[test]
    fn test_degenerate_triangles_are_skipped() {
        let vertices = vec![Vec3::zeros(), Vec3::x(), Vec3::x() * 2.0, Vec3::y()];
        let mesh = Mesh::new(vertices, vec![0, 1, 2, 0, 3, 1]);
        let shapes = mesh_to_shapes(&mesh).unwrap();
        assert_eq!(count(&shapes, ColliderType::Triangle), 1);
    }

    #[test]
    fn test_mesh_rejections() {
        let nan = Mesh::new(vec![Vec3::zeros(), Vec3::x(), Vec3::new(f32::NAN, 0.0, 0.0)], vec![0, 1, 2]);
        assert!(matches!(mesh_to_shapes(&nan), Err(GeneratorError::Geometry(_))));

        let out_of_range = Mesh::new(vec![Vec3::zeros(), Vec3::x(), Vec3::y()], vec![0, 1, 5]);
        assert_eq!(
            mesh_to_shapes(&out_of_range),
            Err(GeneratorError::InvalidIndex { index: 5, vertex_count: 3 })
        );

        let flat = Mesh::new(vec![Vec3::zeros(), Vec3::x(), Vec3::x() * 2.0], vec![0, 1, 2]);
        assert_eq!(mesh_to_shapes(&flat), Err(GeneratorError::EmptyMesh));
    }
}
