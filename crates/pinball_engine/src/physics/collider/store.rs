//! Collider store
//!
//! Flat, immutable table of every collider of a table, built once from the
//! list of item descriptors. Ids are assigned in build order and equal the
//! collider's index, so lookups are a plain slice access.
//!
//! Items whose geometry is rejected are dropped as a whole and reported as
//! [`Diagnostic`]s; the rest of the table is built normally.

use serde::{Deserialize, Serialize};

use crate::foundation::math::Transform;
use crate::foundation::time::Stopwatch;
use crate::physics::generator::{self, GeneratorError, Mesh, WireGuideParams};
use crate::spatial::AABB;

use super::{Collider, ColliderId, ColliderShape, ColliderType, ItemIndex, Plane, PhysicsMaterial};

/// Geometry source of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeKind {
    /// A single collider with explicit geometry
    Primitive(ColliderShape),
    /// Horizontal playfield floor at the given height
    Playfield {
        /// Height of the playfield surface
        height: f32,
    },
    /// Render mesh in clockwise winding, placed by `transform`
    Mesh {
        /// Mesh in item space
        mesh: Mesh,
        /// Item-to-table transform
        #[serde(default)]
        transform: Transform,
    },
    /// Metal wire guide
    WireGuide(WireGuideParams),
}

/// One game item's contribution to the collider store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    /// Item name, used in diagnostics
    pub name: String,
    /// Material shared by all colliders of the item
    pub material: PhysicsMaterial,
    /// Whether the item only reports overlap
    pub is_trigger: bool,
    /// Geometry
    pub kind: ShapeKind,
}

impl ShapeDescriptor {
    /// Create a solid descriptor with the default material
    pub fn new(name: impl Into<String>, kind: ShapeKind) -> Self {
        Self {
            name: name.into(),
            material: PhysicsMaterial::default(),
            is_trigger: false,
            kind,
        }
    }

    /// Solid descriptor for a single primitive shape
    pub fn primitive(name: impl Into<String>, shape: ColliderShape) -> Self {
        Self::new(name, ShapeKind::Primitive(shape))
    }

    /// Set the material
    pub fn with_material(mut self, material: PhysicsMaterial) -> Self {
        self.material = material;
        self
    }

    /// Turn the item into a trigger
    pub fn as_trigger(mut self) -> Self {
        self.is_trigger = true;
        self
    }

    /// Collider shapes of this item, in emission order
    pub fn shapes(&self) -> Result<Vec<ColliderShape>, GeneratorError> {
        if !self.material.is_valid() {
            return Err(GeneratorError::InvalidMaterial);
        }
        match &self.kind {
            ShapeKind::Primitive(shape) => Ok(vec![shape.clone()]),
            ShapeKind::Playfield { height } => Ok(vec![ColliderShape::Plane(Plane::horizontal(*height))]),
            ShapeKind::Mesh { mesh, transform } => generator::mesh_to_shapes(&mesh.transformed(transform)),
            ShapeKind::WireGuide(params) => generator::mesh_to_shapes(&params.generate()?),
        }
    }
}

/// An item that was dropped while building the store
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Index of the rejected descriptor
    pub item: ItemIndex,
    /// Name of the rejected descriptor
    pub name: String,
    /// Reason
    pub error: GeneratorError,
}

/// Immutable collider table
#[derive(Debug, Default)]
pub struct ColliderStore {
    colliders: Vec<Collider>,
    diagnostics: Vec<Diagnostic>,
}

impl ColliderStore {
    /// Build the store from item descriptors
    ///
    /// The result depends only on `items`; descriptors are processed in order
    /// and colliders of one item get consecutive ids.
    pub fn build(items: &[ShapeDescriptor]) -> Self {
        let stopwatch = Stopwatch::start_new();
        let mut colliders = Vec::new();
        let mut diagnostics = Vec::new();

        for (item, descriptor) in items.iter().enumerate() {
            let first_id = colliders.len();
            let generated = descriptor.shapes().and_then(|shapes| {
                shapes
                    .into_iter()
                    .enumerate()
                    .map(|(offset, shape)| {
                        let id = ColliderId((first_id + offset) as u32);
                        Collider::new(id, item, shape, descriptor.material, descriptor.is_trigger)
                            .map_err(GeneratorError::from)
                    })
                    .collect::<Result<Vec<_>, _>>()
            });

            match generated {
                Ok(item_colliders) => colliders.extend(item_colliders),
                Err(error) => {
                    log::warn!("Dropping item {} '{}': {}", item, descriptor.name, error);
                    diagnostics.push(Diagnostic { item, name: descriptor.name.clone(), error });
                }
            }
        }

        log::info!(
            "Built {} colliders from {} items ({} rejected) in {:.2} ms",
            colliders.len(),
            items.len(),
            diagnostics.len(),
            stopwatch.elapsed_millis()
        );

        Self { colliders, diagnostics }
    }

    /// Look up a collider by id
    pub fn get(&self, id: ColliderId) -> Option<&Collider> {
        self.colliders.get(id.index())
    }

    /// All colliders, ordered by id
    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }

    /// Iterate over all colliders
    pub fn iter(&self) -> std::slice::Iter<'_, Collider> {
        self.colliders.iter()
    }

    /// Number of colliders
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Whether the store holds no collider
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }

    /// Items rejected during the build
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of colliders of one type
    pub fn count_of(&self, collider_type: ColliderType) -> usize {
        self.colliders.iter().filter(|c| c.collider_type() == collider_type).count()
    }

    /// `(id, bounds)` pairs for spatial indexing
    pub fn bounds(&self) -> impl Iterator<Item = (ColliderId, AABB)> + '_ {
        self.colliders.iter().map(|c| (c.id(), c.bounds()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec2, Vec3};
    use crate::physics::collider::{GeometryError, Line, Point};

    fn wall(x: f32) -> ShapeDescriptor {
        ShapeDescriptor::primitive(
            format!("wall{x}"),
            ColliderShape::Line(Line::new(Vec2::new(x, 0.0), Vec2::new(x, 1.0), 0.0, 0.1)),
        )
    }

    #[test]
    fn test_ids_are_sequential_and_match_index() {
        let store = ColliderStore::build(&[wall(0.0), wall(1.0), wall(2.0)]);
        assert_eq!(store.len(), 3);
        for (index, collider) in store.iter().enumerate() {
            assert_eq!(collider.id().index(), index);
            assert_eq!(collider.item(), index);
        }
    }

    #[test]
    fn test_degenerate_item_is_dropped_with_diagnostic() {
        let broken = ShapeDescriptor::primitive(
            "nan post",
            ColliderShape::Point(Point::new(Vec3::new(f32::NAN, 0.0, 0.0))),
        );
        let zero = ShapeDescriptor::primitive(
            "zero wall",
            ColliderShape::Line(Line::new(Vec2::zeros(), Vec2::zeros(), 0.0, 1.0)),
        );
        let store = ColliderStore::build(&[wall(0.0), broken, zero, wall(1.0)]);

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(ColliderId(1)).map(Collider::item), Some(3));
        assert_eq!(store.diagnostics().len(), 2);
        assert_eq!(store.diagnostics()[0].item, 1);
        assert_eq!(
            store.diagnostics()[0].error,
            GeneratorError::Geometry(GeometryError::NonFinite("point"))
        );
        assert_eq!(store.diagnostics()[1].name, "zero wall");
    }

    #[test]
    fn test_invalid_material_rejects_item() {
        let bad = wall(0.0).with_material(PhysicsMaterial::new(0.1, 2.0));
        let store = ColliderStore::build(&[bad]);
        assert!(store.is_empty());
        assert_eq!(store.diagnostics()[0].error, GeneratorError::InvalidMaterial);
    }

    #[test]
    fn test_wire_guide_item_expands_to_many_colliders() {
        let guide = ShapeDescriptor::new(
            "guide",
            ShapeKind::WireGuide(WireGuideParams::new(vec![Vec2::zeros(), Vec2::new(0.3, 0.0)])),
        );
        let store = ColliderStore::build(&[
            ShapeDescriptor::new("playfield", ShapeKind::Playfield { height: 0.0 }),
            guide,
        ]);
        assert_eq!(store.count_of(ColliderType::Plane), 1);
        assert!(store.count_of(ColliderType::Triangle) > 0);
        assert!(store.count_of(ColliderType::Line3D) > 0);
        assert!(store.count_of(ColliderType::Point) > 0);
        assert!(store.iter().skip(1).all(|c| c.item() == 1));
    }

    #[test]
    fn test_build_is_deterministic() {
        let items = vec![
            wall(0.0),
            ShapeDescriptor::new(
                "guide",
                ShapeKind::WireGuide(WireGuideParams::new(vec![Vec2::zeros(), Vec2::new(0.2, 0.1), Vec2::new(0.4, 0.0)])),
            ),
        ];
        let a = ColliderStore::build(&items);
        let b = ColliderStore::build(&items);
        assert_eq!(a.colliders(), b.colliders());
    }

    #[test]
    fn test_trigger_flag_propagates() {
        let store = ColliderStore::build(&[wall(0.0).as_trigger()]);
        assert!(store.get(ColliderId(0)).unwrap().is_trigger());
    }
}
