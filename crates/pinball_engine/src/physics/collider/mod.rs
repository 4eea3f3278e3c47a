//! Collider records
//!
//! A collider is an immutable piece of static table geometry with a stable id,
//! the index of the game item it belongs to, a material and a precomputed
//! bounding box. Construction validates the geometry, so a [`Collider`] value
//! is never degenerate.

pub mod primitives;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::math::Vec3;
use crate::spatial::AABB;

pub use primitives::{
    ColliderShape, ColliderType, Contact, GeometryError, Line, Line3D, Plane, Point, Triangle,
};
pub use store::{ColliderStore, Diagnostic, ShapeDescriptor, ShapeKind};

/// Stable collider identifier, unique within one simulation
///
/// Ids are assigned sequentially at build time and equal the collider's index
/// in the [`ColliderStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColliderId(pub u32);

impl ColliderId {
    /// Position in the collider store
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ColliderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of the descriptor (game item) a collider was generated from
pub type ItemIndex = usize;

/// Reference speed for elasticity falloff, in m/s
pub const ELASTICITY_FALLOFF_SPEED: f32 = 1.0;

/// Surface response parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsMaterial {
    /// Coulomb friction coefficient
    pub friction: f32,
    /// Coefficient of restitution at low speed, in `[0, 1]`
    pub elasticity: f32,
    /// How fast elasticity decays with impact speed (0 disables)
    pub elasticity_falloff: f32,
    /// Maximum random deflection of the rebound, in degrees
    pub scatter_angle_deg: f32,
}

impl Default for PhysicsMaterial {
    fn default() -> Self {
        Self {
            friction: 0.3,
            elasticity: 0.3,
            elasticity_falloff: 0.0,
            scatter_angle_deg: 0.0,
        }
    }
}

impl PhysicsMaterial {
    /// Create a material without falloff or scatter
    pub fn new(friction: f32, elasticity: f32) -> Self {
        Self { friction, elasticity, ..Default::default() }
    }

    /// Set elasticity falloff
    pub fn with_elasticity_falloff(mut self, falloff: f32) -> Self {
        self.elasticity_falloff = falloff;
        self
    }

    /// Set scatter angle in degrees
    pub fn with_scatter(mut self, angle_deg: f32) -> Self {
        self.scatter_angle_deg = angle_deg;
        self
    }

    /// Effective elasticity for an impact at `speed`
    pub fn elasticity_at(&self, speed: f32) -> f32 {
        let e = if self.elasticity_falloff > 0.0 {
            self.elasticity / (1.0 + self.elasticity_falloff * speed / ELASTICITY_FALLOFF_SPEED)
        } else {
            self.elasticity
        };
        e.clamp(0.0, 1.0)
    }

    /// Whether every parameter is finite and in range
    pub fn is_valid(&self) -> bool {
        let values = [self.friction, self.elasticity, self.elasticity_falloff, self.scatter_angle_deg];
        values.iter().all(|v| v.is_finite() && *v >= 0.0) && self.elasticity <= 1.0
    }
}

/// Static collider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    id: ColliderId,
    item: ItemIndex,
    material: PhysicsMaterial,
    is_trigger: bool,
    shape: ColliderShape,
    bounds: AABB,
}

impl Collider {
    /// Validate the shape and precompute its bounds
    pub fn new(
        id: ColliderId,
        item: ItemIndex,
        shape: ColliderShape,
        material: PhysicsMaterial,
        is_trigger: bool,
    ) -> Result<Self, GeometryError> {
        shape.validate()?;
        let bounds = shape.bounds();
        Ok(Self { id, item, material, is_trigger, shape, bounds })
    }

    /// Collider id
    pub fn id(&self) -> ColliderId {
        self.id
    }

    /// Index of the owning game item
    pub fn item(&self) -> ItemIndex {
        self.item
    }

    /// Surface material
    pub fn material(&self) -> &PhysicsMaterial {
        &self.material
    }

    /// Triggers report overlap but never deflect a ball
    pub fn is_trigger(&self) -> bool {
        self.is_trigger
    }

    /// Geometry
    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    /// Type tag
    pub fn collider_type(&self) -> ColliderType {
        self.shape.collider_type()
    }

    /// Precomputed bounding box
    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    /// Earliest contact with a moving sphere within `[0, max_time]`
    pub fn time_of_contact(&self, center: Vec3, velocity: Vec3, radius: f32, max_time: f32) -> Option<Contact> {
        self.shape.time_of_contact(center, velocity, radius, max_time)
    }

    /// Whether a sphere overlaps the collider surface
    pub fn overlaps_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.shape.distance_to_point(center) <= radius
    }
}
