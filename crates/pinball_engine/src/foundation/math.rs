//! Math utilities and types
//!
//! Provides the fundamental math types used by the physics core. All types are
//! single precision; the simulation relies on the exact same sequence of `f32`
//! operations on every run to stay reproducible.

use serde::{Deserialize, Serialize};

pub use nalgebra::{
    Vector2, Vector3,
    Matrix4,
    Quaternion,
    Unit,
    UnitQuaternion,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Transform representing position, rotation, and scale
///
/// Used to place generated item meshes (wire guides, custom meshes) into
/// table space before colliders are derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,

    /// Rotation quaternion
    pub rotation: Quat,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Whether this transform leaves points untouched
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.to_matrix().transform_point(&Point3::from(point)).coords
    }

    /// Whether the transform mirrors geometry (negative scale determinant)
    ///
    /// A mirroring transform flips triangle winding.
    pub fn is_mirroring(&self) -> bool {
        self.scale.x * self.scale.y * self.scale.z < 0.0
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// True when every component is a finite number
    pub fn is_finite(v: &Vec3) -> bool {
        v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
    }

    /// Any unit vector perpendicular to `v` (which must be non-zero)
    pub fn any_perpendicular(v: &Vec3) -> Vec3 {
        let helper = if v.x.abs() < 0.9 { Vec3::x() } else { Vec3::y() };
        v.cross(&helper).normalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_transform_keeps_points() {
        let t = Transform::identity();
        let p = Vec3::new(1.0, -2.0, 3.0);
        assert!(t.is_identity());
        assert_relative_eq!(t.transform_point(p), p, epsilon = 1e-6);
    }

    #[test]
    fn test_transform_trs_order() {
        let rotation = Quat::from_axis_angle(&Vec3::z_axis(), constants::HALF_PI);
        let t = Transform {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation,
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        // scale, then rotate +X onto +Y, then translate
        let p = t.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Vec3::new(10.0, 2.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_mirroring_detection() {
        let mut t = Transform::identity();
        assert!(!t.is_mirroring());
        t.scale = Vec3::new(-1.0, 1.0, 1.0);
        assert!(t.is_mirroring());
    }

    #[test]
    fn test_any_perpendicular() {
        for v in [Vec3::x(), Vec3::y(), Vec3::new(0.3, -2.0, 5.0)] {
            let p = utils::any_perpendicular(&v);
            assert_relative_eq!(p.dot(&v), 0.0, epsilon = 1e-5);
            assert_relative_eq!(p.norm(), 1.0, epsilon = 1e-5);
        }
    }
}
