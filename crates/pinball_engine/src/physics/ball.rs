//! Ball kinematic state and integration

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Quat, Transform, Vec3};

/// Angular speeds below this do not rotate the ball
const MIN_ANGULAR_SPEED: f32 = 1.0e-6;

/// Stable ball identifier, the key between physics and visuals
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BallId(pub u32);

impl fmt::Display for BallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ball {}", self.0)
    }
}

/// Per-ball physics state, owned by the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallData {
    /// Ball id
    pub id: BallId,
    /// Center position
    pub position: Vec3,
    /// Linear velocity
    pub velocity: Vec3,
    /// Angular velocity (axis times rad/s)
    pub angular_velocity: Vec3,
    /// Accumulated rotation
    pub orientation: Quat,
    /// Radius
    pub radius: f32,
    /// Mass
    pub mass: f32,
}

impl BallData {
    /// Standard pinball radius in meters (1 1/16")
    pub const DEFAULT_RADIUS: f32 = 0.0135;

    /// Standard pinball mass in kilograms
    pub const DEFAULT_MASS: f32 = 0.08;

    /// Create a ball at rest
    pub fn new(id: BallId, position: Vec3) -> Self {
        Self {
            id,
            position,
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            orientation: Quat::identity(),
            radius: Self::DEFAULT_RADIUS,
            mass: Self::DEFAULT_MASS,
        }
    }

    /// Set the linear velocity
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Set the angular velocity
    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    /// Set radius and mass
    pub fn with_size(mut self, radius: f32, mass: f32) -> Self {
        self.radius = radius;
        self.mass = mass;
        self
    }

    /// Reason this ball cannot be simulated, if any
    pub fn invalid_reason(&self) -> Option<&'static str> {
        if !utils::is_finite(&self.position) {
            Some("position is not finite")
        } else if !utils::is_finite(&self.velocity) || !utils::is_finite(&self.angular_velocity) {
            Some("velocity is not finite")
        } else if !(self.radius.is_finite() && self.radius > 0.0) {
            Some("radius must be positive")
        } else if !(self.mass.is_finite() && self.mass > 0.0) {
            Some("mass must be positive")
        } else {
            None
        }
    }

    /// Moment of inertia of a solid sphere
    pub fn inertia(&self) -> f32 {
        0.4 * self.mass * self.radius * self.radius
    }

    /// Apply a constant acceleration for `dt`
    pub fn accelerate(&mut self, acceleration: &Vec3, dt: f32) {
        self.velocity += acceleration * dt;
    }

    /// Move at constant linear and angular velocity for `dt`
    pub fn drift(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.position += self.velocity * dt;
        if self.angular_velocity.norm() > MIN_ANGULAR_SPEED {
            self.orientation = Quat::from_scaled_axis(self.angular_velocity * dt) * self.orientation;
        }
    }

    /// Current visual transform
    pub fn transform(&self) -> BallTransform {
        BallTransform {
            id: self.id,
            position: self.position,
            orientation: self.orientation,
            radius: self.radius,
        }
    }
}

/// Placement of a ball's visual representation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallTransform {
    /// Ball id
    pub id: BallId,
    /// Center position
    pub position: Vec3,
    /// Rotation
    pub orientation: Quat,
    /// Radius
    pub radius: f32,
}

impl BallTransform {
    /// Transform of a unit-radius sphere mesh
    pub fn to_transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: self.orientation,
            scale: Vec3::new(self.radius, self.radius, self.radius),
        }
    }
}
