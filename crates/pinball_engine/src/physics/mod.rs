//! Ball physics against static table geometry
//!
//! Colliders are generated once, indexed in an octree and never change.
//! Balls are integrated in fixed steps by [`cycle::step`].

pub mod ball;
pub mod collider;
pub mod contact;
pub mod cycle;
pub mod generator;
pub mod state;

pub use ball::{BallData, BallId, BallTransform};
pub use collider::{Collider, ColliderId, ColliderShape, ColliderStore, PhysicsMaterial, ShapeDescriptor, ShapeKind};
pub use state::PhysicsState;
