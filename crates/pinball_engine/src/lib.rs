//! # Pinball Engine
//!
//! Deterministic, fixed-timestep ball physics for pinball tables.
//!
//! ## Features
//!
//! - **Collider generation**: planes, walls, triangles, edges and points,
//!   including tessellated wire guides and arbitrary render meshes
//! - **Broad phase**: static loose octree over collider bounds
//! - **Narrow phase**: swept-sphere time of contact, earliest contact per ball
//! - **Response**: restitution with falloff, Coulomb friction with spin,
//!   seeded scatter
//! - **Events**: timestamped hits and trigger enter/exit, drained by the host
//! - **Determinism**: identical inputs and step counts give bit-identical runs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pinball_engine::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let items = vec![
//!         ShapeDescriptor::new("playfield", ShapeKind::Playfield { height: 0.0 }),
//!         ShapeDescriptor::new(
//!             "guide",
//!             ShapeKind::WireGuide(WireGuideParams::new(vec![
//!                 Vec2::new(-0.1, 0.2),
//!                 Vec2::new(0.1, 0.3),
//!             ])),
//!         ),
//!     ];
//!     let bounds = AABB::new(Vec3::new(-0.3, -0.6, -0.1), Vec3::new(0.3, 0.6, 0.3));
//!     let balls = vec![BallData::new(BallId(0), Vec3::new(0.0, 0.0, 0.05))];
//!
//!     let mut sim = Simulation::new(PhysicsConfig::default(), &items, bounds, balls)?;
//!     for frame in 1..=60u64 {
//!         sim.tick(frame * 16_667)?;
//!         for event in sim.drain_events()? {
//!             log::info!("{:?} on collider {}", event.kind, event.collider_id);
//!         }
//!     }
//!     sim.dispose();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod events;
pub mod foundation;
pub mod physics;
pub mod simulation;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, PhysicsConfig},
        events::{EventData, EventKind, EventPayload},
        foundation::math::{Transform, Vec2, Vec3},
        physics::{
            collider::{ColliderShape, ColliderType, Line, Line3D, Plane, Point, Triangle},
            generator::{Mesh, WireGuideParams},
            BallData, BallId, BallTransform, ColliderId, ColliderStore, PhysicsMaterial, ShapeDescriptor,
            ShapeKind,
        },
        simulation::{BallVisual, Phase, Simulation, SimulationError},
        spatial::{Octree, OctreeConfig, AABB},
    };
}
