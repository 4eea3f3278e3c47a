//! Spatial partitioning data structures
//!
//! Provides the broad-phase index over static collider bounds.

mod aabb;
mod octree;

pub use aabb::AABB;
pub use octree::{Octree, OctreeConfig, OctreeItem, OctreeNode};
