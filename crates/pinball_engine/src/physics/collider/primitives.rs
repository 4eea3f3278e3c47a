//! Primitive collider shapes and swept-sphere contact algorithms
//!
//! Every shape answers three questions for the narrow phase:
//! - its bounding box (computed once, for the octree)
//! - the earliest time a sphere moving at constant velocity touches it
//! - the distance from a point to its surface (trigger overlap)
//!
//! Shapes are one-sided where a surface has an orientation (planes, walls,
//! triangles): a ball only collides when moving against the outward normal.
//! Mesh edges and points have no orientation.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{utils, Vec2, Vec3};
use crate::spatial::AABB;

/// Lengths below this are considered degenerate
pub const GEOMETRY_EPSILON: f32 = 1.0e-6;

/// Coordinate used for the unbounded sides of a plane's bounding box
pub const UNBOUNDED: f32 = f32::MAX;

/// Reasons a primitive is rejected at construction
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A coordinate or parameter is NaN or infinite
    #[error("non-finite coordinate in {0}")]
    NonFinite(&'static str),

    /// A segment's endpoints coincide
    #[error("zero-length segment in {0}")]
    ZeroLengthSegment(&'static str),

    /// A triangle's vertices are collinear
    #[error("triangle has zero area")]
    ZeroAreaTriangle,

    /// A plane normal of zero length
    #[error("plane normal has zero length")]
    ZeroNormal,

    /// Height range with `low > high`
    #[error("inverted height range {low}..{high}")]
    InvertedHeightRange {
        /// Lower bound
        low: f32,
        /// Upper bound
        high: f32,
    },

    /// A compound without parts
    #[error("compound collider has no parts")]
    EmptyCompound,
}

/// Result of a swept-sphere test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Time of contact in seconds from the start of the test window
    pub time: f32,
    /// Unit surface normal at the contact, pointing towards the ball center
    pub normal: Vec3,
    /// Contact point on the collider surface
    pub point: Vec3,
}

/// Solve the earliest `t >= 0` where `|p + v t| = radius`, given the
/// quadratic terms of a moving point against a surface at distance `radius`.
///
/// Returns `Some(0.0)` when already touching or overlapping while approaching.
fn earliest_root(p: &Vec3, v: &Vec3, radius: f32) -> Option<f32> {
    let qa = v.dot(v);
    let qb = 2.0 * p.dot(v);
    let qc = p.dot(p) - radius * radius;

    // receding or moving parallel
    if qb >= 0.0 {
        return None;
    }
    if qc <= 0.0 {
        return Some(0.0);
    }
    if qa < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
        return None;
    }

    let discriminant = qb * qb - 4.0 * qa * qc;
    if discriminant < 0.0 {
        return None;
    }
    Some((-qb - discriminant.sqrt()) / (2.0 * qa))
}

/// Time until a signed gap closes at the given approach speed
fn gap_closing_time(gap: f32, approach: f32, radius: f32) -> Option<f32> {
    // approach is the normal velocity; only negative values close the gap
    if approach >= 0.0 || gap < -radius {
        return None;
    }
    if gap <= 0.0 {
        Some(0.0)
    } else {
        Some(-gap / approach)
    }
}

/// Infinite plane `normal · x = distance`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// Unit normal (collision side)
    pub normal: Vec3,
    /// Distance from the origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a new plane, normalizing the normal
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.norm();
        if length > GEOMETRY_EPSILON {
            Self { normal: normal / length, distance: distance / length }
        } else {
            Self { normal, distance }
        }
    }

    /// Horizontal plane at height `z` facing up (playfield)
    pub fn horizontal(z: f32) -> Self {
        Self { normal: Vec3::z(), distance: z }
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) - self.distance
    }

    fn validate(&self) -> Result<(), GeometryError> {
        if !utils::is_finite(&self.normal) || !self.distance.is_finite() {
            return Err(GeometryError::NonFinite("plane"));
        }
        if (self.normal.norm() - 1.0).abs() > 1.0e-3 {
            return Err(GeometryError::ZeroNormal);
        }
        Ok(())
    }

    /// Planes are unbounded; an axis-aligned plane is flat on its axis
    fn bounds(&self) -> AABB {
        let mut min = Vec3::new(-UNBOUNDED, -UNBOUNDED, -UNBOUNDED);
        let mut max = Vec3::new(UNBOUNDED, UNBOUNDED, UNBOUNDED);
        for axis in 0..3 {
            let others_zero = (0..3).filter(|&i| i != axis).all(|i| self.normal[i] == 0.0);
            if others_zero && self.normal[axis] != 0.0 {
                let coordinate = self.distance / self.normal[axis];
                min[axis] = coordinate;
                max[axis] = coordinate;
            }
        }
        AABB { min, max }
    }

    fn time_of_contact(&self, center: Vec3, velocity: Vec3, radius: f32) -> Option<Contact> {
        let gap = self.distance_to_point(center) - radius;
        let time = gap_closing_time(gap, self.normal.dot(&velocity), radius)?;
        let hit = center + velocity * time;
        Some(Contact { time, normal: self.normal, point: hit - self.normal * radius })
    }
}

/// Vertical wall segment in the XY plane, between two heights
///
/// The collision side is the right-hand perpendicular of `v1 → v2`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// Start point
    pub v1: Vec2,
    /// End point
    pub v2: Vec2,
    /// Lowest ball center height that collides
    pub z_low: f32,
    /// Highest ball center height that collides
    pub z_high: f32,
}

impl Line {
    /// Create a new wall segment
    pub fn new(v1: Vec2, v2: Vec2, z_low: f32, z_high: f32) -> Self {
        Self { v1, v2, z_low, z_high }
    }

    fn length(&self) -> f32 {
        (self.v2 - self.v1).norm()
    }

    fn direction(&self) -> Vec2 {
        (self.v2 - self.v1) / self.length()
    }

    /// Outward unit normal
    pub fn normal(&self) -> Vec3 {
        let d = self.direction();
        Vec3::new(d.y, -d.x, 0.0)
    }

    fn validate(&self) -> Result<(), GeometryError> {
        let finite = [self.v1.x, self.v1.y, self.v2.x, self.v2.y, self.z_low, self.z_high]
            .iter()
            .all(|c| c.is_finite());
        if !finite {
            return Err(GeometryError::NonFinite("line"));
        }
        if self.length() <= GEOMETRY_EPSILON {
            return Err(GeometryError::ZeroLengthSegment("line"));
        }
        if self.z_low > self.z_high {
            return Err(GeometryError::InvertedHeightRange { low: self.z_low, high: self.z_high });
        }
        Ok(())
    }

    fn bounds(&self) -> AABB {
        AABB::new(
            Vec3::new(self.v1.x, self.v1.y, self.z_low),
            Vec3::new(self.v2.x, self.v2.y, self.z_high),
        )
    }

    fn time_of_contact(&self, center: Vec3, velocity: Vec3, radius: f32) -> Option<Contact> {
        let normal = self.normal();
        let offset = Vec3::new(center.x - self.v1.x, center.y - self.v1.y, 0.0);
        let gap = normal.dot(&offset) - radius;
        let time = gap_closing_time(gap, normal.dot(&velocity), radius)?;

        let hit = center + velocity * time;
        if hit.z < self.z_low || hit.z > self.z_high {
            return None;
        }
        let along = self.direction().dot(&(hit.xy() - self.v1));
        if along < 0.0 || along > self.length() {
            return None;
        }
        Some(Contact { time, normal, point: hit - normal * radius })
    }

    fn distance_to_point(&self, point: Vec3) -> f32 {
        let d = self.direction();
        let along = d.dot(&(point.xy() - self.v1)).clamp(0.0, self.length());
        let closest = self.v1 + d * along;
        let z = point.z.clamp(self.z_low, self.z_high);
        (point - Vec3::new(closest.x, closest.y, z)).norm()
    }
}

/// Segment in 3D space (edge of a mesh)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line3D {
    /// Start point
    pub v1: Vec3,
    /// End point
    pub v2: Vec3,
}

impl Line3D {
    /// Create a new 3D segment
    pub fn new(v1: Vec3, v2: Vec3) -> Self {
        Self { v1, v2 }
    }

    fn validate(&self) -> Result<(), GeometryError> {
        if !utils::is_finite(&self.v1) || !utils::is_finite(&self.v2) {
            return Err(GeometryError::NonFinite("line3d"));
        }
        if (self.v2 - self.v1).norm() <= GEOMETRY_EPSILON {
            return Err(GeometryError::ZeroLengthSegment("line3d"));
        }
        Ok(())
    }

    fn bounds(&self) -> AABB {
        AABB::new(self.v1, self.v2)
    }

    fn closest_point(&self, point: Vec3) -> Vec3 {
        let axis = self.v2 - self.v1;
        let t = (point - self.v1).dot(&axis) / axis.norm_squared();
        self.v1 + axis * t.clamp(0.0, 1.0)
    }

    /// Contact with the segment's side; the end caps belong to point colliders
    fn time_of_contact(&self, center: Vec3, velocity: Vec3, radius: f32) -> Option<Contact> {
        let axis = self.v2 - self.v1;
        let length = axis.norm();
        let d = axis / length;

        let p = center - self.v1;
        let p_perp = p - d * p.dot(&d);
        let v_perp = velocity - d * velocity.dot(&d);
        if p_perp.norm_squared() < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
            return None;
        }

        let time = earliest_root(&p_perp, &v_perp, radius)?;
        let hit = center + velocity * time;
        let along = (hit - self.v1).dot(&d);
        if along < 0.0 || along > length {
            return None;
        }
        let closest = self.v1 + d * along;
        let normal = (hit - closest).try_normalize(GEOMETRY_EPSILON)?;
        Some(Contact { time, normal, point: closest })
    }

    fn distance_to_point(&self, point: Vec3) -> f32 {
        (point - self.closest_point(point)).norm()
    }
}

/// A triangle for collision detection
///
/// Vertices are in counter-clockwise order seen from the collision side, so
/// the right-hand normal `(v1 - v0) × (v2 - v0)` points outwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    /// First vertex
    pub v0: Vec3,
    /// Second vertex
    pub v1: Vec3,
    /// Third vertex
    pub v2: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3) -> Self {
        Self { v0, v1, v2 }
    }

    /// Calculates the normal of the triangle (right-hand rule)
    pub fn normal(&self) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        edge1.cross(&edge2).normalize()
    }

    /// Calculates the centroid (center point) of the triangle
    pub fn centroid(&self) -> Vec3 {
        (self.v0 + self.v1 + self.v2) / 3.0
    }

    fn validate(&self) -> Result<(), GeometryError> {
        if ![self.v0, self.v1, self.v2].iter().all(utils::is_finite) {
            return Err(GeometryError::NonFinite("triangle"));
        }
        let doubled_area = (self.v1 - self.v0).cross(&(self.v2 - self.v0)).norm();
        if doubled_area <= GEOMETRY_EPSILON * GEOMETRY_EPSILON {
            return Err(GeometryError::ZeroAreaTriangle);
        }
        Ok(())
    }

    fn bounds(&self) -> AABB {
        AABB::new(self.v0, self.v1).union(&AABB::new(self.v2, self.v2))
    }

    /// Whether a point on the triangle's plane lies inside its edges
    fn contains_projected(&self, point: Vec3, normal: &Vec3) -> bool {
        let edges = [(self.v0, self.v1), (self.v1, self.v2), (self.v2, self.v0)];
        edges
            .iter()
            .all(|(a, b)| normal.dot(&(b - a).cross(&(point - a))) >= 0.0)
    }

    /// Contact with the face; edges and vertices are separate colliders
    fn time_of_contact(&self, center: Vec3, velocity: Vec3, radius: f32) -> Option<Contact> {
        let normal = self.normal();
        let gap = normal.dot(&(center - self.v0)) - radius;
        let time = gap_closing_time(gap, normal.dot(&velocity), radius)?;

        let hit = center + velocity * time;
        let point = hit - normal * (normal.dot(&(hit - self.v0)));
        if !self.contains_projected(point, &normal) {
            return None;
        }
        Some(Contact { time, normal, point })
    }

    /// Get the closest point on the triangle to a given point
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;
        let v0_to_point = point - self.v0;

        let d1 = edge1.dot(&v0_to_point);
        let d2 = edge2.dot(&v0_to_point);

        // Vertex region outside v0
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.v0;
        }

        // Vertex region outside v1
        let v1_to_point = point - self.v1;
        let d3 = edge1.dot(&v1_to_point);
        let d4 = edge2.dot(&v1_to_point);
        if d3 >= 0.0 && d4 <= d3 {
            return self.v1;
        }

        // Vertex region outside v2
        let v2_to_point = point - self.v2;
        let d5 = edge1.dot(&v2_to_point);
        let d6 = edge2.dot(&v2_to_point);
        if d6 >= 0.0 && d5 <= d6 {
            return self.v2;
        }

        // Edge regions
        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v_val = d1 / (d1 - d3);
            return self.v0 + edge1 * v_val;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return self.v0 + edge2 * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.v1 + (self.v2 - self.v1) * w;
        }

        // Inside the face
        let denom = 1.0 / (va + vb + vc);
        let v_val = vb * denom;
        let w = vc * denom;
        self.v0 + edge1 * v_val + edge2 * w
    }

    fn distance_to_point(&self, point: Vec3) -> f32 {
        (point - self.closest_point(point)).norm()
    }
}

/// A single vertex
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Position
    pub p: Vec3,
}

impl Point {
    /// Create a new point collider shape
    pub fn new(p: Vec3) -> Self {
        Self { p }
    }

    fn validate(&self) -> Result<(), GeometryError> {
        if utils::is_finite(&self.p) {
            Ok(())
        } else {
            Err(GeometryError::NonFinite("point"))
        }
    }

    fn bounds(&self) -> AABB {
        AABB::new(self.p, self.p)
    }

    fn time_of_contact(&self, center: Vec3, velocity: Vec3, radius: f32) -> Option<Contact> {
        let offset = center - self.p;
        if offset.norm_squared() < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
            return None;
        }
        let time = earliest_root(&offset, &velocity, radius)?;
        let hit = center + velocity * time;
        let normal = (hit - self.p).try_normalize(GEOMETRY_EPSILON)?;
        Some(Contact { time, normal, point: self.p })
    }
}

/// Discriminant of [`ColliderShape`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColliderType {
    /// Infinite plane
    Plane,
    /// Vertical wall segment
    Line,
    /// 3D segment (mesh edge)
    Line3D,
    /// Triangle face
    Triangle,
    /// Single vertex
    Point,
    /// Group of shapes sharing one id and material
    Compound,
}

/// Geometry of a collider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColliderShape {
    /// Infinite plane
    Plane(Plane),
    /// Vertical wall segment
    Line(Line),
    /// 3D segment (mesh edge)
    Line3D(Line3D),
    /// Triangle face
    Triangle(Triangle),
    /// Single vertex
    Point(Point),
    /// Several shapes acting as one collider
    Compound(Vec<ColliderShape>),
}

impl ColliderShape {
    /// Type tag of this shape
    pub fn collider_type(&self) -> ColliderType {
        match self {
            Self::Plane(_) => ColliderType::Plane,
            Self::Line(_) => ColliderType::Line,
            Self::Line3D(_) => ColliderType::Line3D,
            Self::Triangle(_) => ColliderType::Triangle,
            Self::Point(_) => ColliderType::Point,
            Self::Compound(_) => ColliderType::Compound,
        }
    }

    /// Reject degenerate or non-finite geometry
    pub fn validate(&self) -> Result<(), GeometryError> {
        match self {
            Self::Plane(plane) => plane.validate(),
            Self::Line(line) => line.validate(),
            Self::Line3D(line) => line.validate(),
            Self::Triangle(triangle) => triangle.validate(),
            Self::Point(point) => point.validate(),
            Self::Compound(parts) => {
                if parts.is_empty() {
                    return Err(GeometryError::EmptyCompound);
                }
                parts.iter().try_for_each(Self::validate)
            }
        }
    }

    /// Bounding box; only meaningful for validated shapes
    pub fn bounds(&self) -> AABB {
        match self {
            Self::Plane(plane) => plane.bounds(),
            Self::Line(line) => line.bounds(),
            Self::Line3D(line) => line.bounds(),
            Self::Triangle(triangle) => triangle.bounds(),
            Self::Point(point) => point.bounds(),
            Self::Compound(parts) => parts
                .iter()
                .map(Self::bounds)
                .reduce(|a, b| a.union(&b))
                .unwrap_or(AABB { min: Vec3::zeros(), max: Vec3::zeros() }),
        }
    }

    /// Earliest contact of a sphere moving at constant `velocity` within
    /// `[0, max_time]`
    pub fn time_of_contact(&self, center: Vec3, velocity: Vec3, radius: f32, max_time: f32) -> Option<Contact> {
        let contact = match self {
            Self::Plane(plane) => plane.time_of_contact(center, velocity, radius),
            Self::Line(line) => line.time_of_contact(center, velocity, radius),
            Self::Line3D(line) => line.time_of_contact(center, velocity, radius),
            Self::Triangle(triangle) => triangle.time_of_contact(center, velocity, radius),
            Self::Point(point) => point.time_of_contact(center, velocity, radius),
            Self::Compound(parts) => parts
                .iter()
                .filter_map(|part| part.time_of_contact(center, velocity, radius, max_time))
                .fold(None, |best: Option<Contact>, c| match best {
                    Some(b) if b.time <= c.time => Some(b),
                    _ => Some(c),
                }),
        }?;
        (contact.time <= max_time).then_some(contact)
    }

    /// Unsigned distance from a point to the surface
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        match self {
            Self::Plane(plane) => plane.distance_to_point(point).abs(),
            Self::Line(line) => line.distance_to_point(point),
            Self::Line3D(line) => line.distance_to_point(point),
            Self::Triangle(triangle) => triangle.distance_to_point(point),
            Self::Point(p) => (point - p.p).norm(),
            Self::Compound(parts) => parts
                .iter()
                .map(|part| part.distance_to_point(point))
                .fold(f32::INFINITY, f32::min),
        }
    }
}
