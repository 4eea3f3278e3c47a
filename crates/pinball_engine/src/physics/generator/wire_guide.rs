//! Metal wire guide tessellation
//!
//! A wire guide is a thin round wire following a smooth curve through its
//! control points at `hit_height` above the playfield. Open guides bend down
//! at both ends and stand on the playfield. The hit shape is a tube with few
//! sides (6 by default), grown by `margin`.

use serde::{Deserialize, Serialize};

use crate::foundation::math::{constants, utils, Quat, Vec2, Vec3};
use crate::physics::collider::GeometryError;

use super::{GeneratorError, Mesh};

/// Below this distance consecutive centerline samples are merged
const MERGE_DISTANCE: f32 = 1.0e-5;

/// Wire guide parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireGuideParams {
    /// Control points in the playfield plane
    pub points: Vec<Vec2>,
    /// Wire diameter
    pub thickness: f32,
    /// Height of the playfield surface
    pub playfield_height: f32,
    /// Height of the wire center above the playfield
    pub hit_height: f32,
    /// Radius of the bends at open ends
    pub bend_radius: f32,
    /// Curve samples per control segment
    pub detail: u32,
    /// Sides of the tube cross-section
    pub sides: u32,
    /// Whether the curve is a closed loop
    pub closed: bool,
    /// Extra radius added to the wire for collision
    pub margin: f32,
}

impl Default for WireGuideParams {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            thickness: 0.003,
            playfield_height: 0.0,
            hit_height: 0.025,
            bend_radius: 0.01,
            detail: 8,
            sides: 6,
            closed: false,
            margin: 0.0,
        }
    }
}

/// Uniform Catmull-Rom interpolation between `p1` and `p2`
fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    (p1 * 2.0
        + (p2 - p0) * t
        + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
        + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * t3)
        * 0.5
}

impl WireGuideParams {
    /// Create parameters for a guide through `points`
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points, ..Default::default() }
    }

    /// Collision radius of the wire
    pub fn radius(&self) -> f32 {
        self.thickness * 0.5 + self.margin
    }

    fn validate(&self) -> Result<(), GeneratorError> {
        let required = if self.closed { 3 } else { 2 };
        if self.points.len() < required {
            return Err(GeneratorError::TooFewPoints { required, found: self.points.len() });
        }
        if !self.points.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
            return Err(GeometryError::NonFinite("wire guide point").into());
        }

        let checks = [
            ("thickness", self.thickness, self.thickness > 0.0),
            ("playfield_height", self.playfield_height, true),
            ("hit_height", self.hit_height, self.hit_height >= 0.0),
            ("bend_radius", self.bend_radius, self.bend_radius >= 0.0),
            ("margin", self.margin, self.margin >= 0.0),
        ];
        for (name, value, in_range) in checks {
            if !value.is_finite() || !in_range {
                return Err(GeneratorError::InvalidParameter { name, value });
            }
        }
        if self.sides < 3 {
            return Err(GeneratorError::InvalidParameter { name: "sides", value: self.sides as f32 });
        }
        if self.detail == 0 {
            return Err(GeneratorError::InvalidParameter { name: "detail", value: 0.0 });
        }
        Ok(())
    }

    /// Smooth curve through the control points at wire height
    fn centerline(&self) -> Result<Vec<Vec3>, GeneratorError> {
        let n = self.points.len();
        let z = self.playfield_height + self.hit_height;
        let segments = if self.closed { n } else { n - 1 };
        let point = |i: usize| self.points[i % n];

        let mut curve: Vec<Vec3> = Vec::with_capacity(segments * self.detail as usize + 1);
        let mut push = |p: Vec2| {
            let p = Vec3::new(p.x, p.y, z);
            if curve.last().map_or(true, |last| (p - last).norm() > MERGE_DISTANCE) {
                curve.push(p);
            }
        };

        for i in 0..segments {
            let (p0, p3) = if self.closed {
                (point(i + n - 1), point(i + 2))
            } else {
                (point(i.saturating_sub(1)), point((i + 2).min(n - 1)))
            };
            let (p1, p2) = (point(i), point(i + 1));
            for k in 0..self.detail {
                push(catmull_rom(p0, p1, p2, p3, k as f32 / self.detail as f32));
            }
        }
        if !self.closed {
            push(self.points[n - 1]);
        }

        if self.closed && curve.len() > 1 {
            if let (Some(first), Some(last)) = (curve.first(), curve.last()) {
                if (first - last).norm() <= MERGE_DISTANCE {
                    curve.pop();
                }
            }
        }

        let required = if self.closed { 3 } else { 2 };
        if curve.len() < required {
            return Err(GeneratorError::TooFewPoints { required, found: curve.len() });
        }
        Ok(curve)
    }

    /// Path of the wire center, including the bends and stands of open guides
    pub fn path(&self) -> Result<Vec<Vec3>, GeneratorError> {
        self.validate()?;
        let curve = self.centerline()?;
        if self.closed || self.hit_height <= MERGE_DISTANCE {
            return Ok(curve);
        }

        let last = curve.len() - 1;
        let start_dir = (curve[0] - curve[1]).normalize();
        let end_dir = (curve[last] - curve[last - 1]).normalize();

        let mut path = self.stand(curve[0], start_dir);
        path.extend_from_slice(&curve);
        let mut end = self.stand(curve[last], end_dir);
        end.reverse();
        path.extend(end);
        Ok(path)
    }

    /// Points from the playfield up to (excluding) `top`, where the wire leaves
    /// `top` horizontally in direction `-outward`
    fn stand(&self, top: Vec3, outward: Vec3) -> Vec<Vec3> {
        let r = self.bend_radius.min(self.hit_height);
        let steps = self.detail.max(2);
        let foot_xy = top + outward * r;
        let mut points = Vec::with_capacity(steps as usize + 1);

        if top.z - r > self.playfield_height + MERGE_DISTANCE || r <= MERGE_DISTANCE {
            points.push(Vec3::new(foot_xy.x, foot_xy.y, self.playfield_height));
        }
        if r > MERGE_DISTANCE {
            for s in 0..steps {
                let angle = s as f32 / steps as f32 * constants::HALF_PI;
                let p = top + outward * (r * angle.cos());
                points.push(Vec3::new(p.x, p.y, top.z - r + r * angle.sin()));
            }
        }
        points
    }

    /// Tessellate the guide into a tube mesh in clockwise render winding
    pub fn generate(&self) -> Result<Mesh, GeneratorError> {
        let path = self.path()?;
        let m = path.len();
        let sides = self.sides as usize;
        let radius = self.radius();

        let tangents: Vec<Vec3> = (0..m)
            .map(|i| {
                let (prev, next) = if self.closed {
                    (path[(i + m - 1) % m], path[(i + 1) % m])
                } else {
                    (path[i.saturating_sub(1)], path[(i + 1).min(m - 1)])
                };
                (next - prev).normalize()
            })
            .collect();

        // parallel transport frame along the path
        let mut vertices = Vec::with_capacity(m * sides);
        let mut normal = utils::any_perpendicular(&tangents[0]);
        for i in 0..m {
            if i > 0 {
                let rotation = Quat::rotation_between(&tangents[i - 1], &tangents[i]).unwrap_or_else(Quat::identity);
                let turned = rotation * normal;
                normal = (turned - tangents[i] * turned.dot(&tangents[i])).normalize();
            }
            let binormal = tangents[i].cross(&normal);
            for j in 0..sides {
                let angle = j as f32 / sides as f32 * 2.0 * constants::PI;
                vertices.push(path[i] + (normal * angle.cos() + binormal * angle.sin()) * radius);
            }
        }

        let rings = if self.closed { m } else { m - 1 };
        let mut indices = Vec::with_capacity(rings * sides * 6);
        for i in 0..rings {
            let next_ring = (i + 1) % m;
            for j in 0..sides {
                let j1 = (j + 1) % sides;
                let a = (i * sides + j) as u32;
                let b = (i * sides + j1) as u32;
                let c = (next_ring * sides + j) as u32;
                let d = (next_ring * sides + j1) as u32;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        Ok(Mesh::new(vertices, indices))
    }
}
