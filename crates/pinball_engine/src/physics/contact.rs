//! Narrow phase: earliest contact search and collision response

use crate::foundation::math::{utils, Quat, Unit, Vec3};
use crate::physics::ball::BallData;
use crate::physics::collider::{ColliderId, ColliderStore, Contact, PhysicsMaterial};

/// Earliest contact of a ball with a collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactHit {
    /// Collider touched
    pub collider: ColliderId,
    /// Contact geometry
    pub contact: Contact,
}

/// Cancel slow approach velocity against every surface the ball touches
///
/// A touching contact whose normal approach is below `resting_threshold` is a
/// resting contact: its normal velocity is removed and it takes no further
/// part in the step. Returns the number of contacts settled.
pub fn settle(store: &ColliderStore, candidates: &[ColliderId], ball: &mut BallData, resting_threshold: f32) -> usize {
    let mut settled = 0;
    for collider in candidates.iter().filter_map(|&id| store.get(id)) {
        if collider.is_trigger() {
            continue;
        }
        // a window of zero only reports contacts that are already touching
        let Some(contact) = collider.time_of_contact(ball.position, ball.velocity, ball.radius, 0.0) else {
            continue;
        };
        let normal_speed = ball.velocity.dot(&contact.normal);
        if normal_speed < 0.0 && -normal_speed < resting_threshold {
            ball.velocity -= contact.normal * normal_speed;
            settled += 1;
        }
    }
    settled
}

/// Earliest contact among `candidates` within `[0, dt]`
///
/// Triggers are ignored, as are contacts approaching slower than
/// `resting_threshold` (see [`settle`]). Equal contact times resolve to the
/// lower collider id.
pub fn find_earliest(
    store: &ColliderStore,
    candidates: &[ColliderId],
    ball: &BallData,
    dt: f32,
    resting_threshold: f32,
) -> Option<ContactHit> {
    candidates
        .iter()
        .filter_map(|&id| store.get(id))
        .filter(|collider| !collider.is_trigger())
        .filter_map(|collider| {
            collider
                .time_of_contact(ball.position, ball.velocity, ball.radius, dt)
                .map(|contact| ContactHit { collider: collider.id(), contact })
        })
        .filter(|hit| -ball.velocity.dot(&hit.contact.normal) >= resting_threshold)
        .min_by(|a, b| {
            a.contact
                .time
                .total_cmp(&b.contact.time)
                .then(a.collider.cmp(&b.collider))
        })
}

/// Outcome of a collision response
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    /// The ball bounced; carries the normal approach speed
    Bounce(f32),
    /// Approach too slow to bounce; normal velocity removed
    Resting,
    /// The ball was already moving away
    Separating,
}

/// Apply the impulse of a contact to the ball
///
/// `scatter` in `[-1, 1]` picks the deflection within the material's scatter
/// angle.
pub fn resolve(
    ball: &mut BallData,
    contact: &Contact,
    material: &PhysicsMaterial,
    resting_threshold: f32,
    scatter: f32,
) -> Response {
    let normal = contact.normal;
    let normal_speed = ball.velocity.dot(&normal);
    if normal_speed >= 0.0 {
        return Response::Separating;
    }

    let impact_speed = -normal_speed;
    if impact_speed < resting_threshold {
        ball.velocity -= normal * normal_speed;
        return Response::Resting;
    }

    let elasticity = material.elasticity_at(impact_speed);
    let normal_impulse = ball.mass * (1.0 + elasticity) * impact_speed;
    ball.velocity += normal * ((1.0 + elasticity) * impact_speed);

    apply_friction(ball, &normal, material.friction * normal_impulse);

    if scatter != 0.0 && material.scatter_angle_deg > 0.0 {
        let angle = utils::deg_to_rad(material.scatter_angle_deg) * scatter.clamp(-1.0, 1.0);
        let rotation = Quat::from_axis_angle(&Unit::new_normalize(normal), angle);
        ball.velocity = rotation * ball.velocity;
    }

    Response::Bounce(impact_speed)
}

/// Tangential impulse at the contact point, limited by `max_impulse`
fn apply_friction(ball: &mut BallData, normal: &Vec3, max_impulse: f32) {
    if max_impulse <= 0.0 {
        return;
    }

    // from the ball center to the contact point
    let arm = -normal * ball.radius;
    let contact_velocity = ball.velocity + ball.angular_velocity.cross(&arm);
    let slip = contact_velocity - normal * contact_velocity.dot(normal);
    let slip_speed = slip.norm();
    if slip_speed <= f32::EPSILON {
        return;
    }
    let tangent = slip / slip_speed;

    // effective mass of a solid sphere at its surface: 2/7 m
    let effective_mass = 1.0 / (1.0 / ball.mass + ball.radius * ball.radius / ball.inertia());
    let impulse = -tangent * (slip_speed * effective_mass).min(max_impulse);

    ball.velocity += impulse / ball.mass;
    ball.angular_velocity += arm.cross(&impulse) / ball.inertia();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::ball::BallId;
    use crate::physics::collider::{ColliderShape, Line, Plane, ShapeDescriptor};
    use crate::foundation::math::Vec2;
    use approx::assert_relative_eq;

    fn floor_contact() -> Contact {
        Contact { time: 0.0, normal: Vec3::z(), point: Vec3::zeros() }
    }

    fn ball(velocity: Vec3) -> BallData {
        BallData::new(BallId(0), Vec3::new(0.0, 0.0, 0.5))
            .with_size(0.5, 1.0)
            .with_velocity(velocity)
    }

    #[test]
    fn test_bounce_restitution() {
        let mut b = ball(Vec3::new(0.0, 0.0, -2.0));
        let response = resolve(&mut b, &floor_contact(), &PhysicsMaterial::new(0.0, 0.5), 0.05, 0.0);
        assert_eq!(response, Response::Bounce(2.0));
        assert_relative_eq!(b.velocity, Vec3::new(0.0, 0.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_slow_contact_rests() {
        let mut b = ball(Vec3::new(1.0, 0.0, -0.01));
        let response = resolve(&mut b, &floor_contact(), &PhysicsMaterial::new(0.0, 0.5), 0.05, 0.0);
        assert_eq!(response, Response::Resting);
        assert_relative_eq!(b.velocity, Vec3::new(1.0, 0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn test_separating_ball_is_untouched() {
        let mut b = ball(Vec3::new(0.0, 0.0, 1.0));
        let response = resolve(&mut b, &floor_contact(), &PhysicsMaterial::default(), 0.05, 0.0);
        assert_eq!(response, Response::Separating);
        assert_eq!(b.velocity, Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_friction_spins_ball() {
        let mut b = ball(Vec3::new(1.0, 0.0, -2.0));
        resolve(&mut b, &floor_contact(), &PhysicsMaterial::new(0.5, 0.0), 0.05, 0.0);
        // sliding along +X over a floor rolls the ball about +Y
        assert!(b.velocity.x < 1.0);
        assert!(b.angular_velocity.y > 0.0);
        // full grip reached: contact point no longer slips
        let slip = b.velocity + b.angular_velocity.cross(&(-Vec3::z() * b.radius));
        assert_relative_eq!(slip.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(b.velocity.x, 5.0 / 7.0, epsilon = 1e-5);
    }

    #[test]
    fn test_scatter_keeps_speed() {
        let material = PhysicsMaterial::new(0.0, 1.0).with_scatter(30.0);
        let mut straight = ball(Vec3::new(1.0, 0.0, -2.0));
        let mut scattered = straight.clone();
        resolve(&mut straight, &floor_contact(), &material, 0.05, 0.0);
        resolve(&mut scattered, &floor_contact(), &material, 0.05, 1.0);
        assert_relative_eq!(straight.velocity.norm(), scattered.velocity.norm(), epsilon = 1e-5);
        assert_relative_eq!(straight.velocity.z, scattered.velocity.z, epsilon = 1e-5);
        assert!(scattered.velocity.y.abs() > 0.1);
    }

    #[test]
    fn test_earliest_contact_tie_breaks_on_lower_id() {
        // two identical walls: same contact time
        let line = ColliderShape::Line(Line::new(Vec2::new(1.0, -1.0), Vec2::new(1.0, 1.0), -1.0, 1.0));
        let store = ColliderStore::build(&[
            ShapeDescriptor::primitive("far", ColliderShape::Plane(Plane::horizontal(-10.0))),
            ShapeDescriptor::primitive("a", line.clone()),
            ShapeDescriptor::primitive("b", line),
        ]);
        // a line running +Y faces +X
        let b = BallData::new(BallId(0), Vec3::new(3.0, 0.0, 0.0))
            .with_size(0.5, 1.0)
            .with_velocity(Vec3::new(-4.0, 0.0, 0.0));

        let hit = find_earliest(&store, &[ColliderId(2), ColliderId(0), ColliderId(1)], &b, 1.0, 0.05).unwrap();
        assert_eq!(hit.collider, ColliderId(1));
        assert_relative_eq!(hit.contact.time, 0.375, epsilon = 1e-6);
    }

    #[test]
    fn test_triggers_never_resolve() {
        let store = ColliderStore::build(&[
            ShapeDescriptor::primitive("floor", ColliderShape::Plane(Plane::horizontal(0.0))).as_trigger(),
        ]);
        let b = ball(Vec3::new(0.0, 0.0, -2.0));
        assert!(find_earliest(&store, &[ColliderId(0)], &b, 1.0, 0.05).is_none());
    }

    fn floor_and_wall() -> ColliderStore {
        // wall along x = 0 facing +X
        ColliderStore::build(&[
            ShapeDescriptor::primitive("floor", ColliderShape::Plane(Plane::horizontal(0.0))),
            ShapeDescriptor::primitive(
                "wall",
                ColliderShape::Line(Line::new(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0), -1.0, 1.0)),
            ),
        ])
    }

    #[test]
    fn test_settle_removes_slow_normal_velocity() {
        let store = floor_and_wall();
        let mut b = BallData::new(BallId(0), Vec3::new(0.5, 0.0, 0.0135)).with_velocity(Vec3::new(-1.0, 0.0, -0.01));
        assert_eq!(settle(&store, &[ColliderId(0), ColliderId(1)], &mut b, 0.05), 1);
        assert_relative_eq!(b.velocity, Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_settle_leaves_fast_impacts_alone() {
        let store = floor_and_wall();
        let mut b = BallData::new(BallId(0), Vec3::new(0.5, 0.0, 0.0135)).with_velocity(Vec3::new(0.0, 0.0, -2.0));
        assert_eq!(settle(&store, &[ColliderId(0)], &mut b, 0.05), 0);
        assert_relative_eq!(b.velocity, Vec3::new(0.0, 0.0, -2.0));
    }

    #[test]
    fn test_resting_floor_does_not_hide_wall() {
        let store = floor_and_wall();
        // touching the floor and sinking slowly, about to reach the wall
        let b = BallData::new(BallId(0), Vec3::new(0.0135 + 0.0005, 0.0, 0.0135))
            .with_velocity(Vec3::new(-1.0, 0.0, -0.005));

        let hit = find_earliest(&store, &[ColliderId(0), ColliderId(1)], &b, 0.001, 0.05).unwrap();
        assert_eq!(hit.collider, ColliderId(1));
        assert_relative_eq!(hit.contact.time, 0.0005, epsilon = 1e-6);
    }
}
