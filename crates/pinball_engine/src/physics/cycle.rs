//! One fixed physics step over all balls
//!
//! Per ball, independently and in parallel:
//! 1. half gravity kick
//! 2. broad phase: octree query with the region swept during the step
//! 3. resting contacts: slow approach into touching surfaces is cancelled
//! 4. narrow phase: earliest real impact among the candidates
//! 5. drift to the contact, respond, drift for the rest of the step
//! 6. second half gravity kick
//! 7. trigger overlap diff against the previous step
//!
//! Results are collected in ball order and events are stably sorted by time,
//! so the outcome does not depend on thread scheduling.

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::PhysicsConfig;
use crate::events::{EventData, EventKind, EventPayload};
use crate::physics::ball::BallData;
use crate::physics::collider::{ColliderId, ColliderStore};
use crate::physics::contact::{self, Response};
use crate::physics::state::PhysicsState;
use crate::spatial::{Octree, AABB};

/// Extra slack around the swept region
const BROAD_PHASE_MARGIN: f32 = 1.0e-4;

/// Read-only inputs of a step
pub struct StepContext<'a> {
    /// Collider table
    pub store: &'a ColliderStore,
    /// Spatial index over `store`
    pub octree: &'a Octree,
    /// Session constants
    pub config: &'a PhysicsConfig,
    /// Clock at the start of the step
    pub state: &'a PhysicsState,
}

/// Per-ball state carried between steps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BallContacts {
    /// Triggers the ball overlapped at the end of the last step
    pub triggers: BTreeSet<ColliderId>,
}

/// Region a ball can reach within `dt`
pub fn swept_region(ball: &BallData, dt: f32) -> AABB {
    let reach = ball.radius + ball.velocity.norm() * dt + BROAD_PHASE_MARGIN;
    AABB::new(ball.position, ball.position).expanded(reach)
}

/// Deterministic scatter source for one ball in one step
fn scatter_rng(seed: u64, step: u64, ball: &BallData) -> ChaCha8Rng {
    let mixed = seed
        ^ step.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ u64::from(ball.id.0).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    ChaCha8Rng::seed_from_u64(mixed)
}

/// Advance every ball by one step and return the step's events in order
pub fn step(balls: &mut [BallData], contacts: &mut [BallContacts], ctx: &StepContext<'_>) -> Vec<EventData> {
    let per_ball: Vec<Vec<EventData>> = balls
        .par_iter_mut()
        .zip(contacts.par_iter_mut())
        .map(|(ball, ball_contacts)| step_ball(ball, ball_contacts, ctx))
        .collect();

    let mut events: Vec<EventData> = per_ball.into_iter().flatten().collect();
    events.sort_by_key(|event| event.time_usec);
    events
}

fn step_ball(ball: &mut BallData, contacts: &mut BallContacts, ctx: &StepContext<'_>) -> Vec<EventData> {
    let dt = ctx.state.step_secs();
    let gravity = ctx.state.gravity();
    let mut events = Vec::new();

    ball.accelerate(&gravity, dt * 0.5);

    let mut candidates = Vec::new();
    ctx.octree.query_into(&swept_region(ball, dt), &mut candidates);
    candidates.sort_unstable();

    let threshold = ctx.config.contact_velocity_threshold;
    contact::settle(ctx.store, &candidates, ball, threshold);

    match contact::find_earliest(ctx.store, &candidates, ball, dt, threshold) {
        Some(hit) => {
            ball.drift(hit.contact.time);

            if let Some(collider) = ctx.store.get(hit.collider) {
                let material = collider.material();
                let scatter = if material.scatter_angle_deg > 0.0 {
                    scatter_rng(ctx.config.scatter_seed, ctx.state.steps_taken(), ball).gen_range(-1.0..=1.0)
                } else {
                    0.0
                };

                let response = contact::resolve(ball, &hit.contact, material, threshold, scatter);
                if let Response::Bounce(impact_speed) = response {
                    log::trace!("{} hit collider {} at {:.4}s", ball.id, hit.collider, hit.contact.time);
                    events.push(
                        EventData::new(
                            EventKind::Hit,
                            hit.collider,
                            collider.item(),
                            ball.id,
                            ctx.state.time_in_step(hit.contact.time),
                        )
                        .with_payload(EventPayload {
                            impact_speed,
                            contact_point: hit.contact.point,
                            normal: hit.contact.normal,
                        }),
                    );
                }
            }

            ball.drift(dt - hit.contact.time);
        }
        None => ball.drift(dt),
    }

    ball.accelerate(&gravity, dt * 0.5);

    update_triggers(ball, contacts, &candidates, ctx, &mut events);
    events
}

/// Diff trigger overlaps against the previous step
fn update_triggers(
    ball: &BallData,
    contacts: &mut BallContacts,
    candidates: &[ColliderId],
    ctx: &StepContext<'_>,
    events: &mut Vec<EventData>,
) {
    let current: BTreeSet<ColliderId> = candidates
        .iter()
        .filter_map(|&id| ctx.store.get(id))
        .filter(|collider| collider.is_trigger() && collider.overlaps_sphere(ball.position, ball.radius))
        .map(|collider| collider.id())
        .collect();

    if current == contacts.triggers {
        return;
    }

    let time = ctx.state.next_frame_time();
    let mut emit = |kind, id: ColliderId| {
        let item = ctx.store.get(id).map_or(0, |collider| collider.item());
        events.push(EventData::new(kind, id, item, ball.id, time));
    };
    for &id in current.difference(&contacts.triggers) {
        emit(EventKind::TriggerEnter, id);
    }
    for &id in contacts.triggers.difference(&current) {
        emit(EventKind::TriggerExit, id);
    }

    contacts.triggers = current;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec2, Vec3};
    use crate::physics::ball::BallId;
    use crate::physics::collider::{ColliderShape, Line, PhysicsMaterial, Plane, Point, ShapeDescriptor, ShapeKind};
    use approx::assert_relative_eq;

    struct Fixture {
        store: ColliderStore,
        octree: Octree,
        config: PhysicsConfig,
        state: PhysicsState,
    }

    impl Fixture {
        fn new(items: &[ShapeDescriptor], config: PhysicsConfig) -> Self {
            let store = ColliderStore::build(items);
            let bounds = AABB::new(Vec3::new(-2.0, -2.0, -2.0), Vec3::new(2.0, 2.0, 2.0));
            let octree = Octree::build(bounds, config.octree.clone(), store.bounds());
            let state = PhysicsState::new(0, config.step_time_usec, config.gravity);
            Self { store, octree, config, state }
        }

        fn step(&mut self, balls: &mut [BallData], contacts: &mut [BallContacts]) -> Vec<EventData> {
            let ctx = StepContext {
                store: &self.store,
                octree: &self.octree,
                config: &self.config,
                state: &self.state,
            };
            let events = step(balls, contacts, &ctx);
            self.state.advance();
            events
        }
    }

    fn zero_gravity() -> PhysicsConfig {
        PhysicsConfig::default().with_gravity(Vec3::zeros())
    }

    #[test]
    fn test_swept_region_covers_motion() {
        let ball = BallData::new(BallId(0), Vec3::zeros()).with_velocity(Vec3::new(10.0, 0.0, 0.0));
        let region = swept_region(&ball, 0.001);
        assert!(region.contains_point(Vec3::new(0.01 + ball.radius, 0.0, 0.0)));
    }

    #[test]
    fn test_hit_event_carries_payload_and_time() {
        // wall at x = 0 facing +X; ball travels 0.01 per step and touches at mid-step
        let wall = ShapeDescriptor::primitive(
            "wall",
            ColliderShape::Line(Line::new(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0), -1.0, 1.0)),
        )
        .with_material(PhysicsMaterial::new(0.0, 1.0));
        let mut fixture = Fixture::new(&[wall], zero_gravity());
        let radius = BallData::DEFAULT_RADIUS;
        let mut balls = [BallData::new(BallId(7), Vec3::new(radius + 0.005, 0.0, 0.0))
            .with_velocity(Vec3::new(-10.0, 0.0, 0.0))];
        let mut contacts = [BallContacts::default()];

        let events = fixture.step(&mut balls, &mut contacts);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Hit);
        assert_eq!(events[0].ball_id, BallId(7));
        assert_eq!(events[0].time_usec, 500);
        let payload = events[0].payload.unwrap();
        assert_relative_eq!(payload.impact_speed, 10.0, epsilon = 1e-4);
        assert_relative_eq!(payload.normal, Vec3::x(), epsilon = 1e-6);

        // fully elastic: reflected and back where it started
        assert_relative_eq!(balls[0].velocity, Vec3::new(10.0, 0.0, 0.0), epsilon = 1e-4);
        assert_relative_eq!(balls[0].position.x, radius + 0.005, epsilon = 1e-5);
    }

    #[test]
    fn test_resting_ball_on_floor_stays_quiet() {
        let floor = ShapeDescriptor::new("floor", ShapeKind::Playfield { height: 0.0 });
        let config = PhysicsConfig::default().with_gravity(Vec3::new(0.0, 0.0, -9.81));
        let mut fixture = Fixture::new(&[floor], config);
        let mut balls = [BallData::new(BallId(0), Vec3::new(0.0, 0.0, BallData::DEFAULT_RADIUS))];
        let mut contacts = [BallContacts::default()];

        for _ in 0..100 {
            assert!(fixture.step(&mut balls, &mut contacts).is_empty());
        }
        assert!(balls[0].position.z > BallData::DEFAULT_RADIUS - 1e-3);
    }

    #[test]
    fn test_trigger_enter_and_exit() {
        let sensor = ShapeDescriptor::primitive("sensor", ColliderShape::Point(Point::new(Vec3::zeros()))).as_trigger();
        let mut fixture = Fixture::new(&[sensor], zero_gravity());
        let radius = BallData::DEFAULT_RADIUS;
        // crosses the sensor within a few steps at 10 m/s
        let mut balls = [BallData::new(BallId(1), Vec3::new(-radius - 0.015, 0.0, 0.0))
            .with_velocity(Vec3::new(10.0, 0.0, 0.0))];
        let mut contacts = [BallContacts::default()];

        let mut kinds = Vec::new();
        for _ in 0..10 {
            for event in fixture.step(&mut balls, &mut contacts) {
                assert_eq!(event.collider_id, ColliderId(0));
                kinds.push(event.kind);
            }
        }
        assert_eq!(kinds, vec![EventKind::TriggerEnter, EventKind::TriggerExit]);
        // never deflected
        assert_relative_eq!(balls[0].velocity, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_events_sorted_by_time_across_balls() {
        let wall = ShapeDescriptor::primitive(
            "wall",
            ColliderShape::Line(Line::new(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0), -1.0, 1.0)),
        );
        let mut fixture = Fixture::new(&[wall], zero_gravity());
        let r = BallData::DEFAULT_RADIUS;
        // ball 0 touches late in the step, ball 1 early
        let mut balls = [
            BallData::new(BallId(0), Vec3::new(r + 0.008, 0.5, 0.0)).with_velocity(Vec3::new(-10.0, 0.0, 0.0)),
            BallData::new(BallId(1), Vec3::new(r + 0.002, -0.5, 0.0)).with_velocity(Vec3::new(-10.0, 0.0, 0.0)),
        ];
        let mut contacts = [BallContacts::default(), BallContacts::default()];
        let events = fixture.step(&mut balls, &mut contacts);
        let ids: Vec<BallId> = events.iter().map(|e| e.ball_id).collect();
        assert_eq!(ids, vec![BallId(1), BallId(0)]);
    }

    #[test]
    fn test_unused_plane_far_away_is_ignored() {
        let far = ShapeDescriptor::primitive("far", ColliderShape::Plane(Plane::horizontal(-1.0)));
        let mut fixture = Fixture::new(&[far], zero_gravity());
        let mut balls = [BallData::new(BallId(0), Vec3::zeros()).with_velocity(Vec3::new(0.0, 0.0, -1.0))];
        let mut contacts = [BallContacts::default()];
        assert!(fixture.step(&mut balls, &mut contacts).is_empty());
        assert_relative_eq!(balls[0].position.z, -0.001, epsilon = 1e-7);
    }

    /// Playfield plus a wall along `y = 0.2` (normal -Y) and one along `x = 0` (normal +X)
    fn playfield_with_walls() -> Vec<ShapeDescriptor> {
        vec![
            ShapeDescriptor::new("playfield", ShapeKind::Playfield { height: 0.0 }),
            ShapeDescriptor::primitive(
                "side wall",
                ColliderShape::Line(Line::new(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0), 0.0, 0.1)),
            ),
            ShapeDescriptor::primitive(
                "bottom wall",
                ColliderShape::Line(Line::new(Vec2::new(-1.0, 0.2), Vec2::new(1.0, 0.2), 0.0, 0.1)),
            ),
        ]
    }

    #[test]
    fn test_rolling_ball_hits_wall_under_gravity() {
        let config = PhysicsConfig::default().with_gravity(Vec3::new(0.0, 0.0, -9.81));
        let mut fixture = Fixture::new(&playfield_with_walls(), config);
        let r = BallData::DEFAULT_RADIUS;
        let mut balls = [BallData::new(BallId(0), Vec3::new(0.05, 0.0, r)).with_velocity(Vec3::new(-1.0, 0.0, 0.0))];
        let mut contacts = [BallContacts::default()];

        let mut hits = Vec::new();
        for _ in 0..200 {
            for event in fixture.step(&mut balls, &mut contacts) {
                assert_eq!(event.kind, EventKind::Hit);
                hits.push(event.collider_id);
            }
            assert!(balls[0].position.x >= r - 1e-4, "ball entered the wall at x = {}", balls[0].position.x);
        }

        // the floor contact is resting and never reported
        assert_eq!(hits, vec![ColliderId(1)]);
        assert!(balls[0].velocity.x > 0.0);
        assert_relative_eq!(balls[0].position.z, r, epsilon = 1e-4);
    }

    #[test]
    fn test_ball_rolls_down_tilted_playfield_into_wall() {
        let mut fixture = Fixture::new(&playfield_with_walls(), PhysicsConfig::default());
        let r = BallData::DEFAULT_RADIUS;
        let mut balls = [BallData::new(BallId(0), Vec3::new(0.1, 0.0, r))];
        let mut contacts = [BallContacts::default()];

        let mut wall_hits = 0;
        for _ in 0..1500 {
            for event in fixture.step(&mut balls, &mut contacts) {
                if event.kind == EventKind::Hit {
                    assert_eq!(event.collider_id, ColliderId(2));
                    wall_hits += 1;
                }
            }
            let p = balls[0].position;
            assert!(p.y <= 0.2 - r + 1e-3, "ball passed the bottom wall at y = {}", p.y);
            assert!(p.z >= r - 1e-3, "ball sank into the playfield at z = {}", p.z);
        }

        assert!(wall_hits >= 1);
        // settled against the wall
        assert_relative_eq!(balls[0].position.y, 0.2 - r, epsilon = 1e-3);
    }
}
