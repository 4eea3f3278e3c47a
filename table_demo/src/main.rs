//! Headless Table Demo
//!
//! Builds a small table and runs it against a simulated 60 Hz host clock:
//! - Playfield and four outer walls
//! - A wire guide arcing across the upper half
//! - A pyramid bumper generated from a render mesh
//! - A rollover trigger across the lower lane
//!
//! Pass a `.toml` or `.ron` physics config as the first argument to override
//! the defaults.

use std::collections::BTreeMap;

use pinball_engine::foundation::logging;
use pinball_engine::foundation::math::Quat;
use pinball_engine::prelude::*;

// Table settings
const TABLE_HALF_WIDTH: f32 = 0.25;
const TABLE_HALF_LENGTH: f32 = 0.5;
const WALL_HEIGHT: f32 = 0.05;

// Host clock
const FRAME_USEC: u64 = 16_667;
const RUN_SECONDS: u64 = 5;

/// Stand-in for a rendered ball
struct BallSprite {
    id: BallId,
    position: Vec3,
}

impl BallVisual for BallSprite {
    fn ball_id(&self) -> BallId {
        self.id
    }

    fn set_transform(&mut self, transform: &BallTransform) {
        self.position = transform.position;
    }
}

/// Outer walls, wound so that every wall faces the table interior
fn walls() -> Vec<ShapeDescriptor> {
    let (w, l) = (TABLE_HALF_WIDTH, TABLE_HALF_LENGTH);
    let corners = [
        ("left wall", Vec2::new(-w, -l), Vec2::new(-w, l)),
        ("bottom wall", Vec2::new(-w, l), Vec2::new(w, l)),
        ("right wall", Vec2::new(w, l), Vec2::new(w, -l)),
        ("top wall", Vec2::new(w, -l), Vec2::new(-w, -l)),
    ];
    corners
        .into_iter()
        .map(|(name, a, b)| {
            ShapeDescriptor::primitive(name, ColliderShape::Line(Line::new(a, b, 0.0, WALL_HEIGHT)))
                .with_material(PhysicsMaterial::new(0.2, 0.6))
        })
        .collect()
}

/// Square pyramid with its base on the playfield
fn pyramid_mesh(half_size: f32, height: f32) -> Mesh {
    let s = half_size;
    let vertices = vec![
        Vec3::new(-s, -s, 0.0),
        Vec3::new(s, -s, 0.0),
        Vec3::new(s, s, 0.0),
        Vec3::new(-s, s, 0.0),
        Vec3::new(0.0, 0.0, height),
    ];
    // Clockwise as seen from outside, like the render meshes
    let indices = vec![0, 4, 1, 1, 4, 2, 2, 4, 3, 3, 4, 0];
    Mesh::new(vertices, indices)
}

fn build_table() -> Vec<ShapeDescriptor> {
    let mut items = vec![ShapeDescriptor::new("playfield", ShapeKind::Playfield { height: 0.0 })
        .with_material(PhysicsMaterial::new(0.1, 0.25))];
    items.extend(walls());

    let mut guide = WireGuideParams::new(vec![
        Vec2::new(-0.18, -0.1),
        Vec2::new(-0.05, -0.3),
        Vec2::new(0.12, -0.35),
    ]);
    guide.hit_height = 0.02;
    items.push(
        ShapeDescriptor::new("upper guide", ShapeKind::WireGuide(guide))
            .with_material(PhysicsMaterial::new(0.05, 0.4)),
    );

    items.push(
        ShapeDescriptor::new(
            "bumper",
            ShapeKind::Mesh {
                mesh: pyramid_mesh(0.03, 0.04),
                transform: Transform::from_position_rotation(
                    Vec3::new(0.08, -0.15, 0.0),
                    Quat::from_euler_angles(0.0, 0.0, 0.4),
                ),
            },
        )
        .with_material(PhysicsMaterial::new(0.3, 0.9).with_elasticity_falloff(0.5).with_scatter(2.0)),
    );

    items.push(
        ShapeDescriptor::primitive(
            "lane rollover",
            ColliderShape::Line(Line::new(Vec2::new(0.05, 0.3), Vec2::new(-0.05, 0.3), 0.0, 0.02)),
        )
        .as_trigger(),
    );
    items
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init(log::LevelFilter::Info);

    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading physics config from {path}");
            PhysicsConfig::load_from_file(&path)?
        }
        None => PhysicsConfig::default().with_scatter_seed(7),
    };

    let items = build_table();
    let bounds = AABB::new(
        Vec3::new(-TABLE_HALF_WIDTH, -TABLE_HALF_LENGTH, -0.05),
        Vec3::new(TABLE_HALF_WIDTH, TABLE_HALF_LENGTH, 0.2),
    );
    let radius = 0.0135;
    let balls = vec![
        BallData::new(BallId(0), Vec3::new(0.2, 0.4, radius)).with_velocity(Vec3::new(0.0, -2.5, 0.0)),
        BallData::new(BallId(1), Vec3::new(-0.1, 0.0, radius)).with_velocity(Vec3::new(0.4, -0.8, 0.0)),
    ];
    let mut sprites: Vec<BallSprite> = balls
        .iter()
        .map(|ball| BallSprite { id: ball.id, position: ball.position })
        .collect();

    let mut sim = Simulation::new(config, &items, bounds, balls)?;
    for diagnostic in sim.diagnostics() {
        log::warn!("Dropped item {} ({}): {}", diagnostic.item, diagnostic.name, diagnostic.error);
    }

    let mut hits_per_item: BTreeMap<String, usize> = BTreeMap::new();
    let frames = RUN_SECONDS * 1_000_000 / FRAME_USEC;
    for frame in 1..=frames {
        sim.tick(frame * FRAME_USEC)?;
        sim.sync_visuals(&mut sprites)?;

        for event in sim.drain_events()? {
            let name = items.get(event.item).map_or("?", |item| item.name.as_str());
            match event.kind {
                EventKind::Hit => {
                    let speed = event.payload.map_or(0.0, |payload| payload.impact_speed);
                    log::debug!("{} hit {name} at {} us ({speed:.3} m/s)", event.ball_id, event.time_usec);
                    *hits_per_item.entry(name.to_string()).or_default() += 1;
                }
                EventKind::TriggerEnter => log::info!("{} entered {name} at {} us", event.ball_id, event.time_usec),
                EventKind::TriggerExit => log::info!("{} left {name} at {} us", event.ball_id, event.time_usec),
            }
        }

        if frame % 60 == 0 {
            for sprite in &sprites {
                log::info!(
                    "t={}s {}: ({:.3}, {:.3}, {:.3})",
                    frame / 60,
                    sprite.id,
                    sprite.position.x,
                    sprite.position.y,
                    sprite.position.z
                );
            }
        }
    }

    for (name, count) in &hits_per_item {
        log::info!("{name}: {count} hits");
    }
    log::info!("Ran {} steps", sim.state().steps_taken());
    sim.dispose();
    Ok(())
}
