//! Simulation session
//!
//! A [`Simulation`] owns everything one running table needs: the collider
//! store, the octree, the balls, the clock and the event queue. The host calls
//! [`Simulation::tick`] with its wall clock once per frame, then
//! [`Simulation::sync_visuals`] and [`Simulation::drain_events`].
//!
//! ```no_run
//! use pinball_engine::prelude::*;
//!
//! let items = vec![ShapeDescriptor::new("playfield", ShapeKind::Playfield { height: 0.0 })];
//! let bounds = AABB::new(Vec3::new(-0.3, -0.6, -0.1), Vec3::new(0.3, 0.6, 0.3));
//! let balls = vec![BallData::new(BallId(0), Vec3::new(0.0, 0.0, 0.1))];
//!
//! let mut sim = Simulation::new(PhysicsConfig::default(), &items, bounds, balls)?;
//! sim.tick(16_667)?;
//! for event in sim.drain_events()? {
//!     println!("{:?}", event);
//! }
//! sim.dispose();
//! # Ok::<(), SimulationError>(())
//! ```

use std::collections::HashMap;

use crate::config::{ConfigError, PhysicsConfig};
use crate::events::{EventData, EventQueue};
use crate::foundation::time::Stopwatch;
use crate::physics::ball::{BallData, BallId, BallTransform};
use crate::physics::collider::{ColliderStore, Diagnostic, ShapeDescriptor};
use crate::physics::cycle::{self, BallContacts, StepContext};
use crate::physics::state::PhysicsState;
use crate::spatial::{Octree, AABB};

/// Simulation errors
#[derive(thiserror::Error, Debug)]
pub enum SimulationError {
    /// A ball id has no physics record
    #[error("no physics record for {0}")]
    UnknownBall(BallId),

    /// Two initial balls share an id
    #[error("{0} is registered twice")]
    DuplicateBall(BallId),

    /// An initial ball cannot be simulated
    #[error("{id} is invalid: {reason}")]
    InvalidBall {
        /// Ball id
        id: BallId,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Playfield bounds are empty or not finite
    #[error("invalid playfield bounds {0:?}")]
    InvalidBounds(AABB),

    /// The session was disposed
    #[error("simulation has been disposed")]
    Disposed,

    /// The session was aborted by an earlier fatal error
    #[error("simulation aborted: {0}")]
    Faulted(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Between host calls
    Idle,
    /// Running owed steps
    Stepping,
    /// Handing events to the host
    Draining,
    /// Aborted by a fatal error; only draining and disposal remain possible
    Faulted,
    /// Resources released
    Disposed,
}

/// Host-side representation of a ball
pub trait BallVisual {
    /// Id of the physics ball this visual follows
    fn ball_id(&self) -> BallId;

    /// Move the visual
    fn set_transform(&mut self, transform: &BallTransform);
}

/// Resources of a live session, in acquisition order
struct Session {
    store: ColliderStore,
    octree: Octree,
    balls: Vec<BallData>,
    contacts: Vec<BallContacts>,
    ball_index: HashMap<BallId, usize>,
    events: EventQueue,
}

impl Session {
    /// Release everything in reverse acquisition order
    fn release(self) {
        let Session { store, octree, balls, contacts, ball_index, events } = self;
        let pending = events.len();
        drop(events);
        if pending > 0 {
            log::debug!("Discarded {pending} undrained events");
        }
        drop(ball_index);
        drop(contacts);
        drop(balls);
        drop(octree);
        drop(store);
    }
}

/// A running table simulation
pub struct Simulation {
    config: PhysicsConfig,
    state: PhysicsState,
    phase: Phase,
    fault: Option<String>,
    diagnostics: Vec<Diagnostic>,
    session: Option<Session>,
}

impl Simulation {
    /// Build colliders and octree and register the balls
    ///
    /// The clock starts at host time 0. Items with invalid geometry are dropped
    /// and listed in [`Simulation::diagnostics`].
    pub fn new(
        config: PhysicsConfig,
        items: &[ShapeDescriptor],
        playfield_bounds: AABB,
        balls: Vec<BallData>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let extents = playfield_bounds.extents();
        if !playfield_bounds.is_valid() || extents.min() <= 0.0 {
            return Err(SimulationError::InvalidBounds(playfield_bounds));
        }

        let mut ball_index = HashMap::with_capacity(balls.len());
        for (index, ball) in balls.iter().enumerate() {
            if let Some(reason) = ball.invalid_reason() {
                return Err(SimulationError::InvalidBall { id: ball.id, reason });
            }
            if ball_index.insert(ball.id, index).is_some() {
                return Err(SimulationError::DuplicateBall(ball.id));
            }
        }

        log::info!("Initializing simulation with {} items and {} balls", items.len(), balls.len());

        let store = ColliderStore::build(items);
        let diagnostics = store.diagnostics().to_vec();

        let stopwatch = Stopwatch::start_new();
        let octree = Octree::build(playfield_bounds, config.octree.clone(), store.bounds());
        log::info!(
            "Built octree over {} colliders: {} nodes, depth {} in {:.2} ms",
            octree.item_count(),
            octree.node_count(),
            octree.depth(),
            stopwatch.elapsed_millis()
        );

        let state = PhysicsState::new(0, config.step_time_usec, config.gravity);
        let contacts = vec![BallContacts::default(); balls.len()];

        Ok(Self {
            config,
            state,
            phase: Phase::Idle,
            fault: None,
            diagnostics,
            session: Some(Session {
                store,
                octree,
                balls,
                contacts,
                ball_index,
                events: EventQueue::new(),
            }),
        })
    }

    fn live_session(&self) -> Result<&Session, SimulationError> {
        match self.phase {
            Phase::Disposed => Err(SimulationError::Disposed),
            _ => self.session.as_ref().ok_or(SimulationError::Disposed),
        }
    }

    fn check_not_faulted(&self) -> Result<(), SimulationError> {
        match (&self.phase, &self.fault) {
            (Phase::Faulted, Some(reason)) => Err(SimulationError::Faulted(reason.clone())),
            (Phase::Faulted, None) => Err(SimulationError::Faulted(String::new())),
            _ => Ok(()),
        }
    }

    /// Run every step owed up to host time `now_usec`
    ///
    /// Returns the number of steps run; a partial step is left for the next
    /// tick.
    pub fn tick(&mut self, now_usec: u64) -> Result<u64, SimulationError> {
        self.live_session()?;
        self.check_not_faulted()?;

        let owed = self.state.owed_steps(now_usec);
        if owed == 0 {
            return Ok(0);
        }

        self.phase = Phase::Stepping;
        let session = self.session.as_mut().ok_or(SimulationError::Disposed)?;
        let writer = session.events.writer();
        for _ in 0..owed {
            let ctx = StepContext {
                store: &session.store,
                octree: &session.octree,
                config: &self.config,
                state: &self.state,
            };
            let events = cycle::step(&mut session.balls, &mut session.contacts, &ctx);
            writer.send_all(events);
            self.state.advance();
        }
        self.phase = Phase::Idle;

        log::trace!("Ran {owed} steps, clock at {} us", self.state.current_frame_time());
        Ok(owed)
    }

    /// Take all events emitted since the last drain, in emission order
    pub fn drain_events(&mut self) -> Result<Vec<EventData>, SimulationError> {
        self.live_session()?;
        let previous = self.phase;
        self.phase = Phase::Draining;
        let events = self
            .session
            .as_mut()
            .map(|session| session.events.drain())
            .unwrap_or_default();
        self.phase = previous;
        Ok(events)
    }

    /// Copy ball transforms onto their visuals
    ///
    /// A visual whose ball has no physics record is a fatal inconsistency: the
    /// session is aborted and every later tick fails.
    pub fn sync_visuals<V: BallVisual>(&mut self, visuals: &mut [V]) -> Result<(), SimulationError> {
        self.live_session()?;
        self.check_not_faulted()?;

        let missing = {
            let session = self.live_session()?;
            visuals
                .iter()
                .map(BallVisual::ball_id)
                .find(|id| !session.ball_index.contains_key(id))
        };
        if let Some(id) = missing {
            let reason = format!("visual references {id} which has no physics record");
            log::error!("Aborting simulation: {reason}");
            self.phase = Phase::Faulted;
            self.fault = Some(reason);
            return Err(SimulationError::UnknownBall(id));
        }

        let session = self.live_session()?;
        for visual in visuals.iter_mut() {
            if let Some(&index) = session.ball_index.get(&visual.ball_id()) {
                visual.set_transform(&session.balls[index].transform());
            }
        }
        Ok(())
    }

    /// Current transform of one ball
    pub fn ball_transform(&self, id: BallId) -> Result<BallTransform, SimulationError> {
        self.ball(id).map(BallData::transform)
    }

    /// Physics record of one ball
    pub fn ball(&self, id: BallId) -> Result<&BallData, SimulationError> {
        let session = self.live_session()?;
        session
            .ball_index
            .get(&id)
            .map(|&index| &session.balls[index])
            .ok_or(SimulationError::UnknownBall(id))
    }

    /// All balls in registration order
    pub fn balls(&self) -> &[BallData] {
        self.session.as_ref().map(|session| session.balls.as_slice()).unwrap_or_default()
    }

    /// Collider table, until disposal
    pub fn colliders(&self) -> Option<&ColliderStore> {
        self.session.as_ref().map(|session| &session.store)
    }

    /// Broad-phase index, until disposal
    pub fn octree(&self) -> Option<&Octree> {
        self.session.as_ref().map(|session| &session.octree)
    }

    /// Items dropped while building colliders
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Clock state
    pub fn state(&self) -> &PhysicsState {
        &self.state
    }

    /// Session constants
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Release all resources; calling it again does nothing
    pub fn dispose(&mut self) {
        if let Some(session) = self.session.take() {
            session.release();
            log::info!("Simulation disposed after {} steps", self.state.steps_taken());
        }
        self.phase = Phase::Disposed;
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.dispose();
    }
}
