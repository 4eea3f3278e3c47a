//! Physics event queue
//!
//! Events are produced by the physics cycle and consumed by the host:
//! - appended in emission order by any number of writers
//! - drained by the single owner of the queue, each event exactly once
//! - nothing is dropped between drains; the queue grows without bound

use crossbeam_channel::{Receiver, Sender};

use crate::foundation::math::Vec3;
use crate::physics::ball::BallId;
use crate::physics::collider::{ColliderId, ItemIndex};

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Ball bounced off a solid collider
    Hit,
    /// Ball started overlapping a trigger
    TriggerEnter,
    /// Ball stopped overlapping a trigger
    TriggerExit,
}

/// Impact details of a hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventPayload {
    /// Normal approach speed before the bounce
    pub impact_speed: f32,
    /// Contact point on the collider
    pub contact_point: Vec3,
    /// Surface normal at the contact
    pub normal: Vec3,
}

/// A timestamped physics event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventData {
    /// Type of event
    pub kind: EventKind,
    /// Collider involved
    pub collider_id: ColliderId,
    /// Game item owning the collider
    pub item: ItemIndex,
    /// Ball involved
    pub ball_id: BallId,
    /// Host time in microseconds
    pub time_usec: u64,
    /// Impact details, for hits
    pub payload: Option<EventPayload>,
}

impl EventData {
    /// Create an event without payload
    pub fn new(kind: EventKind, collider_id: ColliderId, item: ItemIndex, ball_id: BallId, time_usec: u64) -> Self {
        Self { kind, collider_id, item, ball_id, time_usec, payload: None }
    }

    /// Attach impact details
    pub fn with_payload(mut self, payload: EventPayload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Producer handle of an [`EventQueue`]
#[derive(Debug, Clone)]
pub struct EventWriter {
    sender: Sender<EventData>,
}

impl EventWriter {
    /// Append an event
    pub fn send(&self, event: EventData) {
        if self.sender.send(event).is_err() {
            log::trace!("Event queue closed, dropping {:?}", event.kind);
        }
    }

    /// Append events, keeping their order
    pub fn send_all(&self, events: impl IntoIterator<Item = EventData>) {
        for event in events {
            self.send(event);
        }
    }
}

/// Multi-producer, single-consumer event queue
#[derive(Debug)]
pub struct EventQueue {
    writer: EventWriter,
    receiver: Receiver<EventData>,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            writer: EventWriter { sender },
            receiver,
        }
    }

    /// A new producer handle
    pub fn writer(&self) -> EventWriter {
        self.writer.clone()
    }

    /// Append an event
    pub fn push(&self, event: EventData) {
        self.writer.send(event);
    }

    /// Take every queued event, in emission order
    pub fn drain(&mut self) -> Vec<EventData> {
        self.receiver.try_iter().collect()
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Whether no event is queued
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
