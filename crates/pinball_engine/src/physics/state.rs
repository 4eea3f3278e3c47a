//! Simulation clock

use crate::foundation::math::Vec3;
use crate::foundation::time;

/// Persistent physics clock and session constants
///
/// All times are absolute microseconds on the host clock. The clock only
/// moves forward in whole steps, so `next_frame_time - current_frame_time`
/// always equals the step.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsState {
    start_time: u64,
    current_frame_time: u64,
    next_frame_time: u64,
    step_usec: u64,
    steps_taken: u64,
    gravity: Vec3,
}

impl PhysicsState {
    /// Start the clock at `start_time`
    pub fn new(start_time: u64, step_usec: u64, gravity: Vec3) -> Self {
        Self {
            start_time,
            current_frame_time: start_time,
            next_frame_time: start_time + step_usec,
            step_usec,
            steps_taken: 0,
            gravity,
        }
    }

    /// Host time the simulation started at
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// Start of the next step to simulate
    pub fn current_frame_time(&self) -> u64 {
        self.current_frame_time
    }

    /// End of the next step to simulate
    pub fn next_frame_time(&self) -> u64 {
        self.next_frame_time
    }

    /// Fixed step in microseconds
    pub fn step_usec(&self) -> u64 {
        self.step_usec
    }

    /// Fixed step in seconds
    pub fn step_secs(&self) -> f32 {
        time::usec_to_secs(self.step_usec)
    }

    /// Number of steps run since the start
    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    /// Constant gravity
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Whole steps between the clock and `now`; a partial step is not owed
    pub fn owed_steps(&self, now: u64) -> u64 {
        now.saturating_sub(self.current_frame_time) / self.step_usec
    }

    /// Host time of an offset into the current step
    pub fn time_in_step(&self, secs: f32) -> u64 {
        let offset = time::secs_to_usec(f64::from(secs.max(0.0)));
        self.current_frame_time + offset.min(self.step_usec)
    }

    /// Move the clock forward by exactly one step
    pub fn advance(&mut self) {
        self.current_frame_time = self.next_frame_time;
        self.next_frame_time += self.step_usec;
        self.steps_taken += 1;
    }
}
