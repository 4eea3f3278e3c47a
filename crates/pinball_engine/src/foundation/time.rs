//! Time management utilities
//!
//! Simulation time is kept in integer microseconds so that clock arithmetic is
//! exact; conversion to seconds only happens at the float boundary.

use std::time::{Duration, Instant};

/// Microseconds per second
pub const USEC_PER_SEC: u64 = 1_000_000;

/// Convert a microsecond duration to seconds
pub fn usec_to_secs(usec: u64) -> f32 {
    (usec as f64 / USEC_PER_SEC as f64) as f32
}

/// Convert seconds to the nearest whole microsecond
pub fn secs_to_usec(secs: f64) -> u64 {
    (secs * USEC_PER_SEC as f64).round() as u64
}

/// Simple stopwatch for measuring elapsed time
///
/// Only used for diagnostics (build timings); never feeds the simulation.
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Reset the stopwatch to zero
    pub fn reset(&mut self) {
        self.start_time = None;
        self.elapsed = Duration::ZERO;
    }

    /// Restart the stopwatch (reset and start)
    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self.start_time.map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usec_conversion() {
        assert!((usec_to_secs(1000) - 0.001).abs() < 1e-9);
        assert_eq!(secs_to_usec(0.25), 250_000);
    }

    #[test]
    fn test_stopwatch_restart() {
        let mut sw = Stopwatch::start_new();
        sw.restart();
        assert!(sw.elapsed_millis() >= 0.0);
        sw.reset();
        assert_eq!(sw.elapsed(), Duration::ZERO);
    }
}
