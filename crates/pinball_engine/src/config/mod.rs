//! Configuration system
//!
//! Physics constants for a simulation session. Every value here is fixed for
//! the lifetime of a session; nothing in the simulation reads from a
//! non-deterministic source.

pub use serde::{Serialize, Deserialize};

use crate::foundation::math::{utils, Vec3};
use crate::spatial::OctreeConfig;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its valid range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Standard gravitational acceleration in m/s²
pub const STANDARD_GRAVITY: f32 = 9.81;

/// Default playfield slope in degrees
pub const DEFAULT_SLOPE_DEG: f32 = 6.5;

/// # Physics Configuration
///
/// Simulation-wide constants. Distances are in meters, times in seconds except
/// where a field says microseconds. The playfield lies in the XY plane with +Z
/// pointing up and +Y running down the table towards the flippers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Fixed physics step in microseconds
    pub step_time_usec: u64,
    /// Constant gravity acceleration
    pub gravity: Vec3,
    /// Normal approach speed below which a contact is treated as resting
    /// (no bounce, no hit event)
    pub contact_velocity_threshold: f32,
    /// Seed for material scatter
    pub scatter_seed: u64,
    /// Broad-phase octree parameters
    pub octree: OctreeConfig,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            step_time_usec: 1000,
            gravity: Self::gravity_for_slope(DEFAULT_SLOPE_DEG, STANDARD_GRAVITY),
            contact_velocity_threshold: 0.05,
            scatter_seed: 0,
            octree: OctreeConfig::default(),
        }
    }
}

impl Config for PhysicsConfig {}

impl PhysicsConfig {
    /// Gravity vector for a playfield tilted by `slope_deg` towards the player
    pub fn gravity_for_slope(slope_deg: f32, strength: f32) -> Vec3 {
        let slope = utils::deg_to_rad(slope_deg);
        Vec3::new(0.0, slope.sin() * strength, -slope.cos() * strength)
    }

    /// Set the gravity vector
    pub fn with_gravity(mut self, gravity: Vec3) -> Self {
        self.gravity = gravity;
        self
    }

    /// Set the fixed step duration
    pub fn with_step_time_usec(mut self, step_time_usec: u64) -> Self {
        self.step_time_usec = step_time_usec;
        self
    }

    /// Set the scatter seed
    pub fn with_scatter_seed(mut self, seed: u64) -> Self {
        self.scatter_seed = seed;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_time_usec == 0 {
            return Err(ConfigError::Invalid("step_time_usec must be at least 1".to_string()));
        }
        if !utils::is_finite(&self.gravity) {
            return Err(ConfigError::Invalid(format!("gravity must be finite, got {:?}", self.gravity)));
        }
        if !(self.contact_velocity_threshold.is_finite() && self.contact_velocity_threshold >= 0.0) {
            return Err(ConfigError::Invalid(
                "contact_velocity_threshold must be a non-negative number".to_string(),
            ));
        }
        if self.octree.max_items_per_node == 0 {
            return Err(ConfigError::Invalid("octree.max_items_per_node must be at least 1".to_string()));
        }
        Ok(())
    }
}
