//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
///
/// `RUST_LOG` overrides `default_level`. Only binaries should call this; the
/// library itself just emits through `log`.
pub fn init(default_level: log::LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(default_level)
        .parse_default_env()
        .init();
}
