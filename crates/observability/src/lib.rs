//! Tracing/logging setup shared by every binary.

/// Log output formats and subscriber installation.
pub mod logging;

pub use logging::{LOG_FORMAT_ENV, LogFormat};

/// Initialize process-wide logging from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    logging::init(LogFormat::from_env());
}
