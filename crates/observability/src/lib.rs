//! Process-wide logging setup shared by the API binary and tests.

pub mod tracing;

pub use self::tracing::{LogFormat, LogSettings};

/// Initialize logging from the environment (`RUST_LOG`, `LOG_FORMAT`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    self::tracing::init(LogSettings::from_env());
}
