//! Tracing/logging setup shared by every binary and test harness.

/// Initialize process-wide tracing from `settings`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(settings: &LogSettings) -> Result<(), InitError> {
    tracing::init(settings)
}

/// Tracing configuration (filters, output format).
pub mod tracing;

pub use self::tracing::{InitError, LogFormat, LogSettings};
