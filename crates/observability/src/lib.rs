//! Logging setup shared by binaries, demos and integration tests.

/// Initialize process-wide logging with default settings.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&LogSettings::default());
}

/// Subscriber configuration (filters, output format).
pub mod tracing;

pub use tracing::{LogFormat, LogSettings};
