//! Process-wide logging setup shared by binaries, benches and tests.

/// Install the JSON log subscriber.
///
/// Safe to call multiple times; only the first call installs anything.
pub fn init() {
    tracing::init();
}

/// Subscriber configuration (filter, format).
pub mod tracing;
