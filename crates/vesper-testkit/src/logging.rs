//! Test log output.

use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test harness. Filtered by `RUST_LOG`,
/// `warn` when unset. Safe to call from every test.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
