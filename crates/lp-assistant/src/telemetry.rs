//! Tracing subscriber setup for host applications.

use tracing_subscriber::EnvFilter;

/// Install a JSON `tracing` subscriber filtered by `RUST_LOG`.
///
/// Returns an error if a global subscriber is already set.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "lp-assistant tracing initialized");
    Ok(())
}
