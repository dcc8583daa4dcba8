//! Tracing and logging setup shared by every process.

pub mod tracing;

pub use self::tracing::{LogConfig, LogFormat};

/// Initialize process-wide logging from the environment.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() -> anyhow::Result<()> {
    let config = LogConfig::from_env()?;
    self::tracing::init(&config);
    Ok(())
}
