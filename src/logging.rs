//! Logging setup for binaries embedding the crate
//!
//! The library itself only emits `tracing` events; installing a subscriber is
//! left to the caller.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable whose directives override the configured level
pub const LOG_ENV: &str = "PKG_RELEASE_LOG";

/// Filter from `PKG_RELEASE_LOG`, falling back to `default_level`
pub fn env_filter(default_level: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .with_env_var(LOG_ENV)
        .from_env_lossy()
}

/// Install a stderr fmt subscriber. Returns false if one was already set.
pub fn init(default_level: LevelFilter) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
