//! RelayMesh Logging
//!
//! One-call tracing setup shared by servicer daemons, aggregators, and
//! integration tests.
//!
//! ```no_run
//! use relaymesh_logging::{init, LogLevel};
//!
//! init(LogLevel::Debug);
//! // proof admission and tree builds now emit debug events
//! ```
//!
//! A set `RUST_LOG` always wins over the level passed here, so operators
//! can raise verbosity per target (`RUST_LOG=relaymesh_aggregator=trace`)
//! without touching code.

use std::fmt;

use tracing_subscriber::EnvFilter;

/// Default verbosity when `RUST_LOG` is unset.
///
/// `Info` keeps seal and commit events; `Debug` adds per-proof admission
/// and per-build tree shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        })
    }
}

/// Install the global subscriber at the given default level.
///
/// # Panics
///
/// Panics if a subscriber is already installed; use [`try_init`] where
/// that can happen.
pub fn init(level: LogLevel) {
    try_init(level).expect("logging already initialized");
}

/// Install the global subscriber, reporting an error instead of panicking
/// when one is already set.
///
/// Safe to call at the top of every test in a suite; only the first call
/// wins.
pub fn try_init(level: LogLevel) -> Result<(), String> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| e.to_string())
}
