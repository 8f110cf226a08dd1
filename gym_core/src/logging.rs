//! Tracing setup for the `gymlog` binary.
//!
//! Everything goes to stderr; stdout carries command output only. `-v`
//! flags pick the default level, and `GYMLOG_LOG` (an `EnvFilter`
//! directive such as `gym_core::state=trace`) overrides it.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "GYMLOG_LOG";

/// Default filter for a count of `-v` flags: warnings only, then info, then debug
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
