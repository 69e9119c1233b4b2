//! Tracing subscriber setup for the CLI.
//!
//! Logs go to stderr so stdout stays clean for results. The filter comes from the
//! `TABLE_KEYS_LOG` environment variable (`EnvFilter` syntax) and defaults to `warn`.

use std::{io::IsTerminal, sync::Once};

use tracing_subscriber::{EnvFilter, filter::LevelFilter};

pub const LOG_ENV_VAR: &str = "TABLE_KEYS_LOG";

/// Installs the global subscriber. Safe to call more than once.
pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_writer(std::io::stderr)
            .with_ansi(std::io::stderr().is_terminal())
            .init();
    });
}

fn env_filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy()
}
