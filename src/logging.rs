// ABOUTME: tracing subscriber setup for the CLI
// ABOUTME: RUST_LOG wins over MAKTAB_LOG_LEVEL; output goes to stderr

use std::env;
use tracing_subscriber::EnvFilter;

pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let level = env::var("MAKTAB_LOG_LEVEL")
        .unwrap_or_else(|_| default_level.to_string())
        .to_lowercase();

    let filter = match env::var("RUST_LOG") {
        Ok(rust_log) => EnvFilter::new(rust_log),
        Err(_) => EnvFilter::new(level),
    };

    // try_init: tests and repeated calls must not panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
