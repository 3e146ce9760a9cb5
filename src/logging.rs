//! Tracing setup
//!
//! Logs go to stderr so answers on stdout stay clean.

use tracing_subscriber::EnvFilter;

/// Pick the filter: `RUST_LOG` wins, then the verbosity flag, then the config default
pub fn filter_directive(flag_level: Option<&str>, config_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(flag_level.unwrap_or(config_level)))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(flag_level: Option<&str>, config_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_directive(flag_level, config_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
