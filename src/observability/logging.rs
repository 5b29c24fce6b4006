//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Honour `RUST_LOG`, falling back to the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directives for a log level, covering this crate and the HTTP stack.
pub fn default_directives(level: &str) -> String {
    format!("bifrost_gateway={level},stub_backend={level},tower_http={level}")
}

/// Install the global subscriber. Returns false when one was already set.
pub fn init(level: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directives(level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_parse() {
        let directives = default_directives("debug");
        assert!(directives.parse::<EnvFilter>().is_ok());
        assert!(directives.contains("tower_http=debug"));
    }
}
