//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges (timeouts > 0)
//! - Detect duplicate or malformed route prefixes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid listener address `{0}`")]
    ListenerAddress(String),

    #[error("invalid backend address `{0}`")]
    BackendAddress(String),

    #[error("route prefix `{0}` must start with `/`")]
    PrefixNotAbsolute(String),

    #[error("route prefix `{0}` must not end with `/`")]
    TrailingSlash(String),

    #[error("route prefix `{0}` is declared more than once")]
    DuplicatePrefix(String),

    #[error("no routes configured")]
    NoRoutes,

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("mount anchor must not be empty")]
    EmptyAnchor,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::ListenerAddress(
            config.listener.bind_address.clone(),
        ));
    }

    // Backend may be a hostname, so only require host:port shape.
    if !is_host_port(&config.backend.address) {
        errors.push(ValidationError::BackendAddress(config.backend.address.clone()));
    }

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }

    let mut seen = HashSet::new();
    for prefix in &config.routes {
        if !prefix.starts_with('/') {
            errors.push(ValidationError::PrefixNotAbsolute(prefix.clone()));
        } else if prefix.len() > 1 && prefix.ends_with('/') {
            errors.push(ValidationError::TrailingSlash(prefix.clone()));
        }
        if !seen.insert(prefix.as_str()) {
            errors.push(ValidationError::DuplicatePrefix(prefix.clone()));
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }
    if config.retries.enabled && config.retries.max_attempts == 0 {
        errors.push(ValidationError::ZeroValue("retries.max_attempts"));
    }

    if config.shell.anchor.trim().is_empty() {
        errors.push(ValidationError::EmptyAnchor);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn reports_every_error() {
        let mut config = GatewayConfig::default();
        config.backend.address = "localhost".into();
        config.routes.push("/query".into());
        config.routes.push("mqtt".into());
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::BackendAddress("localhost".into())));
        assert!(errors.contains(&ValidationError::DuplicatePrefix("/query".into())));
        assert!(errors.contains(&ValidationError::PrefixNotAbsolute("mqtt".into())));
        assert!(errors.contains(&ValidationError::ZeroValue("timeouts.request_secs")));
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn hostname_backend_is_accepted() {
        let mut config = GatewayConfig::default();
        config.backend.address = "backend.local:5001".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn trailing_slash_rejected() {
        let mut config = GatewayConfig::default();
        config.routes = vec!["/collections/".into()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::TrailingSlash("/collections/".into())]);
    }
}
