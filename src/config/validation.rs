//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. All errors are
//! collected so an operator sees every problem in one pass.

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.proxy.response_timeout_secs == 0 {
        errors.push(ValidationError::new("proxy.response_timeout_secs", "must be greater than 0"));
    }

    if config.proxy.channel_capacity == 0 {
        errors.push(ValidationError::new("proxy.channel_capacity", "must be at least 1"));
    }

    if config.proxy.user_agent.trim().is_empty() {
        errors.push(ValidationError::new("proxy.user_agent", "must not be empty"));
    }

    if let Some(referer) = &config.proxy.referer {
        check_url(&mut errors, "proxy.referer", referer);
    }

    if config.metadata.search_page_size == 0 {
        errors.push(ValidationError::new("metadata.search_page_size", "must be at least 1"));
    }

    check_url(&mut errors, "metadata.innertube_base_url", &config.metadata.innertube_base_url);
    check_url(&mut errors, "video_info.endpoint", &config.video_info.endpoint);
    check_url(&mut errors, "suggest.endpoint", &config.suggest.endpoint);

    if config.extractor.binary.trim().is_empty() {
        errors.push(ValidationError::new("extractor.binary", "must not be empty"));
    }

    if config.extractor.timeout_secs == 0 {
        errors.push(ValidationError::new("extractor.timeout_secs", "must be greater than 0"));
    }

    if let Some(proxy_url) = &config.extractor.proxy_url {
        check_url(&mut errors, "extractor.proxy_url", proxy_url);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        Ok(parsed) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme: {}", parsed.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {e}"))),
    }
}
