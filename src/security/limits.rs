//! Request body limits.

use tower_http::limit::RequestBodyLimitLayer;

use crate::config::SecurityConfig;

/// Layer rejecting bodies over the configured size with 413.
pub fn body_limit(config: &SecurityConfig) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(config.max_body_size)
}
