//! SP-API relay library.
//!
//! Receives one JSON request per invocation, validates the caller's LWA
//! credentials, exchanges them for an access token and dispatches to the
//! registered operation handler, answering with a uniform envelope.

pub mod auth;
pub mod capture;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod operations;
pub mod resilience;
pub mod routing;
pub mod security;
pub mod spapi;

pub use config::schema::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
