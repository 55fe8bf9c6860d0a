//! Caller credentials and LWA token exchange.
//!
//! # Data Flow
//! ```text
//! request.credentials
//!     → credentials.rs (all four fields present, before any network)
//!     → lwa.rs (refresh-token exchange, one call per invocation)
//!     → AccessToken (lives for one invocation, never cached)
//! ```

pub mod credentials;
pub mod lwa;

pub use credentials::{AccessToken, Credentials, ValidatedCredentials};
pub use lwa::LwaClient;
