//! Selling Partner API access.
//!
//! # Data Flow
//! ```text
//! handler builds SpApiRequest (method, path segments, query, JSON body)
//!     → client.rs (regional endpoint, access token header, retry policy)
//!     → SpApiResponse or RelayError::Upstream / Transport
//! ```

pub mod client;
pub mod marketplace;

pub use client::{SpApiClient, SpApiRequest, SpApiResponse};
pub use marketplace::Region;
