//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Upstream call (token exchange excluded):
//!     → retries.rs (classify failure, decide whether to retry)
//!     → backoff.rs (delay before the next attempt)
//! ```
//!
//! # Design Decisions
//! - 4xx other than 429 is final; everything else is worth another attempt
//! - No jitter: delays are exactly base * 2^attempt
//! - Stateless: no retry budget shared between invocations

pub mod backoff;
pub mod retries;

pub use retries::{FailureClass, RetryClassify, RetryPolicy};
