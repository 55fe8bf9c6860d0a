//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (reject oversized bodies with 413)
//!     → Pass to handler
//! Outgoing response:
//!     → headers.rs (CORS headers on every response, preflight included)
//! ```
//!
//! # Design Decisions
//! - Any origin may call; the caller's credentials travel in the body
//! - Limits enforced before the body is buffered

pub mod headers;
pub mod limits;
