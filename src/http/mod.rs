//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request id, trace, body limit, CORS; request deadline)
//!     → request.rs (request id, JSON decode into an OperationRequest)
//!     → routing::OperationRouter::dispatch
//!     → response.rs (success / error envelope)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, X_REQUEST_ID};
pub use server::HttpServer;
