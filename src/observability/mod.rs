//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, per-invocation spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON lines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows into every log line of an invocation via a span
//! - Secrets (tokens, client secrets) never reach a log field
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
