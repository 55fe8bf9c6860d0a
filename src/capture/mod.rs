//! Media-library asset capture.
//!
//! # Data Flow
//! ```text
//! Interceptor (installed by CaptureSession)
//!     → CaptureSink::observe(url, body)      URL filter + JSON decode
//!     → extract::extract_assets              response-shape heuristics
//!     → AssetStore                           unique by asset id, first-seen order
//!     → export::export_with_fallback         primary target, else fallback
//! ```
//!
//! `dom` covers the second capture path: card snapshots of a rendered
//! library page instead of intercepted responses.

pub mod asset;
pub mod dom;
pub mod export;
pub mod extract;
pub mod session;

use thiserror::Error;

pub use asset::{AssetRecord, AssetStore};
pub use export::{export_with_fallback, ExportTarget, FileTarget, StdoutTarget};
pub use session::{CaptureSession, CaptureSink, CaptureToggle, Interceptor, ReplayInterceptor, ToggleOutcome};

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("interceptor already installed")]
    AlreadyInstalled,

    #[error("failed to write to {target}: {source}")]
    Write {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("export failed: {primary}; fallback failed: {fallback}")]
    Export {
        primary: Box<CaptureError>,
        fallback: Box<CaptureError>,
    },

    #[error("failed to encode assets: {0}")]
    Encode(#[from] serde_json::Error),
}
