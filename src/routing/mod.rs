//! Operation routing subsystem.
//!
//! # Data Flow
//! ```text
//! OperationRequest (operation, marketplace, credentials, payload)
//!     → router.rs (log, validate credentials, registry lookup)
//!     → LWA token exchange
//!     → registry.rs (typed handler for the operation)
//!     → handler result merged into the success envelope
//!
//! Registry Compilation (at startup):
//!     every OperationKind → exactly one handler
//!     → validated, frozen behind Arc
//! ```
//!
//! # Design Decisions
//! - Exact-match lookup, no prefixes or aliases beyond declared kinds
//! - Unknown operations fail before any network call
//! - Registry immutable at runtime (thread-safe without locks)

pub mod registry;
pub mod router;

pub use registry::{OperationHandler, OperationKind, Registry, RegistryError};
pub use router::{OperationRequest, OperationRouter};
