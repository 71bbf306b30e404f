//! HTTP server module.
//!
//! Exposes the engine as a REST API over axum. Handlers read snapshots from
//! the shared store, issue state transitions, and kick off background sync
//! passes; all derivation stays in the service layer.

#[cfg(feature = "http-server")]
pub mod handlers;

#[cfg(feature = "http-server")]
pub mod router;

#[cfg(feature = "http-server")]
pub mod state;

#[cfg(feature = "http-server")]
pub mod error;

#[cfg(feature = "http-server")]
pub mod dto;

#[cfg(feature = "http-server")]
pub use router::create_router;

#[cfg(feature = "http-server")]
pub use state::AppState;
