//! Error types for the trace engine.
//!
//! Failures inside a synchronization pass are captured per-entity as a
//! `failed` freshness status rather than propagated; these types carry the
//! message that ends up on the freshness record.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Error taxonomy for data fetching and derivation.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Fetch failed or the backend returned a non-success response.
    #[error("network error: {0}")]
    Network(String),

    /// Unexpected shape in dependency data, e.g. missing coordinates
    /// for a required location.
    #[error("computation error: {0}")]
    Computation(String),

    /// User-supplied time range or user id fails invariants.
    #[error("validation error: {0}")]
    Validation(String),
}

impl EngineError {
    /// Convenience constructor for network failures.
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Convenience constructor for computation failures.
    pub fn computation(msg: impl Into<String>) -> Self {
        Self::Computation(msg.into())
    }

    /// Convenience constructor for validation failures.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
