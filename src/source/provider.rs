//! Data provider trait for the upstream occupancy service.
//!
//! The sync orchestrator only talks to this trait, so the backing source can
//! be the real campus service, a fixture set, or a test double.

use async_trait::async_trait;

use crate::error::EngineResult;
use crate::models::{BuildingData, Layered, SessionRecord, TimeRange};

/// Raw overlap row as reported upstream: one shared-presence interval
/// between the queried user and another user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlapRecord {
    pub userid_key: String,
    pub start_seconds: i64,
    pub end_seconds: i64,
}

/// Upstream source of occupancy data.
///
/// Implementations must be `Send + Sync` so fetches can fan out across
/// tasks. Every method maps a transport failure into
/// [`EngineError::Network`](crate::error::EngineError).
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Ids of users that can be imported for tracking.
    async fn fetch_known_users(&self) -> EngineResult<Vec<String>>;

    /// Building geometry and anchor coordinates, in both layering modes.
    async fn fetch_buildings(&self) -> EngineResult<Layered<BuildingData>>;

    /// Session counts within `range`, for one user when `userid_key` is set
    /// or the whole population otherwise. Records are raw upstream rows;
    /// bucketing happens downstream.
    async fn fetch_session_counts(
        &self,
        range: &TimeRange,
        userid_key: Option<&str>,
    ) -> EngineResult<Layered<Vec<SessionRecord>>>;

    /// Shared-presence intervals between `userid_key` and every other user
    /// within `range`.
    async fn fetch_overlap_sessions(
        &self,
        range: &TimeRange,
        userid_key: &str,
    ) -> EngineResult<Vec<OverlapRecord>>;

    /// Run the outbreak model upstream and return its raw per-interval rows.
    async fn fetch_simulation(
        &self,
        range: &TimeRange,
        params: &crate::services::simulation::SimulationParams,
    ) -> EngineResult<Vec<SessionRecord>>;
}
