//! Data Transfer Objects for the HTTP API.
//!
//! Most response payloads are the model/state types themselves, which already
//! derive Serialize; this module adds the request bodies and the composite
//! responses the handlers assemble.

use serde::{Deserialize, Serialize};

pub use crate::models::{OverlapData, SeriesSummary, TimeRange, Timestamp, Trajectory};
pub use crate::state::{FreshnessSnapshot, LoadStatus, TimeMode};

use crate::models::LayerMode;
use crate::services::playback::PlaybackClock;
use crate::services::simulation::SimulationParams;
use crate::services::view::{DisplayMode, SliceValues};

/// Response for GET /health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Response for GET /v1/status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub load_status: LoadStatus,
    pub freshness: FreshnessSnapshot,
    pub time_mode: TimeMode,
    pub playback: PlaybackClock,
}

/// Request body for PUT /v1/time-mode/range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRangeRequest {
    pub start: Timestamp,
    pub end: Timestamp,
    pub interval_seconds: i64,
}

/// Request body for PUT /v1/time-mode/current.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetCurrentRequest {
    pub timestamp: Timestamp,
}

/// Response for GET /v1/users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersResponse {
    pub known_users: Vec<String>,
    pub tracked_users: Vec<TrackedUserDto>,
    pub primary_userid_key: String,
}

/// Per-tracked-user display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedUserDto {
    pub userid_key: String,
    pub active: bool,
    pub trail_visible: bool,
    pub trail_color: String,
}

/// Request body for POST /v1/users/import and /v1/users/select.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRequest {
    pub userid_key: String,
}

/// Query parameters for slice and summary endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct SliceQuery {
    pub display: DisplayMode,
    #[serde(default = "default_layer")]
    pub layer: LayerMode,
}

/// Query parameter selecting a layering mode.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerQuery {
    #[serde(default = "default_layer")]
    pub layer: LayerMode,
}

fn default_layer() -> LayerMode {
    LayerMode::Aggregated
}

/// Response for GET /v1/slice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SliceResponse {
    pub timestamp: Timestamp,
    pub values: SliceValues,
}

/// Request body for POST /v1/simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationRequest {
    #[serde(flatten)]
    pub params: SimulationParams,
}

/// Request body for POST /v1/playback/step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRequest {
    pub forward: bool,
}

/// Request body for POST /v1/playback/skip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkipRequest {
    pub to_end: bool,
}

/// Request body for POST /v1/playback/speed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedRequest {
    pub speed: i32,
}
