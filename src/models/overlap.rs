//! Session-overlap (contact) data as returned by the overlaps endpoint.

use serde::{Deserialize, Serialize};

use super::time::Timestamp;

/// One interval during which another user shared a location with the primary
/// user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapInterval {
    pub userid_key: String,
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Total overlap duration accumulated per contacted user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapTotal {
    pub userid_key: String,
    pub total_seconds: i64,
}

/// Overlap data for the primary user over the analysis range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapData {
    pub overlaps: Vec<OverlapInterval>,
    pub total_duration_per_user: Vec<OverlapTotal>,
}
