//! User trajectory types for animated-trail rendering.

use serde::{Deserialize, Serialize};

use super::building::Coordinates;
use super::time::Timestamp;

/// Maximum number of trailing timestamps kept per waypoint, so comet trails
/// remain visible without growing unboundedly.
pub const TRAIL_LENGTH: usize = 15;

/// One datapoint of a user's movement: where they were, when, and the most
/// recent prior active timestamps feeding the fading trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub coordinates: Coordinates,
    pub timestamp: Timestamp,
    /// Up to [`TRAIL_LENGTH`] most recent active timestamps before this one;
    /// `None` for the first waypoint.
    pub previous_timestamps: Option<Vec<Timestamp>>,
}

/// Ordered waypoint sequence for one user in one layering mode. Rebuilt
/// wholesale on each recomputation, never mutated incrementally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub userid_key: String,
    pub waypoints: Vec<Waypoint>,
}
