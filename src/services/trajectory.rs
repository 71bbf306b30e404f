//! Trajectory building from a user's bucketed series.

use std::collections::BTreeMap;

use crate::models::{BucketedSeries, Coordinates, Trajectory, Waypoint, TRAIL_LENGTH};

/// Build the ordered waypoint sequence for one user in one layering mode.
///
/// Walks buckets chronologically. A bucket yields a waypoint when the user
/// occupied at least one location there and that location has registered
/// coordinates; the first key in stable order is taken when several are
/// present. Each new waypoint snapshots the trailing-history buffer as it
/// stood before the append (`None` when still empty); the buffer then takes
/// the new timestamp and evicts its oldest entry beyond [`TRAIL_LENGTH`].
/// Buckets without a waypoint leave the buffer untouched.
pub fn build_trajectory(
    userid_key: &str,
    user_series: &BucketedSeries,
    coordinates: &BTreeMap<String, Coordinates>,
) -> Trajectory {
    let mut trajectory = Trajectory {
        userid_key: userid_key.to_string(),
        waypoints: Vec::new(),
    };
    let mut previous_timestamps: Vec<crate::models::Timestamp> = Vec::new();

    for (ts, counts) in &user_series.buckets {
        let Some(layer_key) = counts.keys().next() else {
            continue;
        };
        let Some(coords) = coordinates.get(layer_key) else {
            // Location without registered coordinates: skip the bucket.
            continue;
        };
        trajectory.waypoints.push(Waypoint {
            coordinates: *coords,
            timestamp: *ts,
            previous_timestamps: if previous_timestamps.is_empty() {
                None
            } else {
                Some(previous_timestamps.clone())
            },
        });
        previous_timestamps.push(*ts);
        if previous_timestamps.len() > TRAIL_LENGTH {
            previous_timestamps.remove(0);
        }
    }

    trajectory
}
