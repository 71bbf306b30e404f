//! Outbreak-simulation series preparation.
//!
//! Simulated infection counts arrive in the same tabular shape as session
//! counts and get bucketed the same way. The cumulative variant here is a
//! running sum of new counts per location, unlike the carry-forward snapshot
//! `cumulativize` produces for occupancy.

use serde::{Deserialize, Serialize};

use crate::models::{BucketedSeries, LayerCounts, SessionRecord, TimeRange};
use crate::services::bucketing::bucket;

/// Parameters forwarded to the simulation backend. `model` selects the
/// epidemic model; the remaining knobs are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParams {
    pub model: String,
    #[serde(default)]
    pub beta: f64,
    #[serde(default)]
    pub theta: f64,
    #[serde(default)]
    pub gamma: f64,
    #[serde(default)]
    pub i0: f64,
    #[serde(default)]
    pub seed: u64,
    /// Report the running-sum cumulative variant instead of raw counts.
    #[serde(default)]
    pub cumulative: bool,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            model: "SIR".to_string(),
            beta: 0.0,
            theta: 0.0,
            gamma: 0.0,
            i0: 0.0,
            seed: 0,
            cumulative: false,
        }
    }
}

/// Bucket raw simulation records, returning the variant `params.cumulative`
/// selects.
pub fn prepare_simulation(
    records: &[SessionRecord],
    range: &TimeRange,
    cumulative: bool,
) -> BucketedSeries {
    let raw = bucket(records, range);
    if !cumulative {
        return raw;
    }

    let mut summed = BucketedSeries::empty(range);
    let mut running = LayerCounts::new();
    for ts in range.bucket_timestamps() {
        if let Some(counts) = raw.at(ts) {
            for (layer_key, count) in counts {
                *running.entry(layer_key.clone()).or_insert(0) += count;
            }
        }
        summed.buckets.insert(ts, running.clone());
    }
    summed
}
