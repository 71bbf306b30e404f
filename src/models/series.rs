//! Session-count series types.
//!
//! Raw per-session records arrive as `(layer_key, session_interval_start,
//! session_count)` rows; the engine buckets them onto a [`TimeRange`] grid and
//! derives cumulative, total/average and exposure views from the bucketed
//! form. See the bucketing and reduce services for the derivations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::time::{TimeRange, Timestamp};

/// Occupancy counts per location for one bucket. Sparse: only locations with
/// observed activity appear.
pub type LayerCounts = BTreeMap<String, i64>;

/// Raw unit of input: one observed `(location, bucket)` pair. Absence of a
/// record means zero observed occupancy, not unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub layer_key: String,
    #[serde(rename = "session_interval_start")]
    pub interval_start: Timestamp,
    #[serde(rename = "session_count")]
    pub count: i64,
}

impl SessionRecord {
    pub fn new(layer_key: impl Into<String>, interval_start: impl Into<Timestamp>, count: i64) -> Self {
        Self {
            layer_key: layer_key.into(),
            interval_start: interval_start.into(),
            count,
        }
    }
}

/// Dense mapping from bucket timestamp to per-location counts.
///
/// Invariant: the key set equals the generating range's bucket grid, every
/// bucket present even when its inner map is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketedSeries {
    pub buckets: BTreeMap<Timestamp, LayerCounts>,
}

/// Same shape as [`BucketedSeries`]; each location's value at bucket `t`
/// carries forward from `t-1` when the raw series has no entry. A point-in-time
/// snapshot, not a running sum.
pub type CumulativeSeries = BucketedSeries;

/// Same shape as [`BucketedSeries`]; counts at locations the user occupied,
/// with [`EXPOSURE_SENTINEL`] marking previously-visited locations that
/// currently show zero population (cumulative variant only).
pub type ExposureSeries = BucketedSeries;

/// Marks a previously visited location with no current occupants, so the map
/// can render it distinctly from a true zero.
pub const EXPOSURE_SENTINEL: i64 = -1;

impl BucketedSeries {
    /// An empty series covering the full bucket grid of `range`.
    pub fn empty(range: &TimeRange) -> Self {
        Self {
            buckets: range
                .bucket_timestamps()
                .into_iter()
                .map(|ts| (ts, LayerCounts::new()))
                .collect(),
        }
    }

    /// Counts at a bucket, if the bucket exists.
    pub fn at(&self, ts: Timestamp) -> Option<&LayerCounts> {
        self.buckets.get(&ts)
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Whether any bucket has observed activity.
    pub fn has_activity(&self) -> bool {
        self.buckets.values().any(|counts| !counts.is_empty())
    }
}

/// Per-location totals and averages reduced across a whole series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    pub total: BTreeMap<String, i64>,
    pub average: BTreeMap<String, f64>,
}

/// A pair of values for the two layering modes, maintained side by side
/// through the whole pipeline: buildings aggregated into one unit vs split
/// per floor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layered<T> {
    pub aggregated: T,
    pub per_floor: T,
}

/// Selects one of the two layering modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerMode {
    Aggregated,
    PerFloor,
}

impl<T> Layered<T> {
    pub fn new(aggregated: T, per_floor: T) -> Self {
        Self {
            aggregated,
            per_floor,
        }
    }

    /// Build both modes from a per-mode constructor.
    pub fn build(mut f: impl FnMut(LayerMode) -> T) -> Self {
        Self {
            aggregated: f(LayerMode::Aggregated),
            per_floor: f(LayerMode::PerFloor),
        }
    }

    pub fn get(&self, mode: LayerMode) -> &T {
        match mode {
            LayerMode::Aggregated => &self.aggregated,
            LayerMode::PerFloor => &self.per_floor,
        }
    }

    pub fn get_mut(&mut self, mode: LayerMode) -> &mut T {
        match mode {
            LayerMode::Aggregated => &mut self.aggregated,
            LayerMode::PerFloor => &mut self.per_floor,
        }
    }

    /// Apply `f` to both modes, producing a new pair.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Layered<U> {
        Layered {
            aggregated: f(&self.aggregated),
            per_floor: f(&self.per_floor),
        }
    }
}

impl LayerMode {
    pub const ALL: [LayerMode; 2] = [LayerMode::Aggregated, LayerMode::PerFloor];
}
