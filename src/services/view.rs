//! Current-slice selection.
//!
//! Maps the playback cursor onto one bucket of the series the display mode
//! calls for, producing the per-location values a map layer colors from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{LayerMode, Timestamp};
use crate::state::DataBank;

/// Which derived series the map is currently rendering. The total and
/// average modes are whole-range aggregates, so they ignore the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    Realtime,
    Cumulative,
    Total,
    Average,
    ContactedRealtime,
    ContactedCumulative,
    Simulation,
}

/// Per-location values for the renderer.
pub type SliceValues = BTreeMap<String, f64>;

/// The per-location values at the playback cursor for the given display and
/// layering mode. The cursor snaps down to its containing bucket, so an
/// off-grid seek still renders the bucket it falls in. Empty when the backing
/// series has no data for that bucket.
pub fn current_slice(bank: &DataBank, display: DisplayMode, layer: LayerMode) -> SliceValues {
    let range = bank.time_mode.range;
    let cursor = bank.time_mode.current_timestamp;
    let ts = snap_to_bucket(cursor, range.start, range.interval_seconds);

    match display {
        DisplayMode::Realtime => to_values(bank.population.sessions.get(layer).at(ts)),
        DisplayMode::Cumulative => to_values(bank.population.cumulative.get(layer).at(ts)),
        DisplayMode::Total => bank
            .population
            .summary
            .get(layer)
            .total
            .iter()
            .map(|(k, v)| (k.clone(), *v as f64))
            .collect(),
        DisplayMode::Average => bank.population.summary.get(layer).average.clone(),
        DisplayMode::ContactedRealtime => to_values(
            bank.active_user_ref()
                .and_then(|user| user.exposure.get(layer).realtime.at(ts)),
        ),
        DisplayMode::ContactedCumulative => to_values(
            bank.active_user_ref()
                .and_then(|user| user.exposure.get(layer).cumulative.at(ts)),
        ),
        DisplayMode::Simulation => {
            to_values(bank.simulation.series.as_ref().and_then(|s| s.at(ts)))
        }
    }
}

fn to_values(counts: Option<&crate::models::LayerCounts>) -> SliceValues {
    counts
        .map(|c| c.iter().map(|(k, v)| (k.clone(), *v as f64)).collect())
        .unwrap_or_default()
}

fn snap_to_bucket(ts: Timestamp, start: Timestamp, interval_seconds: i64) -> Timestamp {
    if ts <= start || interval_seconds <= 0 {
        return start;
    }
    let offset = (ts.value() - start.value()) / interval_seconds * interval_seconds;
    Timestamp::new(start.value() + offset)
}
