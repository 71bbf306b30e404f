//! Contact exposure derivation.
//!
//! Intersects the population-wide series with one user's series to find how
//! many people shared each location the user occupied. Real-time mode only
//! reports locations at the exact buckets the user was there; cumulative mode
//! keeps reporting every location the user has ever visited, with the `-1`
//! sentinel standing in when the population count drops to nothing.

use std::collections::BTreeSet;

use crate::models::{BucketedSeries, ExposureSeries, EXPOSURE_SENTINEL};

/// Real-time and cumulative exposure views for one layering mode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExposureViews {
    pub realtime: ExposureSeries,
    pub cumulative: ExposureSeries,
}

/// Compute both exposure views.
///
/// Iterates the user's bucket set (built from the same range as the
/// population's, so a subset by construction). A user is expected to occupy
/// at most one location per bucket but zero or several are tolerated. Buckets
/// with no user activity still appear in both outputs with empty mappings.
pub fn compute_exposure(population: &BucketedSeries, user: &BucketedSeries) -> ExposureViews {
    let mut views = ExposureViews::default();
    let mut visited: BTreeSet<String> = BTreeSet::new();

    for (ts, user_counts) in &user.buckets {
        let population_counts = population.at(*ts);
        let mut realtime = crate::models::LayerCounts::new();
        for layer_key in user_counts.keys() {
            if let Some(count) = population_counts.and_then(|c| c.get(layer_key)) {
                realtime.insert(layer_key.clone(), *count);
            }
            visited.insert(layer_key.clone());
        }

        let mut cumulative = crate::models::LayerCounts::new();
        for layer_key in &visited {
            let count = population_counts
                .and_then(|c| c.get(layer_key))
                .copied()
                .unwrap_or(EXPOSURE_SENTINEL);
            cumulative.insert(layer_key.clone(), count);
        }

        views.realtime.buckets.insert(*ts, realtime);
        views.cumulative.buckets.insert(*ts, cumulative);
    }

    views
}

#[cfg(test)]
mod tests {
    use super::compute_exposure;
    use crate::models::{SessionRecord, TimeRange, Timestamp, EXPOSURE_SENTINEL};
    use crate::services::bucketing::bucket;

    fn ts(v: i64) -> Timestamp {
        Timestamp::new(v)
    }

    #[test]
    fn test_realtime_reports_only_occupied_buckets() {
        let range = TimeRange::new(ts(0), ts(120), 60);
        let population = bucket(
            &[
                SessionRecord::new("L1", 0, 7),
                SessionRecord::new("L1", 60, 4),
            ],
            &range,
        );
        let user = bucket(&[SessionRecord::new("L1", 0, 1)], &range);

        let views = compute_exposure(&population, &user);
        assert_eq!(views.realtime.at(ts(0)).unwrap()["L1"], 7);
        // User was elsewhere at 60: no realtime entry despite population.
        assert!(views.realtime.at(ts(60)).unwrap().is_empty());
        assert!(views.realtime.at(ts(120)).unwrap().is_empty());
    }

    #[test]
    fn test_cumulative_sentinel_for_emptied_location() {
        let range = TimeRange::new(ts(0), ts(120), 60);
        // Population occupies L1 only at the first bucket.
        let population = bucket(&[SessionRecord::new("L1", 0, 7)], &range);
        let user = bucket(&[SessionRecord::new("L1", 0, 1)], &range);

        let views = compute_exposure(&population, &user);
        assert_eq!(views.cumulative.at(ts(0)).unwrap()["L1"], 7);
        assert_eq!(views.cumulative.at(ts(60)).unwrap()["L1"], EXPOSURE_SENTINEL);
        assert_eq!(
            views.cumulative.at(ts(120)).unwrap()["L1"],
            EXPOSURE_SENTINEL
        );
        // Realtime never resurrects the location.
        assert!(!views.realtime.at(ts(60)).unwrap().contains_key("L1"));
    }

    #[test]
    fn test_every_user_bucket_present_in_output() {
        let range = TimeRange::new(ts(0), ts(180), 60);
        let population = bucket(&[], &range);
        let user = bucket(&[], &range);
        let views = compute_exposure(&population, &user);
        assert_eq!(views.realtime.len(), 4);
        assert_eq!(views.cumulative.len(), 4);
    }

    #[test]
    fn test_multiple_locations_per_bucket_tolerated() {
        let range = TimeRange::new(ts(0), ts(60), 60);
        let population = bucket(
            &[
                SessionRecord::new("L1", 0, 2),
                SessionRecord::new("L2", 0, 9),
            ],
            &range,
        );
        // Duplicate presence in one bucket; both locations tracked.
        let user = bucket(
            &[
                SessionRecord::new("L1", 0, 1),
                SessionRecord::new("L2", 0, 1),
            ],
            &range,
        );
        let views = compute_exposure(&population, &user);
        let at_0 = views.realtime.at(ts(0)).unwrap();
        assert_eq!((at_0["L1"], at_0["L2"]), (2, 9));
    }

    #[test]
    fn test_realtime_absent_when_population_has_no_record() {
        let range = TimeRange::new(ts(0), ts(60), 60);
        let population = bucket(&[], &range);
        let user = bucket(&[SessionRecord::new("L1", 0, 1)], &range);
        let views = compute_exposure(&population, &user);
        // Unreported population stays unreported, not zero.
        assert!(views.realtime.at(ts(0)).unwrap().is_empty());
        assert_eq!(views.cumulative.at(ts(0)).unwrap()["L1"], EXPOSURE_SENTINEL);
    }
}
