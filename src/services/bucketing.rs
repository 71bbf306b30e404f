//! Interval bucketing and cumulative aggregation.
//!
//! Raw session records are placed onto the dense bucket grid of a
//! [`TimeRange`]; the cumulative view then carries each location's last known
//! count forward so the "has ever appeared" picture can be rendered.

use crate::models::{BucketedSeries, CumulativeSeries, SessionRecord, TimeRange};

/// Place raw records into their buckets over the full grid of `range`.
///
/// Every grid bucket is present in the output, empty when nothing was
/// observed. Records whose `interval_start` does not fall exactly on the grid
/// are silently dropped; out-of-range data is not an error. Duplicate
/// `(bucket, layer_key)` pairs resolve last-write-wins, matching the source
/// feed's historical behavior (no summing).
pub fn bucket(records: &[SessionRecord], range: &TimeRange) -> BucketedSeries {
    let mut series = BucketedSeries::empty(range);
    for record in records {
        if let Some(counts) = series.buckets.get_mut(&record.interval_start) {
            counts.insert(record.layer_key.clone(), record.count);
        }
    }
    series
}

/// Derive the carry-forward cumulative view of a bucketed series.
///
/// The first bucket equals its raw value; each subsequent bucket starts from
/// the previous cumulative mapping and overlays the current raw entries.
/// Once a location appears it never leaves for the remainder of the range.
pub fn cumulativize(series: &BucketedSeries, range: &TimeRange) -> CumulativeSeries {
    let mut cumulative = BucketedSeries::empty(range);
    let mut carried = crate::models::LayerCounts::new();
    for ts in range.bucket_timestamps() {
        if let Some(raw) = series.at(ts) {
            for (layer_key, count) in raw {
                carried.insert(layer_key.clone(), *count);
            }
        }
        cumulative.buckets.insert(ts, carried.clone());
    }
    cumulative
}

#[cfg(test)]
mod tests {
    use super::{bucket, cumulativize};
    use crate::models::{SessionRecord, TimeRange, Timestamp};

    fn range_0_120() -> TimeRange {
        TimeRange::new(Timestamp::new(0), Timestamp::new(120), 60)
    }

    #[test]
    fn test_bucket_empty_input_covers_full_grid() {
        let series = bucket(&[], &range_0_120());
        let keys: Vec<_> = series.buckets.keys().copied().collect();
        assert_eq!(
            keys,
            vec![Timestamp::new(0), Timestamp::new(60), Timestamp::new(120)]
        );
        assert!(series.buckets.values().all(|c| c.is_empty()));
    }

    #[test]
    fn test_bucket_worked_example() {
        // Records [{L1,0,5},{L2,0,3},{L1,60,0}] over buckets 0/60/120.
        let records = vec![
            SessionRecord::new("L1", 0, 5),
            SessionRecord::new("L2", 0, 3),
            SessionRecord::new("L1", 60, 0),
        ];
        let series = bucket(&records, &range_0_120());
        assert_eq!(series.at(Timestamp::new(0)).unwrap()["L1"], 5);
        assert_eq!(series.at(Timestamp::new(0)).unwrap()["L2"], 3);
        assert_eq!(series.at(Timestamp::new(60)).unwrap()["L1"], 0);
        assert!(!series.at(Timestamp::new(60)).unwrap().contains_key("L2"));
        assert!(series.at(Timestamp::new(120)).unwrap().is_empty());
    }

    #[test]
    fn test_bucket_drops_off_grid_records() {
        let records = vec![
            SessionRecord::new("L1", 61, 9),
            SessionRecord::new("L1", -60, 9),
            SessionRecord::new("L1", 180, 9),
        ];
        let series = bucket(&records, &range_0_120());
        assert!(!series.has_activity());
    }

    #[test]
    fn test_bucket_duplicate_records_last_write_wins() {
        // Duplicates overwrite rather than sum; asserted here so an
        // accidental change to summation fails loudly.
        let records = vec![
            SessionRecord::new("L1", 0, 5),
            SessionRecord::new("L1", 0, 2),
        ];
        let series = bucket(&records, &range_0_120());
        assert_eq!(series.at(Timestamp::new(0)).unwrap()["L1"], 2);
    }

    #[test]
    fn test_cumulativize_worked_example() {
        let records = vec![
            SessionRecord::new("L1", 0, 5),
            SessionRecord::new("L2", 0, 3),
            SessionRecord::new("L1", 60, 0),
        ];
        let range = range_0_120();
        let cumulative = cumulativize(&bucket(&records, &range), &range);
        let at_0 = cumulative.at(Timestamp::new(0)).unwrap();
        assert_eq!((at_0["L1"], at_0["L2"]), (5, 3));
        let at_60 = cumulative.at(Timestamp::new(60)).unwrap();
        assert_eq!((at_60["L1"], at_60["L2"]), (0, 3));
        let at_120 = cumulative.at(Timestamp::new(120)).unwrap();
        assert_eq!((at_120["L1"], at_120["L2"]), (0, 3));
    }

    #[test]
    fn test_cumulative_location_set_grows_monotonically() {
        let records = vec![
            SessionRecord::new("L1", 0, 1),
            SessionRecord::new("L2", 60, 4),
            SessionRecord::new("L3", 120, 2),
        ];
        let range = range_0_120();
        let cumulative = cumulativize(&bucket(&records, &range), &range);
        let mut seen: Vec<Vec<String>> = Vec::new();
        for counts in cumulative.buckets.values() {
            seen.push(counts.keys().cloned().collect());
        }
        for window in seen.windows(2) {
            assert!(
                window[0].iter().all(|k| window[1].contains(k)),
                "location set shrank: {:?} -> {:?}",
                window[0],
                window[1]
            );
        }
    }
}
