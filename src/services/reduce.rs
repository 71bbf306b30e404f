//! Total and average reduction across a bucketed series.

use std::collections::BTreeMap;

use crate::models::{BucketedSeries, SeriesSummary};

/// Reduce a series into per-location totals and averages.
///
/// The average divides by the full bucket count of the series, including
/// buckets where the location had no activity: it is a mean over the whole
/// time range, not over the buckets the location appeared in. A zero-bucket
/// series reduces to empty mappings.
pub fn reduce(series: &BucketedSeries) -> SeriesSummary {
    let mut total: BTreeMap<String, i64> = BTreeMap::new();
    for counts in series.buckets.values() {
        for (layer_key, count) in counts {
            *total.entry(layer_key.clone()).or_insert(0) += count;
        }
    }

    let num_buckets = series.len();
    let average = if num_buckets == 0 {
        BTreeMap::new()
    } else {
        total
            .iter()
            .map(|(layer_key, sum)| (layer_key.clone(), *sum as f64 / num_buckets as f64))
            .collect()
    };

    SeriesSummary { total, average }
}

#[cfg(test)]
mod tests {
    use super::reduce;
    use crate::models::{BucketedSeries, SessionRecord, TimeRange, Timestamp};
    use crate::services::bucketing::bucket;

    #[test]
    fn test_reduce_worked_example() {
        let range = TimeRange::new(Timestamp::new(0), Timestamp::new(120), 60);
        let records = vec![
            SessionRecord::new("L1", 0, 5),
            SessionRecord::new("L2", 0, 3),
            SessionRecord::new("L2", 60, 3),
            SessionRecord::new("L1", 60, 0),
        ];
        let summary = reduce(&bucket(&records, &range));
        assert_eq!(summary.total["L1"], 5);
        assert_eq!(summary.total["L2"], 6);
        assert!((summary.average["L1"] - 5.0 / 3.0).abs() < 1e-12);
        assert!((summary.average["L2"] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_average_divides_by_all_buckets() {
        // L appears in 1 of 4 buckets with count 8: average is 8/4, not 8/1.
        let range = TimeRange::new(Timestamp::new(0), Timestamp::new(180), 60);
        let summary = reduce(&bucket(&[SessionRecord::new("L", 60, 8)], &range));
        assert_eq!(summary.average["L"], 2.0);
    }

    #[test]
    fn test_reduce_empty_series() {
        let summary = reduce(&BucketedSeries::default());
        assert!(summary.total.is_empty());
        assert!(summary.average.is_empty());
    }
}
