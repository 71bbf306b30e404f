use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Timestamp format used by the dashboard API ("2020-01-06 06:00:00").
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Unix timestamp in whole seconds (UTC).
///
/// On the wire this is the dashboard's `"yyyy-MM-dd HH:mm:ss"` string;
/// raw integer seconds are accepted on input for convenience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a new timestamp from unix seconds.
    pub fn new(secs: i64) -> Self {
        Self(secs)
    }

    /// Raw unix seconds.
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Shift by a signed number of seconds.
    pub fn offset(&self, secs: i64) -> Self {
        Self(self.0 + secs)
    }

    /// Convert to chrono DateTime<Utc>.
    pub fn to_datetime(&self) -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(self.0, 0).unwrap_or(chrono::DateTime::UNIX_EPOCH)
    }

    /// Create from chrono DateTime<Utc>.
    pub fn from_datetime(dt: chrono::DateTime<chrono::Utc>) -> Self {
        Self(dt.timestamp())
    }

    /// Parse a `"yyyy-MM-dd HH:mm:ss"` string, interpreted as UTC.
    pub fn parse(s: &str) -> EngineResult<Self> {
        let naive = chrono::NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
            .map_err(|e| EngineError::validation(format!("bad timestamp {:?}: {}", s, e)))?;
        Ok(Self(naive.and_utc().timestamp()))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_datetime().format(TIMESTAMP_FORMAT))
    }
}

impl From<i64> for Timestamp {
    fn from(v: i64) -> Self {
        Timestamp::new(v)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TimestampVisitor;

        impl serde::de::Visitor<'_> for TimestampVisitor {
            type Value = Timestamp;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "a \"{}\" string or unix seconds", TIMESTAMP_FORMAT)
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Timestamp, E> {
                Timestamp::parse(v).map_err(E::custom)
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Timestamp, E> {
                Ok(Timestamp::new(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Timestamp, E> {
                Ok(Timestamp::new(v as i64))
            }
        }

        deserializer.deserialize_any(TimestampVisitor)
    }
}

/// Analysis time range with a fixed bucket width.
///
/// Range semantics are inclusive-inclusive: the bucket grid contains both
/// `start` and, when `end` lands on the grid, `end` itself. Callers should
/// align `end` to the grid; for an unaligned `end` the last generated bucket
/// overshoots it (same inclusive generation the dashboard's `range()` helper
/// used).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Timestamp,
    pub end: Timestamp,
    pub interval_seconds: i64,
}

impl TimeRange {
    pub fn new(start: Timestamp, end: Timestamp, interval_seconds: i64) -> Self {
        Self {
            start,
            end,
            interval_seconds,
        }
    }

    /// Check the range invariants: `start <= end`, positive interval.
    pub fn validate(&self) -> EngineResult<()> {
        if self.interval_seconds <= 0 {
            return Err(EngineError::validation(format!(
                "interval must be positive, got {}",
                self.interval_seconds
            )));
        }
        if self.end < self.start {
            return Err(EngineError::validation(format!(
                "range end {} precedes start {}",
                self.end, self.start
            )));
        }
        Ok(())
    }

    /// Number of buckets in the grid, inclusive of both endpoints.
    pub fn num_buckets(&self) -> usize {
        let span = self.end.value() - self.start.value();
        if span <= 0 {
            return 1;
        }
        (((span + self.interval_seconds - 1) / self.interval_seconds) + 1) as usize
    }

    /// Generate the full ordered bucket grid: `start, start+interval, ...`.
    pub fn bucket_timestamps(&self) -> Vec<Timestamp> {
        (0..self.num_buckets() as i64)
            .map(|i| self.start.offset(i * self.interval_seconds))
            .collect()
    }

    /// Last timestamp of the generated grid.
    pub fn last_bucket(&self) -> Timestamp {
        self.start
            .offset((self.num_buckets() as i64 - 1) * self.interval_seconds)
    }

    /// Whether `ts` falls exactly on the bucket grid.
    pub fn contains_bucket(&self, ts: Timestamp) -> bool {
        let span = ts.value() - self.start.value();
        span >= 0 && span % self.interval_seconds == 0 && ts <= self.last_bucket()
    }

    /// Clamp a timestamp to the nearest range bound.
    pub fn clamp(&self, ts: Timestamp) -> Timestamp {
        if ts < self.start {
            self.start
        } else if ts > self.end {
            self.end
        } else {
            ts
        }
    }
}
