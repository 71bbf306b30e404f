//! In-memory [`DataProvider`] backed by seeded fixture records.
//!
//! Serves as the local/demo source and as the test double for the sync
//! orchestrator. Individual fetch methods can be forced to fail to exercise
//! error isolation.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{EngineError, EngineResult};
use crate::models::{BuildingData, Layered, SessionRecord, TimeRange};
use crate::services::simulation::SimulationParams;
use crate::source::provider::{DataProvider, OverlapRecord};

/// Fixture-backed provider. Records are held per user; `None` keys the
/// population-wide set.
#[derive(Default)]
pub struct LocalProvider {
    known_users: Vec<String>,
    buildings: Layered<BuildingData>,
    population: Layered<Vec<SessionRecord>>,
    per_user: BTreeMap<String, Layered<Vec<SessionRecord>>>,
    overlaps: BTreeMap<String, Vec<OverlapRecord>>,
    failing: Mutex<BTreeSet<&'static str>>,
}

impl LocalProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known_users(mut self, users: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.known_users = users.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_buildings(mut self, buildings: Layered<BuildingData>) -> Self {
        self.buildings = buildings;
        self
    }

    pub fn with_population(mut self, records: Layered<Vec<SessionRecord>>) -> Self {
        self.population = records;
        self
    }

    pub fn with_user_records(
        mut self,
        userid_key: impl Into<String>,
        records: Layered<Vec<SessionRecord>>,
    ) -> Self {
        self.per_user.insert(userid_key.into(), records);
        self
    }

    pub fn with_overlaps(
        mut self,
        userid_key: impl Into<String>,
        overlaps: Vec<OverlapRecord>,
    ) -> Self {
        self.overlaps.insert(userid_key.into(), overlaps);
        self
    }

    /// Force the named fetch method to fail until cleared. Methods are keyed
    /// by name: `"known_users"`, `"buildings"`, `"session_counts"`,
    /// `"overlap_sessions"`, `"simulation"`.
    pub fn set_failing(&self, method: &'static str, failing: bool) {
        let mut set = self.failing.lock();
        if failing {
            set.insert(method);
        } else {
            set.remove(method);
        }
    }

    fn check(&self, method: &'static str) -> EngineResult<()> {
        if self.failing.lock().contains(method) {
            return Err(EngineError::network(format!("{method}: injected failure")));
        }
        Ok(())
    }

    fn filter(records: &[SessionRecord], range: &TimeRange) -> Vec<SessionRecord> {
        records
            .iter()
            .filter(|r| r.interval_start >= range.start && r.interval_start <= range.end)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl DataProvider for LocalProvider {
    async fn fetch_known_users(&self) -> EngineResult<Vec<String>> {
        self.check("known_users")?;
        Ok(self.known_users.clone())
    }

    async fn fetch_buildings(&self) -> EngineResult<Layered<BuildingData>> {
        self.check("buildings")?;
        Ok(self.buildings.clone())
    }

    async fn fetch_session_counts(
        &self,
        range: &TimeRange,
        userid_key: Option<&str>,
    ) -> EngineResult<Layered<Vec<SessionRecord>>> {
        self.check("session_counts")?;
        let source = match userid_key {
            Some(id) => self
                .per_user
                .get(id)
                .ok_or_else(|| EngineError::network(format!("no records for user {id}")))?,
            None => &self.population,
        };
        Ok(Layered::build(|mode| Self::filter(source.get(mode), range)))
    }

    async fn fetch_overlap_sessions(
        &self,
        range: &TimeRange,
        userid_key: &str,
    ) -> EngineResult<Vec<OverlapRecord>> {
        self.check("overlap_sessions")?;
        let overlaps = self.overlaps.get(userid_key).cloned().unwrap_or_default();
        Ok(overlaps
            .into_iter()
            .filter(|o| o.end_seconds >= range.start.value() && o.start_seconds <= range.end.value())
            .collect())
    }

    async fn fetch_simulation(
        &self,
        range: &TimeRange,
        params: &SimulationParams,
    ) -> EngineResult<Vec<SessionRecord>> {
        self.check("simulation")?;
        // Deterministic pseudo-output: one infected-count row per interval,
        // driven by an LCG over the submitted seed.
        let mut state = params.seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        let mut records = Vec::new();
        for ts in range.bucket_timestamps() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let count = ((state >> 33) % (params.i0.max(1.0) as u64 * 4)) as i64;
            records.push(SessionRecord::new("infected", ts, count));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timestamp;

    fn range() -> TimeRange {
        TimeRange::new(Timestamp::new(0), Timestamp::new(120), 60)
    }

    #[tokio::test]
    async fn test_session_counts_filtered_by_range() {
        let provider = LocalProvider::new().with_population(Layered::new(
            vec![
                SessionRecord::new("L1", 0, 5),
                SessionRecord::new("L1", 300, 9),
            ],
            vec![],
        ));
        let records = provider.fetch_session_counts(&range(), None).await.unwrap();
        assert_eq!(records.aggregated.len(), 1);
        assert_eq!(records.aggregated[0].count, 5);
    }

    #[tokio::test]
    async fn test_injected_failure_and_recovery() {
        let provider = LocalProvider::new().with_known_users(["21"]);
        provider.set_failing("known_users", true);
        assert!(provider.fetch_known_users().await.is_err());
        provider.set_failing("known_users", false);
        assert_eq!(provider.fetch_known_users().await.unwrap(), vec!["21"]);
    }

    #[tokio::test]
    async fn test_simulation_is_deterministic() {
        let provider = LocalProvider::new();
        let params = SimulationParams::default();
        let a = provider.fetch_simulation(&range(), &params).await.unwrap();
        let b = provider.fetch_simulation(&range(), &params).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
    }
}
