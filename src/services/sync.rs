//! Data synchronization orchestrator.
//!
//! Walks the entities in dependency order and refreshes every stale one from
//! the [`DataProvider`], writing results back through the store's transition
//! methods. Each entity fails in isolation: an upstream error marks that
//! entity failed and the pass moves on, so one broken endpoint never blanks
//! the rest of the dashboard. Per-user session fetches fan out concurrently.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    BucketedSeries, Layered, OverlapData, OverlapInterval, OverlapTotal, Timestamp,
};
use crate::services::{bucketing, exposure, reduce, simulation, trajectory};
use crate::source::{DataProvider, OverlapRecord};
use crate::state::{Entity, Store};

/// Orchestrates refreshes of the shared [`DataBank`](crate::state::DataBank).
#[derive(Clone)]
pub struct SyncEngine {
    store: Store,
    provider: Arc<dyn DataProvider>,
}

impl SyncEngine {
    pub fn new(store: Store, provider: Arc<dyn DataProvider>) -> Self {
        Self { store, provider }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// One full refresh pass: walk [`Entity::SYNC_ORDER`] and refresh every
    /// stale entity, then the simulation when parameters changed.
    pub async fn sync_all(&self) {
        self.store.apply(|bank| bank.begin_sync());

        for entity in Entity::SYNC_ORDER {
            match entity {
                Entity::KnownUsers if self.is_stale(entity) => self.sync_known_users().await,
                Entity::Buildings if self.is_stale(entity) => self.sync_buildings().await,
                Entity::PopulationSessions if self.is_stale(entity) => {
                    self.sync_population().await
                }
                Entity::UserSessions => self.sync_all_user_sessions().await,
                Entity::UserDerived => self.sync_all_user_derived(),
                Entity::Overlap if self.is_stale(entity) => self.sync_overlap().await,
                _ => {}
            }
        }
        if self.is_stale(Entity::Simulation) {
            self.sync_simulation().await;
        }

        self.store.apply(|bank| bank.complete_sync());
        log::info!("sync pass complete");
    }

    /// Fan session fetches out concurrently over users whose own series went
    /// stale. A range change marks every tracked user stale, so the full
    /// fan-out happens there; a fresh import only touches the imported user.
    async fn sync_all_user_sessions(&self) {
        let user_ids = self.store.with(|bank| {
            bank.users_by_id
                .iter()
                .filter(|(_, user)| user.sessions_freshness.is_stale())
                .map(|(id, _)| id.clone())
                .collect::<Vec<_>>()
        });
        join_all(user_ids.iter().map(|id| self.sync_user_sessions(id))).await;
    }

    fn sync_all_user_derived(&self) {
        let derived_ids = self.store.with(|bank| {
            bank.users_by_id
                .iter()
                .filter(|(_, user)| {
                    user.sessions_freshness.is_up_to_date() && user.derived_freshness.is_stale()
                })
                .map(|(id, _)| id.clone())
                .collect::<Vec<_>>()
        });
        for id in &derived_ids {
            self.sync_user_derived(id);
        }
    }

    fn is_stale(&self, entity: Entity) -> bool {
        self.store.with(|bank| bank.freshness(entity).is_stale())
    }

    async fn sync_known_users(&self) {
        self.store.apply(|bank| bank.begin_known_users());
        match self.provider.fetch_known_users().await {
            Ok(users) => {
                log::debug!("known users: {} ids", users.len());
                self.store.apply(|bank| bank.complete_known_users(users));
            }
            Err(err) => {
                log::warn!("known users fetch failed: {err}");
                self.store.apply(|bank| bank.fail_known_users(err.to_string()));
            }
        }
    }

    async fn sync_buildings(&self) {
        self.store.apply(|bank| bank.begin_buildings());
        match self.provider.fetch_buildings().await {
            Ok(buildings) => {
                self.store.apply(|bank| bank.complete_buildings(buildings));
            }
            Err(err) => {
                log::warn!("buildings fetch failed: {err}");
                self.store.apply(|bank| bank.fail_buildings(err.to_string()));
            }
        }
    }

    /// Fetch population-wide records and derive the real-time series, its
    /// cumulative overlay and the total/average summary, per layering mode.
    async fn sync_population(&self) {
        self.store.apply(|bank| bank.begin_population());
        let range = self.store.with(|bank| bank.time_mode.range);
        match self.provider.fetch_session_counts(&range, None).await {
            Ok(records) => {
                let sessions = records.map(|r| bucketing::bucket(r, &range));
                let cumulative = sessions.map(|s| bucketing::cumulativize(s, &range));
                let summary = sessions.map(reduce::reduce);
                self.store
                    .apply(|bank| bank.complete_population(sessions, cumulative, summary));
            }
            Err(err) => {
                log::warn!("population fetch failed: {err}");
                self.store.apply(|bank| bank.fail_population(err.to_string()));
            }
        }
    }

    async fn sync_user_sessions(&self, userid_key: &str) {
        self.store.apply(|bank| bank.begin_user_sessions(userid_key));
        let range = self.store.with(|bank| bank.time_mode.range);
        match self
            .provider
            .fetch_session_counts(&range, Some(userid_key))
            .await
        {
            Ok(records) => {
                let sessions = records.map(|r| bucketing::bucket(r, &range));
                let active = sessions.aggregated.has_activity();
                self.store.apply(|bank| {
                    bank.complete_user_sessions(userid_key, sessions, active)
                });
            }
            Err(err) => {
                log::warn!("session fetch for user {userid_key} failed: {err}");
                self.store
                    .apply(|bank| bank.fail_user_sessions(userid_key, err.to_string()));
            }
        }
    }

    /// Derive exposure, summary and trajectory for one user from state
    /// already in the bank. Pure computation, so no await points.
    fn sync_user_derived(&self, userid_key: &str) {
        self.store.apply(|bank| bank.begin_user_derived(userid_key));
        let result = self.store.with(|bank| -> EngineResult<_> {
            let user = bank
                .users_by_id
                .get(userid_key)
                .ok_or_else(|| EngineError::computation(format!("user {userid_key} not tracked")))?;
            if bank.population.freshness.is_stale() {
                return Err(EngineError::computation(
                    "population series unavailable".to_string(),
                ));
            }
            let exposure = Layered::build(|mode| {
                exposure::compute_exposure(
                    bank.population.sessions.get(mode),
                    user.sessions.get(mode),
                )
            });
            let summary = user.sessions.map(reduce::reduce);
            let trajectory = Layered::build(|mode| {
                trajectory::build_trajectory(
                    userid_key,
                    user.sessions.get(mode),
                    &bank.buildings.get(mode).coordinates,
                )
            });
            Ok((exposure, summary, trajectory))
        });
        match result {
            Ok((exposure, summary, trajectory)) => {
                self.store.apply(|bank| {
                    bank.complete_user_derived(userid_key, exposure, summary, trajectory)
                });
            }
            Err(err) => {
                log::warn!("derived computation for user {userid_key} failed: {err}");
                self.store
                    .apply(|bank| bank.fail_user_derived(userid_key, err.to_string()));
            }
        }
    }

    /// Refresh overlap data for the user about to become primary.
    async fn sync_overlap(&self) {
        let (range, target) = self.store.with(|bank| {
            let target = bank
                .user
                .submitted_userid_key
                .clone()
                .unwrap_or_else(|| bank.user.userid_key.clone());
            (bank.time_mode.range, target)
        });
        if target.is_empty() {
            return;
        }
        self.store.apply(|bank| bank.begin_overlap());
        match self.provider.fetch_overlap_sessions(&range, &target).await {
            Ok(records) => {
                let overlap = assemble_overlap(&records);
                self.store.apply(|bank| bank.complete_overlap(overlap));
            }
            Err(err) => {
                log::warn!("overlap fetch for user {target} failed: {err}");
                self.store.apply(|bank| bank.fail_overlap(err.to_string()));
            }
        }
    }

    /// Run the outbreak simulation with the submitted parameters.
    pub async fn sync_simulation(&self) {
        let (range, params) = self
            .store
            .with(|bank| (bank.time_mode.range, bank.simulation.params.clone()));
        self.store.apply(|bank| bank.begin_simulation());
        match self.provider.fetch_simulation(&range, &params).await {
            Ok(records) => {
                let series: BucketedSeries =
                    simulation::prepare_simulation(&records, &range, params.cumulative);
                self.store.apply(|bank| bank.complete_simulation(series));
            }
            Err(err) => {
                log::warn!("simulation failed: {err}");
                self.store.apply(|bank| bank.fail_simulation(err.to_string()));
            }
        }
    }
}

/// Group raw overlap rows into display intervals and per-user totals.
/// Totals keep the upstream encounter ordering of first appearance.
pub fn assemble_overlap(records: &[OverlapRecord]) -> OverlapData {
    let mut overlaps = Vec::with_capacity(records.len());
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    let mut order: Vec<String> = Vec::new();

    for record in records {
        overlaps.push(OverlapInterval {
            userid_key: record.userid_key.clone(),
            start: Timestamp::new(record.start_seconds),
            end: Timestamp::new(record.end_seconds),
        });
        if !totals.contains_key(&record.userid_key) {
            order.push(record.userid_key.clone());
        }
        *totals.entry(record.userid_key.clone()).or_insert(0) +=
            record.end_seconds - record.start_seconds;
    }

    OverlapData {
        overlaps,
        total_duration_per_user: order
            .into_iter()
            .map(|userid_key| {
                let total_seconds = totals[&userid_key];
                OverlapTotal {
                    userid_key,
                    total_seconds,
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::assemble_overlap;
    use crate::source::OverlapRecord;

    #[test]
    fn test_overlap_totals_accumulate_per_user() {
        let records = vec![
            OverlapRecord {
                userid_key: "77".into(),
                start_seconds: 0,
                end_seconds: 300,
            },
            OverlapRecord {
                userid_key: "12".into(),
                start_seconds: 100,
                end_seconds: 200,
            },
            OverlapRecord {
                userid_key: "77".into(),
                start_seconds: 600,
                end_seconds: 900,
            },
        ];
        let data = assemble_overlap(&records);
        assert_eq!(data.overlaps.len(), 3);
        assert_eq!(data.total_duration_per_user.len(), 2);
        assert_eq!(data.total_duration_per_user[0].userid_key, "77");
        assert_eq!(data.total_duration_per_user[0].total_seconds, 600);
        assert_eq!(data.total_duration_per_user[1].total_seconds, 100);
    }

    #[test]
    fn test_empty_overlaps() {
        let data = assemble_overlap(&[]);
        assert!(data.overlaps.is_empty());
        assert!(data.total_duration_per_user.is_empty());
    }
}
