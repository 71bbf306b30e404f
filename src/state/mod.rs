//! Process-wide state store.
//!
//! A single authoritative [`DataBank`] value holds everything the dashboard
//! derives: the analysis time mode, building metadata, population and
//! per-user series, overlap data, simulation output and the playback clock.
//! Mutation goes through the closed set of transition methods below; the
//! [`Store`] wrapper serializes them behind one lock so no two transitions
//! interleave. Completion writes are idempotent last-write-wins, so a
//! superseded in-flight fetch landing late is stale but harmless.

pub mod entity;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::models::{
    BucketedSeries, BuildingData, CumulativeSeries, Layered, OverlapData, SeriesSummary,
    TimeRange, Timestamp, Trajectory,
};
use crate::services::exposure::ExposureViews;
use crate::services::playback::PlaybackClock;
use crate::services::simulation::SimulationParams;

pub use entity::{Entity, Freshness, FreshnessStatus};

/// Trail colors cycled by [`DataBank::cycle_trail_color`].
pub const TRAIL_COLORS: [&str; 6] = [
    "#d73027", "#fc8d59", "#fee090", "#e0f3f8", "#91bfdb", "#4575b4",
];

/// Global load indicator: stays not-ready until every entity required for the
/// current view is up to date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStatus {
    pub loaded: bool,
    pub message: String,
}

/// The analysis range and the playback cursor within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeMode {
    pub range: TimeRange,
    pub current_timestamp: Timestamp,
}

/// Known-users list and the primary user selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSelection {
    /// Primary user driving exposure/trajectory/overlap views.
    pub userid_key: String,
    /// Latest imported user id, promoted to primary when its data lands.
    pub submitted_userid_key: Option<String>,
    /// Freshness of the current user's whole fetch+compute pipeline.
    pub data_freshness: Freshness,
    pub known_users: Vec<String>,
    /// Freshness of the known-users list itself.
    pub freshness: Freshness,
}

/// Population-wide series and its derived views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationData {
    pub sessions: Layered<BucketedSeries>,
    pub cumulative: Layered<CumulativeSeries>,
    pub summary: Layered<SeriesSummary>,
    pub freshness: Freshness,
}

/// Everything tracked for one imported user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserData {
    pub sessions: Layered<BucketedSeries>,
    pub sessions_freshness: Freshness,
    /// Whether the fetched series contained any activity.
    pub active: bool,
    pub exposure: Layered<ExposureViews>,
    pub summary: Layered<SeriesSummary>,
    pub trajectory: Layered<Trajectory>,
    pub derived_freshness: Freshness,
    pub trail_visible: bool,
    pub trail_color: String,
}

impl UserData {
    fn template() -> Self {
        Self {
            trail_visible: true,
            trail_color: TRAIL_COLORS[0].to_string(),
            ..Self::default()
        }
    }
}

/// Outbreak simulation parameters and output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationState {
    pub params: SimulationParams,
    pub series: Option<BucketedSeries>,
    pub freshness: Freshness,
}

/// Per-entity freshness snapshot for the active user, exposed for
/// loading/error indicators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreshnessSnapshot {
    pub known_users: Freshness,
    pub buildings: Freshness,
    pub population_sessions: Freshness,
    pub user_sessions: Freshness,
    pub user_derived: Freshness,
    pub overlap: Freshness,
    pub simulation: Freshness,
}

/// The single authoritative state value.
#[derive(Debug, Clone)]
pub struct DataBank {
    pub load_status: LoadStatus,
    pub time_mode: TimeMode,
    pub user: UserSelection,
    pub buildings: Layered<BuildingData>,
    pub buildings_freshness: Freshness,
    pub population: PopulationData,
    pub users_by_id: BTreeMap<String, UserData>,
    pub overlap: OverlapData,
    pub overlap_freshness: Freshness,
    pub simulation: SimulationState,
    pub playback: PlaybackClock,
}

impl DataBank {
    /// Fresh bank over the given range. Every entity starts obsolete except
    /// the simulation, which only becomes relevant once parameters are
    /// submitted.
    pub fn new(range: TimeRange) -> Self {
        Self {
            load_status: LoadStatus::default(),
            time_mode: TimeMode {
                range,
                current_timestamp: range.start,
            },
            user: UserSelection::default(),
            buildings: Layered::default(),
            buildings_freshness: Freshness::obsolete(),
            population: PopulationData::default(),
            users_by_id: BTreeMap::new(),
            overlap: OverlapData::default(),
            overlap_freshness: Freshness::obsolete(),
            simulation: SimulationState {
                freshness: Freshness::up_to_date(),
                ..SimulationState::default()
            },
            playback: PlaybackClock::default(),
        }
    }

    /// The primary user's data, when tracked.
    pub fn active_user_ref(&self) -> Option<&UserData> {
        self.users_by_id.get(&self.user.userid_key)
    }

    // ------------------------------------------------------------------
    // Time mode transitions
    // ------------------------------------------------------------------

    /// Replace the analysis range. A changed range invalidates the population
    /// series, every tracked user's session and derived data, and the overlap
    /// data; the known-users list and building metadata are unaffected. The
    /// playback cursor clamps into the new range.
    pub fn set_time_range(&mut self, range: TimeRange) {
        if range != self.time_mode.range {
            self.population.freshness.mark_obsolete();
            self.user.data_freshness.mark_obsolete();
            self.overlap_freshness.mark_obsolete();
            for user in self.users_by_id.values_mut() {
                user.sessions_freshness.mark_obsolete();
                user.derived_freshness.mark_obsolete();
            }
        }
        self.time_mode.range = range;
        self.time_mode.current_timestamp = range.clamp(self.time_mode.current_timestamp);
    }

    /// Seek the playback cursor, clamped to the range bounds.
    pub fn set_current_time(&mut self, ts: Timestamp) {
        self.time_mode.current_timestamp = self.time_mode.range.clamp(ts);
    }

    // ------------------------------------------------------------------
    // User transitions
    // ------------------------------------------------------------------

    /// Import a user id for tracking. Unknown ids are ignored silently (the
    /// input is not-yet-submitted user typing, not an error state). Returns
    /// whether the import was accepted.
    pub fn import_user(&mut self, userid_key: &str) -> bool {
        if !self.user.known_users.iter().any(|u| u == userid_key) {
            return false;
        }
        self.user.data_freshness.mark_obsolete();
        self.overlap_freshness.mark_obsolete();
        self.load_status.loaded = false;
        self.user.submitted_userid_key = Some(userid_key.to_string());
        self.users_by_id
            .entry(userid_key.to_string())
            .or_insert_with(UserData::template);
        true
    }

    /// Switch the primary user among already-imported users. Only the overlap
    /// data goes stale; session data for the user is still cached. Returns
    /// whether the switch happened.
    pub fn select_user(&mut self, userid_key: &str) -> bool {
        if !self.users_by_id.contains_key(userid_key) {
            return false;
        }
        self.user.userid_key = userid_key.to_string();
        self.overlap_freshness.mark_obsolete();
        true
    }

    pub fn toggle_trail_visibility(&mut self, userid_key: &str) {
        if let Some(user) = self.users_by_id.get_mut(userid_key) {
            user.trail_visible = !user.trail_visible;
        }
    }

    /// Advance a user's trail color through the palette.
    pub fn cycle_trail_color(&mut self, userid_key: &str) {
        if let Some(user) = self.users_by_id.get_mut(userid_key) {
            let current = TRAIL_COLORS
                .iter()
                .position(|c| *c == user.trail_color)
                .unwrap_or(0);
            user.trail_color = TRAIL_COLORS[(current + 1) % TRAIL_COLORS.len()].to_string();
        }
    }

    // ------------------------------------------------------------------
    // Simulation transitions
    // ------------------------------------------------------------------

    pub fn submit_simulation_params(&mut self, params: SimulationParams) {
        self.simulation.params = params;
        self.simulation.freshness.mark_obsolete();
    }

    // ------------------------------------------------------------------
    // Fetch/compute completion writes (issued by the sync orchestrator)
    // ------------------------------------------------------------------

    pub fn begin_known_users(&mut self) {
        self.load_status.message = "Identifying known users...".to_string();
        self.user.freshness.begin_loading();
    }

    pub fn complete_known_users(&mut self, known_users: Vec<String>) {
        self.user.known_users = known_users;
        self.user.freshness.complete();
    }

    pub fn fail_known_users(&mut self, message: String) {
        self.user.freshness.fail(message);
    }

    pub fn begin_buildings(&mut self) {
        self.load_status.message = "Loading building data...".to_string();
        self.buildings_freshness.begin_loading();
    }

    pub fn complete_buildings(&mut self, buildings: Layered<BuildingData>) {
        self.buildings = buildings;
        self.buildings_freshness.complete();
    }

    pub fn fail_buildings(&mut self, message: String) {
        self.buildings_freshness.fail(message);
    }

    pub fn begin_population(&mut self) {
        self.load_status.message = "Loading session counts for all users...".to_string();
        self.population.freshness.begin_loading();
    }

    pub fn complete_population(
        &mut self,
        sessions: Layered<BucketedSeries>,
        cumulative: Layered<CumulativeSeries>,
        summary: Layered<SeriesSummary>,
    ) {
        self.population.sessions = sessions;
        self.population.cumulative = cumulative;
        self.population.summary = summary;
        self.population.freshness.complete();
    }

    pub fn fail_population(&mut self, message: String) {
        self.population.freshness.fail(message);
    }

    pub fn begin_user_sessions(&mut self, userid_key: &str) {
        self.load_status.message = format!("Loading data for user {}...", userid_key);
        if let Some(user) = self.users_by_id.get_mut(userid_key) {
            user.sessions_freshness.begin_loading();
        }
    }

    /// Land a user's refetched series. Derived views were computed against
    /// the previous series, so they go stale together with the landing.
    pub fn complete_user_sessions(
        &mut self,
        userid_key: &str,
        sessions: Layered<BucketedSeries>,
        active: bool,
    ) {
        if let Some(user) = self.users_by_id.get_mut(userid_key) {
            user.sessions = sessions;
            user.active = active;
            user.sessions_freshness.complete();
            user.derived_freshness.mark_obsolete();
        }
    }

    pub fn fail_user_sessions(&mut self, userid_key: &str, message: String) {
        if let Some(user) = self.users_by_id.get_mut(userid_key) {
            user.sessions_freshness.fail(message);
        }
    }

    pub fn begin_user_derived(&mut self, userid_key: &str) {
        self.load_status.message = format!("Computing derived data for user {}...", userid_key);
        if let Some(user) = self.users_by_id.get_mut(userid_key) {
            user.derived_freshness.begin_loading();
        }
    }

    pub fn complete_user_derived(
        &mut self,
        userid_key: &str,
        exposure: Layered<ExposureViews>,
        summary: Layered<SeriesSummary>,
        trajectory: Layered<Trajectory>,
    ) {
        if let Some(user) = self.users_by_id.get_mut(userid_key) {
            user.exposure = exposure;
            user.summary = summary;
            user.trajectory = trajectory;
            user.derived_freshness.complete();
        }
    }

    pub fn fail_user_derived(&mut self, userid_key: &str, message: String) {
        if let Some(user) = self.users_by_id.get_mut(userid_key) {
            user.derived_freshness.fail(message);
        }
    }

    pub fn begin_overlap(&mut self) {
        self.overlap_freshness.begin_loading();
    }

    pub fn complete_overlap(&mut self, overlap: OverlapData) {
        self.overlap = overlap;
        self.overlap_freshness.complete();
    }

    pub fn fail_overlap(&mut self, message: String) {
        self.overlap_freshness.fail(message);
    }

    pub fn begin_simulation(&mut self) {
        self.load_status.loaded = false;
        self.simulation.freshness.begin_loading();
    }

    pub fn complete_simulation(&mut self, series: BucketedSeries) {
        self.simulation.series = Some(series);
        self.simulation.freshness.complete();
        self.load_status.loaded = true;
    }

    pub fn fail_simulation(&mut self, message: String) {
        self.simulation.freshness.fail(message);
        self.load_status.loaded = true;
    }

    pub fn begin_sync(&mut self) {
        self.load_status.loaded = false;
    }

    /// Settle a finished sync pass: the current user pipeline is up to date
    /// and a freshly imported user becomes primary.
    pub fn complete_sync(&mut self) {
        self.user.data_freshness.complete();
        if let Some(submitted) = self.user.submitted_userid_key.take() {
            self.user.userid_key = submitted;
        }
        self.load_status.loaded = true;
        self.load_status.message.clear();
    }

    // ------------------------------------------------------------------
    // Playback transitions
    // ------------------------------------------------------------------

    pub fn playback_toggle_play(&mut self) {
        self.playback.toggle_play();
    }

    /// Stop resets speed to 1 and rewinds to the range start.
    pub fn playback_stop(&mut self) {
        self.playback.stop();
        self.time_mode.current_timestamp = self.time_mode.range.start;
    }

    pub fn playback_step(&mut self, forward: bool) {
        self.time_mode.current_timestamp =
            self.playback
                .step(&self.time_mode.range, self.time_mode.current_timestamp, forward);
    }

    pub fn playback_skip(&mut self, to_end: bool) {
        self.time_mode.current_timestamp = self.playback.skip(&self.time_mode.range, to_end);
    }

    pub fn playback_set_speed(&mut self, speed: i32) {
        self.playback.set_speed(speed);
    }

    pub fn playback_commit_speed(&mut self) {
        self.playback.commit_speed();
    }

    pub fn playback_toggle_loop(&mut self) {
        self.playback.toggle_loop();
    }

    /// One timer tick. Returns whether the clock is still playing afterwards.
    pub fn playback_tick(&mut self) -> bool {
        self.time_mode.current_timestamp = self
            .playback
            .tick(&self.time_mode.range, self.time_mode.current_timestamp);
        self.playback.is_playing()
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Per-entity freshness for the active user.
    pub fn freshness_snapshot(&self) -> FreshnessSnapshot {
        let (user_sessions, user_derived) = match self.active_user_ref() {
            Some(user) => (
                user.sessions_freshness.clone(),
                user.derived_freshness.clone(),
            ),
            None => (Freshness::obsolete(), Freshness::obsolete()),
        };
        FreshnessSnapshot {
            known_users: self.user.freshness.clone(),
            buildings: self.buildings_freshness.clone(),
            population_sessions: self.population.freshness.clone(),
            user_sessions,
            user_derived,
            overlap: self.overlap_freshness.clone(),
            simulation: self.simulation.freshness.clone(),
        }
    }

    /// Freshness record for one entity, active user scoped.
    pub fn freshness(&self, entity: Entity) -> Freshness {
        let snapshot = self.freshness_snapshot();
        match entity {
            Entity::KnownUsers => snapshot.known_users,
            Entity::Buildings => snapshot.buildings,
            Entity::PopulationSessions => snapshot.population_sessions,
            Entity::UserSessions => snapshot.user_sessions,
            Entity::UserDerived => snapshot.user_derived,
            Entity::Overlap => snapshot.overlap,
            Entity::Simulation => snapshot.simulation,
        }
    }

}

/// Cloneable handle to the shared [`DataBank`]. All mutation runs under one
/// write lock, giving the atomic-per-message update discipline the event loop
/// relied on.
#[derive(Clone)]
pub struct Store {
    inner: Arc<RwLock<DataBank>>,
}

impl Store {
    pub fn new(bank: DataBank) -> Self {
        Self {
            inner: Arc::new(RwLock::new(bank)),
        }
    }

    /// Read a snapshot-consistent view.
    pub fn with<R>(&self, f: impl FnOnce(&DataBank) -> R) -> R {
        f(&self.inner.read())
    }

    /// Apply one transition atomically. Callers only go through the
    /// [`DataBank`] transition methods.
    pub fn apply<R>(&self, f: impl FnOnce(&mut DataBank) -> R) -> R {
        f(&mut self.inner.write())
    }

    pub fn time_mode(&self) -> TimeMode {
        self.with(|bank| bank.time_mode)
    }

    pub fn playback(&self) -> PlaybackClock {
        self.with(|bank| bank.playback)
    }
}

#[cfg(test)]
mod tests {
    use super::{DataBank, FreshnessStatus, TRAIL_COLORS};
    use crate::models::{TimeRange, Timestamp};

    fn bank() -> DataBank {
        let mut bank = DataBank::new(TimeRange::new(Timestamp::new(0), Timestamp::new(600), 60));
        bank.complete_known_users(vec!["21".into(), "2311".into()]);
        bank
    }

    #[test]
    fn test_initial_freshness() {
        let bank = DataBank::new(TimeRange::new(Timestamp::new(0), Timestamp::new(600), 60));
        assert_eq!(bank.population.freshness.status, FreshnessStatus::Obsolete);
        assert_eq!(bank.buildings_freshness.status, FreshnessStatus::Obsolete);
        // Simulation only goes stale once parameters are submitted.
        assert_eq!(bank.simulation.freshness.status, FreshnessStatus::UpToDate);
        assert_eq!(bank.time_mode.current_timestamp, Timestamp::new(0));
    }

    #[test]
    fn test_time_range_change_cascades_invalidation() {
        let mut bank = bank();
        bank.import_user("21");
        bank.population.freshness.complete();
        bank.user.data_freshness.complete();
        bank.overlap_freshness.complete();
        bank.user.freshness.complete();
        bank.buildings_freshness.complete();
        {
            let user = bank.users_by_id.get_mut("21").unwrap();
            user.sessions_freshness.complete();
            user.derived_freshness.complete();
        }

        bank.set_time_range(TimeRange::new(Timestamp::new(0), Timestamp::new(1200), 60));

        assert_eq!(bank.population.freshness.status, FreshnessStatus::Obsolete);
        assert_eq!(bank.user.data_freshness.status, FreshnessStatus::Obsolete);
        assert_eq!(bank.overlap_freshness.status, FreshnessStatus::Obsolete);
        // Tracked users go stale end to end: sessions and derived views.
        let user = &bank.users_by_id["21"];
        assert_eq!(user.sessions_freshness.status, FreshnessStatus::Obsolete);
        assert_eq!(user.derived_freshness.status, FreshnessStatus::Obsolete);
        // Known users and buildings are unaffected.
        assert_eq!(bank.user.freshness.status, FreshnessStatus::UpToDate);
        assert_eq!(bank.buildings_freshness.status, FreshnessStatus::UpToDate);
    }

    #[test]
    fn test_unchanged_time_range_does_not_invalidate() {
        let mut bank = bank();
        bank.population.freshness.complete();
        bank.set_time_range(bank.time_mode.range);
        assert_eq!(bank.population.freshness.status, FreshnessStatus::UpToDate);
    }

    #[test]
    fn test_range_change_clamps_current_timestamp() {
        let mut bank = bank();
        bank.set_current_time(Timestamp::new(600));
        bank.set_time_range(TimeRange::new(Timestamp::new(0), Timestamp::new(300), 60));
        assert_eq!(bank.time_mode.current_timestamp, Timestamp::new(300));
    }

    #[test]
    fn test_import_unknown_user_silently_ignored() {
        let mut bank = bank();
        assert!(!bank.import_user("99999"));
        assert!(bank.users_by_id.is_empty());
        assert_eq!(bank.user.submitted_userid_key, None);
    }

    #[test]
    fn test_import_known_user_flags_and_templates() {
        let mut bank = bank();
        assert!(bank.import_user("2311"));
        assert!(bank.users_by_id.contains_key("2311"));
        assert_eq!(bank.user.submitted_userid_key.as_deref(), Some("2311"));
        assert!(!bank.load_status.loaded);
        assert_eq!(bank.user.data_freshness.status, FreshnessStatus::Obsolete);
        assert_eq!(bank.overlap_freshness.status, FreshnessStatus::Obsolete);
    }

    #[test]
    fn test_landing_user_sessions_stales_derived_views() {
        let mut bank = bank();
        bank.import_user("21");
        {
            let user = bank.users_by_id.get_mut("21").unwrap();
            user.derived_freshness.complete();
        }
        bank.complete_user_sessions("21", Default::default(), false);
        let user = &bank.users_by_id["21"];
        assert_eq!(user.sessions_freshness.status, FreshnessStatus::UpToDate);
        assert_eq!(user.derived_freshness.status, FreshnessStatus::Obsolete);
    }

    #[test]
    fn test_select_cached_user_marks_overlap_only() {
        let mut bank = bank();
        bank.import_user("21");
        bank.import_user("2311");
        bank.complete_sync();
        assert_eq!(bank.user.userid_key, "2311");

        bank.population.freshness.complete();
        bank.overlap_freshness.complete();
        assert!(bank.select_user("21"));
        assert_eq!(bank.user.userid_key, "21");
        assert_eq!(bank.overlap_freshness.status, FreshnessStatus::Obsolete);
        // Cached session data stays fresh.
        assert_eq!(bank.population.freshness.status, FreshnessStatus::UpToDate);
        assert_eq!(bank.user.data_freshness.status, FreshnessStatus::UpToDate);
    }

    #[test]
    fn test_select_unknown_user_ignored() {
        let mut bank = bank();
        assert!(!bank.select_user("21"));
        assert_eq!(bank.user.userid_key, "");
    }

    #[test]
    fn test_complete_sync_promotes_submitted_user() {
        let mut bank = bank();
        bank.import_user("21");
        bank.complete_sync();
        assert_eq!(bank.user.userid_key, "21");
        assert_eq!(bank.user.submitted_userid_key, None);
        assert!(bank.load_status.loaded);
        assert_eq!(bank.user.data_freshness.status, FreshnessStatus::UpToDate);
    }

    #[test]
    fn test_cycle_trail_color() {
        let mut bank = bank();
        bank.import_user("21");
        bank.cycle_trail_color("21");
        assert_eq!(bank.users_by_id["21"].trail_color, TRAIL_COLORS[1]);
        for _ in 0..TRAIL_COLORS.len() - 1 {
            bank.cycle_trail_color("21");
        }
        assert_eq!(bank.users_by_id["21"].trail_color, TRAIL_COLORS[0]);
    }

    #[test]
    fn test_playback_stop_rewinds() {
        let mut bank = bank();
        bank.set_current_time(Timestamp::new(300));
        bank.playback_set_speed(4);
        bank.playback_stop();
        assert_eq!(bank.time_mode.current_timestamp, Timestamp::new(0));
        assert_eq!(bank.playback.speed, 1);
    }
}
