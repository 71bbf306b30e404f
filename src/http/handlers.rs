//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint; reads return snapshots from
//! the store and writes go through the state transition methods, spawning a
//! background sync pass whenever a transition leaves entities stale.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::dto::{
    HealthResponse, LayerQuery, SetCurrentRequest, SetRangeRequest, SimulationRequest,
    SkipRequest, SliceQuery, SliceResponse, SpeedRequest, StatusResponse, StepRequest,
    TrackedUserDto, UserRequest, UsersResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::{OverlapData, SeriesSummary, TimeRange, Trajectory};
use crate::services::view;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health and status
// =============================================================================

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
    })
}

/// GET /v1/status
///
/// Load status, per-entity freshness, time mode and playback clock in one
/// snapshot-consistent read.
pub async fn get_status(State(state): State<AppState>) -> HandlerResult<StatusResponse> {
    Ok(Json(state.store.with(|bank| StatusResponse {
        load_status: bank.load_status.clone(),
        freshness: bank.freshness_snapshot(),
        time_mode: bank.time_mode,
        playback: bank.playback,
    })))
}

// =============================================================================
// Time mode
// =============================================================================

/// PUT /v1/time-mode/range
///
/// Replace the analysis range and refresh everything it invalidates.
pub async fn set_time_range(
    State(state): State<AppState>,
    Json(request): Json<SetRangeRequest>,
) -> HandlerResult<StatusResponse> {
    let range = TimeRange::new(request.start, request.end, request.interval_seconds);
    range.validate().map_err(AppError::from)?;
    state.store.apply(|bank| bank.set_time_range(range));
    state.spawn_sync();
    get_status(State(state)).await
}

/// PUT /v1/time-mode/current
pub async fn set_current_time(
    State(state): State<AppState>,
    Json(request): Json<SetCurrentRequest>,
) -> HandlerResult<StatusResponse> {
    state
        .store
        .apply(|bank| bank.set_current_time(request.timestamp));
    get_status(State(state)).await
}

// =============================================================================
// Users
// =============================================================================

/// GET /v1/users
pub async fn list_users(State(state): State<AppState>) -> HandlerResult<UsersResponse> {
    Ok(Json(state.store.with(|bank| UsersResponse {
        known_users: bank.user.known_users.clone(),
        tracked_users: bank
            .users_by_id
            .iter()
            .map(|(id, user)| TrackedUserDto {
                userid_key: id.clone(),
                active: user.active,
                trail_visible: user.trail_visible,
                trail_color: user.trail_color.clone(),
            })
            .collect(),
        primary_userid_key: bank.user.userid_key.clone(),
    })))
}

/// POST /v1/users/import
///
/// Import a user for tracking. Unknown ids return 404 rather than erroring
/// the bank; a successful import schedules a sync pass.
pub async fn import_user(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> HandlerResult<UsersResponse> {
    let accepted = state
        .store
        .apply(|bank| bank.import_user(&request.userid_key));
    if !accepted {
        return Err(AppError::NotFound(format!(
            "unknown user {}",
            request.userid_key
        )));
    }
    state.spawn_sync();
    list_users(State(state)).await
}

/// POST /v1/users/select
///
/// Switch the primary user among tracked users. Only overlap data refreshes.
pub async fn select_user(
    State(state): State<AppState>,
    Json(request): Json<UserRequest>,
) -> HandlerResult<UsersResponse> {
    let switched = state
        .store
        .apply(|bank| bank.select_user(&request.userid_key));
    if !switched {
        return Err(AppError::NotFound(format!(
            "user {} is not tracked",
            request.userid_key
        )));
    }
    state.spawn_sync();
    list_users(State(state)).await
}

/// POST /v1/users/{userid_key}/trail/toggle
pub async fn toggle_trail(
    State(state): State<AppState>,
    Path(userid_key): Path<String>,
) -> HandlerResult<UsersResponse> {
    state
        .store
        .apply(|bank| bank.toggle_trail_visibility(&userid_key));
    list_users(State(state)).await
}

/// POST /v1/users/{userid_key}/trail/color
pub async fn cycle_trail_color(
    State(state): State<AppState>,
    Path(userid_key): Path<String>,
) -> HandlerResult<UsersResponse> {
    state.store.apply(|bank| bank.cycle_trail_color(&userid_key));
    list_users(State(state)).await
}

/// GET /v1/users/{userid_key}/summary?layer=
pub async fn get_user_summary(
    State(state): State<AppState>,
    Path(userid_key): Path<String>,
    Query(query): Query<LayerQuery>,
) -> HandlerResult<SeriesSummary> {
    state
        .store
        .with(|bank| {
            bank.users_by_id
                .get(&userid_key)
                .map(|user| user.summary.get(query.layer).clone())
        })
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {userid_key} is not tracked")))
}

/// GET /v1/users/{userid_key}/trajectory?layer=
pub async fn get_trajectory(
    State(state): State<AppState>,
    Path(userid_key): Path<String>,
    Query(query): Query<LayerQuery>,
) -> HandlerResult<Trajectory> {
    state
        .store
        .with(|bank| {
            bank.users_by_id
                .get(&userid_key)
                .map(|user| user.trajectory.get(query.layer).clone())
        })
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {userid_key} is not tracked")))
}

// =============================================================================
// Series views
// =============================================================================

/// GET /v1/slice?display=&layer=
///
/// Per-location counts at the playback cursor for one display mode.
pub async fn get_slice(
    State(state): State<AppState>,
    Query(query): Query<SliceQuery>,
) -> HandlerResult<SliceResponse> {
    Ok(Json(state.store.with(|bank| SliceResponse {
        timestamp: bank.time_mode.current_timestamp,
        values: view::current_slice(bank, query.display, query.layer),
    })))
}

/// GET /v1/population/summary?layer=
pub async fn get_population_summary(
    State(state): State<AppState>,
    Query(query): Query<LayerQuery>,
) -> HandlerResult<SeriesSummary> {
    Ok(Json(state.store.with(|bank| {
        bank.population.summary.get(query.layer).clone()
    })))
}

/// GET /v1/overlap
pub async fn get_overlap(State(state): State<AppState>) -> HandlerResult<OverlapData> {
    Ok(Json(state.store.with(|bank| bank.overlap.clone())))
}

// =============================================================================
// Simulation
// =============================================================================

/// POST /v1/simulation
///
/// Submit parameters and run the outbreak model in the background.
pub async fn run_simulation(
    State(state): State<AppState>,
    Json(request): Json<SimulationRequest>,
) -> HandlerResult<StatusResponse> {
    state
        .store
        .apply(|bank| bank.submit_simulation_params(request.params));
    let engine = state.engine.clone();
    tokio::spawn(async move {
        engine.sync_simulation().await;
    });
    get_status(State(state)).await
}

// =============================================================================
// Sync
// =============================================================================

/// POST /v1/sync
pub async fn trigger_sync(State(state): State<AppState>) -> HandlerResult<StatusResponse> {
    state.spawn_sync();
    get_status(State(state)).await
}

// =============================================================================
// Playback
// =============================================================================

async fn refresh_driver(state: &AppState) {
    state.driver.lock().await.refresh();
}

/// POST /v1/playback/toggle
pub async fn playback_toggle(State(state): State<AppState>) -> HandlerResult<StatusResponse> {
    state.store.apply(|bank| bank.playback_toggle_play());
    refresh_driver(&state).await;
    get_status(State(state)).await
}

/// POST /v1/playback/stop
pub async fn playback_stop(State(state): State<AppState>) -> HandlerResult<StatusResponse> {
    state.store.apply(|bank| bank.playback_stop());
    refresh_driver(&state).await;
    get_status(State(state)).await
}

/// POST /v1/playback/step
pub async fn playback_step(
    State(state): State<AppState>,
    Json(request): Json<StepRequest>,
) -> HandlerResult<StatusResponse> {
    state.store.apply(|bank| bank.playback_step(request.forward));
    refresh_driver(&state).await;
    get_status(State(state)).await
}

/// POST /v1/playback/skip
pub async fn playback_skip(
    State(state): State<AppState>,
    Json(request): Json<SkipRequest>,
) -> HandlerResult<StatusResponse> {
    state.store.apply(|bank| bank.playback_skip(request.to_end));
    refresh_driver(&state).await;
    get_status(State(state)).await
}

/// POST /v1/playback/speed
///
/// Live speed preview while the slider is held; clamped to the valid span.
pub async fn playback_set_speed(
    State(state): State<AppState>,
    Json(request): Json<SpeedRequest>,
) -> HandlerResult<StatusResponse> {
    state
        .store
        .apply(|bank| bank.playback_set_speed(request.speed));
    refresh_driver(&state).await;
    get_status(State(state)).await
}

/// POST /v1/playback/speed/commit
///
/// Slider release: a committed zero pauses and resets speed to 1.
pub async fn playback_commit_speed(State(state): State<AppState>) -> HandlerResult<StatusResponse> {
    state.store.apply(|bank| bank.playback_commit_speed());
    refresh_driver(&state).await;
    get_status(State(state)).await
}

/// POST /v1/playback/loop
pub async fn playback_toggle_loop(State(state): State<AppState>) -> HandlerResult<StatusResponse> {
    state.store.apply(|bank| bank.playback_toggle_loop());
    get_status(State(state)).await
}
