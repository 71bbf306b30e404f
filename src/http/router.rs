//! Router configuration for the HTTP API.
//!
//! Sets up all routes and middleware (CORS, compression, tracing) and
//! produces the axum router ready for serving.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Permissive CORS for development; restrict in production.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/status", get(handlers::get_status))
        .route("/sync", post(handlers::trigger_sync))
        // Time mode
        .route("/time-mode/range", put(handlers::set_time_range))
        .route("/time-mode/current", put(handlers::set_current_time))
        // Users
        .route("/users", get(handlers::list_users))
        .route("/users/import", post(handlers::import_user))
        .route("/users/select", post(handlers::select_user))
        .route("/users/{userid_key}/trail/toggle", post(handlers::toggle_trail))
        .route("/users/{userid_key}/trail/color", post(handlers::cycle_trail_color))
        .route("/users/{userid_key}/summary", get(handlers::get_user_summary))
        .route("/users/{userid_key}/trajectory", get(handlers::get_trajectory))
        // Series views
        .route("/slice", get(handlers::get_slice))
        .route("/population/summary", get(handlers::get_population_summary))
        .route("/overlap", get(handlers::get_overlap))
        // Simulation
        .route("/simulation", post(handlers::run_simulation))
        // Playback
        .route("/playback/toggle", post(handlers::playback_toggle))
        .route("/playback/stop", post(handlers::playback_stop))
        .route("/playback/step", post(handlers::playback_step))
        .route("/playback/skip", post(handlers::playback_skip))
        .route("/playback/speed", post(handlers::playback_set_speed))
        .route("/playback/speed/commit", post(handlers::playback_commit_speed))
        .route("/playback/loop", post(handlers::playback_toggle_loop));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::models::{TimeRange, Timestamp};
    use crate::services::SyncEngine;
    use crate::source::LocalProvider;
    use crate::state::{DataBank, Store};

    #[test]
    fn test_router_creation() {
        let store = Store::new(DataBank::new(TimeRange::new(
            Timestamp::new(0),
            Timestamp::new(3600),
            900,
        )));
        let provider = Arc::new(LocalProvider::new());
        let engine = SyncEngine::new(store.clone(), provider);
        let _router = create_router(AppState::new(store, engine));
    }
}
