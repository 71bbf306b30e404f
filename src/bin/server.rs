//! CampusTrace HTTP Server Binary
//!
//! Entry point for the occupancy engine REST API. Seeds the in-memory data
//! provider with demo fixtures, runs an initial sync pass and starts serving.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin campustrace-server --features http-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use campustrace::http::{create_router, AppState};
use campustrace::models::{
    BuildingData, LayerFeature, Layered, SessionRecord, TimeRange, Timestamp,
};
use campustrace::services::SyncEngine;
use campustrace::source::LocalProvider;
use campustrace::state::{DataBank, Store};

/// Users importable out of the box in the demo dataset.
const DEFAULT_USERS: [&str; 2] = ["31761", "2311"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    info!("Starting CampusTrace HTTP Server");

    let range = default_range()?;
    let store = Store::new(DataBank::new(range));
    let provider = Arc::new(seed_provider(range));
    let engine = SyncEngine::new(store.clone(), provider);

    // First refresh in the background so the server is reachable immediately.
    let startup_engine = engine.clone();
    tokio::spawn(async move {
        startup_engine.sync_all().await;
    });

    let state = AppState::new(store, engine);
    let app = create_router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn default_range() -> anyhow::Result<TimeRange> {
    let start = Timestamp::parse("2020-01-06 06:00:00")?;
    let end = Timestamp::parse("2020-01-06 23:00:00")?;
    Ok(TimeRange::new(start, end, 900))
}

/// Demo fixtures: two tracked-ready users moving through two buildings.
fn seed_provider(range: TimeRange) -> LocalProvider {
    let feature = |layer_key: &str, lon: f64, lat: f64, floor: i32| LayerFeature {
        layer_key: layer_key.to_string(),
        lon,
        lat,
        height: 4.0 * (floor.max(1) as f64),
        area: 800.0,
        floor,
        description: String::new(),
    };

    let aggregated = BuildingData::from_features(vec![
        feature("E2", 103.7716, 1.3031, 0),
        feature("COM1", 103.7736, 1.2949, 0),
    ]);
    let per_floor = BuildingData::from_features(vec![
        feature("E2_F1", 103.7716, 1.3031, 1),
        feature("E2_F2", 103.7716, 1.3031, 2),
        feature("COM1_F1", 103.7736, 1.2949, 1),
    ]);

    let record = |layer: &str, bucket: usize, count: i64| {
        SessionRecord::new(
            layer,
            range.start.offset(bucket as i64 * range.interval_seconds),
            count,
        )
    };

    let population = Layered::new(
        vec![
            record("E2", 0, 12),
            record("COM1", 0, 5),
            record("E2", 1, 17),
            record("COM1", 2, 9),
            record("E2", 4, 3),
        ],
        vec![
            record("E2_F1", 0, 8),
            record("E2_F2", 0, 4),
            record("COM1_F1", 0, 5),
            record("E2_F1", 1, 17),
            record("COM1_F1", 2, 9),
        ],
    );

    let user_31761 = Layered::new(
        vec![record("E2", 0, 1), record("E2", 1, 1), record("COM1", 2, 1)],
        vec![
            record("E2_F1", 0, 1),
            record("E2_F2", 1, 1),
            record("COM1_F1", 2, 1),
        ],
    );
    let user_2311 = Layered::new(
        vec![record("COM1", 0, 1), record("COM1", 2, 1)],
        vec![record("COM1_F1", 0, 1), record("COM1_F1", 2, 1)],
    );

    LocalProvider::new()
        .with_known_users(DEFAULT_USERS)
        .with_buildings(Layered::new(aggregated, per_floor))
        .with_population(population)
        .with_user_records("31761", user_31761)
        .with_user_records("2311", user_2311)
}
