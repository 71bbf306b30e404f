//! Application state for the HTTP server.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::services::{PlaybackDriver, SyncEngine};
use crate::state::Store;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Shared data bank handle.
    pub store: Store,
    /// Sync orchestrator for refresh passes.
    pub engine: SyncEngine,
    /// Playback ticker, refreshed after every playback transition.
    pub driver: Arc<Mutex<PlaybackDriver>>,
}

impl AppState {
    pub fn new(store: Store, engine: SyncEngine) -> Self {
        let driver = Arc::new(Mutex::new(PlaybackDriver::new(store.clone())));
        Self {
            store,
            engine,
            driver,
        }
    }

    /// Schedule a full sync pass in the background.
    pub fn spawn_sync(&self) {
        let engine = self.engine.clone();
        tokio::spawn(async move {
            engine.sync_all().await;
        });
    }
}
