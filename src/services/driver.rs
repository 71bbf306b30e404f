//! Background playback driver.
//!
//! Owns the tokio task that ticks the playback clock. Whenever phase or
//! speed changes the caller refreshes the driver; the old ticker is aborted
//! and a new one spawned at the period the speed table dictates. A tick that
//! pauses the clock (end of range, loop off) ends the task on its own.

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::services::playback::PlaybackClock;
use crate::state::Store;

pub struct PlaybackDriver {
    store: Store,
    ticker: Option<JoinHandle<()>>,
}

impl PlaybackDriver {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            ticker: None,
        }
    }

    /// Align the ticker task with the clock's current phase and speed.
    pub fn refresh(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }

        let clock = self.store.playback();
        if !clock.is_playing() {
            return;
        }
        let Some(period) = PlaybackClock::tick_period(clock.speed) else {
            return;
        };

        let store = self.store.clone();
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // A stalled executor should drop ticks, not replay them in a burst.
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await;
            loop {
                interval.tick().await;
                if !store.apply(|bank| bank.playback_tick()) {
                    break;
                }
            }
        }));
    }

    pub fn is_running(&self) -> bool {
        self.ticker.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for PlaybackDriver {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PlaybackDriver;
    use crate::models::{TimeRange, Timestamp};
    use crate::state::{DataBank, Store};

    fn store() -> Store {
        Store::new(DataBank::new(TimeRange::new(
            Timestamp::new(0),
            Timestamp::new(600),
            60,
        )))
    }

    #[tokio::test]
    async fn test_ticker_advances_cursor() {
        let store = store();
        store.apply(|bank| {
            bank.playback_set_speed(4);
            bank.playback_toggle_play();
        });
        let mut driver = PlaybackDriver::new(store.clone());
        driver.refresh();

        // Speed 4 ticks every 31.25ms.
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        let cursor = store.with(|bank| bank.time_mode.current_timestamp);
        assert!(cursor > Timestamp::new(0));
    }

    #[tokio::test]
    async fn test_refresh_while_paused_spawns_nothing() {
        let store = store();
        let mut driver = PlaybackDriver::new(store);
        driver.refresh();
        assert!(!driver.is_running());
    }
}
