//! Playback clock: advances the current timestamp at a configurable rate and
//! direction, with looping, pausing and boundary clamping.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{TimeRange, Timestamp};

/// Highest speed level the transport controls expose, in either direction.
pub const MAX_SPEED: i32 = 10;

/// Transport phase. `Stopped` is the rest state after an explicit reset;
/// `Paused` holds the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackPhase {
    Stopped,
    Paused,
    Playing,
}

/// Playback clock state. The current timestamp itself lives in the data bank's
/// time mode; the clock computes how it moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackClock {
    pub phase: PlaybackPhase,
    /// Speed level in `[-MAX_SPEED, MAX_SPEED]`. `0` is a no-motion sentinel;
    /// committing a speed control at `0` corrects to paused + speed `1`.
    pub speed: i32,
    pub loop_enabled: bool,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            phase: PlaybackPhase::Stopped,
            speed: 1,
            loop_enabled: true,
        }
    }
}

impl PlaybackClock {
    /// Step multiplier for the speed level: unit up to level 4, then a
    /// nonlinear ramp (5 -> 2x, 6 -> 3x, ...).
    pub fn multiplier(speed: i32) -> i64 {
        let magnitude = speed.abs() as i64;
        if magnitude > 4 {
            magnitude - 3
        } else {
            1
        }
    }

    /// Wall-clock period between ticks for a speed level; `None` at the
    /// no-motion sentinel. Smaller period = faster perceived motion; levels
    /// past 4 keep the shortest period and grow the step instead.
    pub fn tick_period(speed: i32) -> Option<Duration> {
        match speed.abs() {
            0 => None,
            1 => Some(Duration::from_millis(250)),
            2 => Some(Duration::from_millis(125)),
            3 => Some(Duration::from_micros(62_500)),
            _ => Some(Duration::from_micros(31_250)),
        }
    }

    /// Toggle between playing and paused.
    pub fn toggle_play(&mut self) {
        self.phase = if self.phase == PlaybackPhase::Playing {
            PlaybackPhase::Paused
        } else {
            PlaybackPhase::Playing
        };
    }

    /// Force stop: rest phase, unit speed. The caller resets the current
    /// timestamp to the range start.
    pub fn stop(&mut self) {
        self.phase = PlaybackPhase::Stopped;
        self.speed = 1;
    }

    /// Manual single-interval step. Forces paused; no wraparound, the result
    /// clamps to the range bounds.
    pub fn step(&mut self, range: &TimeRange, current: Timestamp, forward: bool) -> Timestamp {
        self.phase = PlaybackPhase::Paused;
        let delta = if forward {
            range.interval_seconds
        } else {
            -range.interval_seconds
        };
        range.clamp(current.offset(delta))
    }

    /// Jump to a range bound. Forces paused.
    pub fn skip(&mut self, range: &TimeRange, to_end: bool) -> Timestamp {
        self.phase = PlaybackPhase::Paused;
        if to_end {
            range.end
        } else {
            range.start
        }
    }

    /// Set the speed level, clamped to the allowed band.
    pub fn set_speed(&mut self, speed: i32) {
        self.speed = speed.clamp(-MAX_SPEED, MAX_SPEED);
    }

    /// Commit a released speed control. Releasing at `0` would leave playback
    /// stuck, so it corrects to paused + unit speed.
    pub fn commit_speed(&mut self) {
        if self.speed == 0 {
            self.phase = PlaybackPhase::Paused;
            self.speed = 1;
        }
    }

    pub fn toggle_loop(&mut self) {
        self.loop_enabled = !self.loop_enabled;
    }

    pub fn is_playing(&self) -> bool {
        self.phase == PlaybackPhase::Playing
    }

    /// Advance the current timestamp by one tick.
    ///
    /// While playing, shifts by `interval * sign(speed) * multiplier(speed)`,
    /// clamped at the boundary in the direction of travel. Reaching the
    /// boundary pauses unless looping; a tick that starts already parked on
    /// the boundary wraps to the opposite bound when looping.
    pub fn tick(&mut self, range: &TimeRange, current: Timestamp) -> Timestamp {
        if self.phase != PlaybackPhase::Playing || self.speed == 0 {
            return current;
        }
        let forward = self.speed > 0;
        let at_boundary = if forward {
            current >= range.end
        } else {
            current <= range.start
        };
        if at_boundary {
            if self.loop_enabled {
                return if forward { range.start } else { range.end };
            }
            self.phase = PlaybackPhase::Paused;
            return current;
        }

        let step = range.interval_seconds * if forward { 1 } else { -1 } * Self::multiplier(self.speed);
        let next = range.clamp(current.offset(step));
        let reached = if forward {
            next >= range.end
        } else {
            next <= range.start
        };
        if reached && !self.loop_enabled {
            self.phase = PlaybackPhase::Paused;
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::{PlaybackClock, PlaybackPhase, MAX_SPEED};
    use crate::models::{TimeRange, Timestamp};
    use std::time::Duration;

    fn range() -> TimeRange {
        TimeRange::new(Timestamp::new(0), Timestamp::new(600), 60)
    }

    fn playing(speed: i32, loop_enabled: bool) -> PlaybackClock {
        PlaybackClock {
            phase: PlaybackPhase::Playing,
            speed,
            loop_enabled,
        }
    }

    #[test]
    fn test_tick_advances_one_interval_at_unit_speed() {
        let mut clock = playing(1, false);
        assert_eq!(
            clock.tick(&range(), Timestamp::new(0)),
            Timestamp::new(60)
        );
        assert_eq!(clock.phase, PlaybackPhase::Playing);
    }

    #[test]
    fn test_tick_multiplier_above_four() {
        assert_eq!(PlaybackClock::multiplier(4), 1);
        assert_eq!(PlaybackClock::multiplier(5), 2);
        assert_eq!(PlaybackClock::multiplier(-7), 4);
        let mut clock = playing(5, false);
        assert_eq!(
            clock.tick(&range(), Timestamp::new(0)),
            Timestamp::new(120)
        );
    }

    #[test]
    fn test_tick_reverse_direction() {
        let mut clock = playing(-1, false);
        assert_eq!(
            clock.tick(&range(), Timestamp::new(120)),
            Timestamp::new(60)
        );
    }

    #[test]
    fn test_clamp_and_pause_without_loop() {
        // One tick from end - 1 interval reaches end exactly and pauses.
        let mut clock = playing(1, false);
        let next = clock.tick(&range(), Timestamp::new(540));
        assert_eq!(next, Timestamp::new(600));
        assert_eq!(clock.phase, PlaybackPhase::Paused);
        // Held exactly at the end, never exceeding it.
        let held = clock.tick(&range(), next);
        assert_eq!(held, Timestamp::new(600));
    }

    #[test]
    fn test_loop_wraps_on_next_tick_after_reaching_end() {
        let mut clock = playing(1, true);
        let at_end = clock.tick(&range(), Timestamp::new(540));
        assert_eq!(at_end, Timestamp::new(600));
        assert_eq!(clock.phase, PlaybackPhase::Playing);
        assert_eq!(clock.tick(&range(), at_end), Timestamp::new(0));
    }

    #[test]
    fn test_loop_wraps_backward_to_end() {
        let mut clock = playing(-1, true);
        assert_eq!(
            clock.tick(&range(), Timestamp::new(0)),
            Timestamp::new(600)
        );
    }

    #[test]
    fn test_overshoot_clamps_to_boundary() {
        // Speed 10 steps 7 intervals; from 540 that overshoots 600.
        let mut clock = playing(10, true);
        assert_eq!(
            clock.tick(&range(), Timestamp::new(540)),
            Timestamp::new(600)
        );
    }

    #[test]
    fn test_speed_zero_holds_position() {
        let mut clock = playing(0, false);
        assert_eq!(
            clock.tick(&range(), Timestamp::new(120)),
            Timestamp::new(120)
        );
        assert_eq!(clock.phase, PlaybackPhase::Playing);
    }

    #[test]
    fn test_commit_speed_zero_corrects_to_paused_unit() {
        let mut clock = playing(0, false);
        clock.commit_speed();
        assert_eq!(clock.phase, PlaybackPhase::Paused);
        assert_eq!(clock.speed, 1);
        // Committing a nonzero speed changes nothing.
        clock.phase = PlaybackPhase::Playing;
        clock.speed = 3;
        clock.commit_speed();
        assert_eq!(clock.phase, PlaybackPhase::Playing);
        assert_eq!(clock.speed, 3);
    }

    #[test]
    fn test_manual_step_forces_paused_and_clamps() {
        let mut clock = playing(1, true);
        let next = clock.step(&range(), Timestamp::new(600), true);
        assert_eq!(next, Timestamp::new(600));
        assert_eq!(clock.phase, PlaybackPhase::Paused);
        let back = clock.step(&range(), Timestamp::new(0), false);
        assert_eq!(back, Timestamp::new(0));
    }

    #[test]
    fn test_skip_and_stop() {
        let mut clock = playing(6, false);
        assert_eq!(clock.skip(&range(), true), Timestamp::new(600));
        assert_eq!(clock.phase, PlaybackPhase::Paused);
        clock.stop();
        assert_eq!(clock.phase, PlaybackPhase::Stopped);
        assert_eq!(clock.speed, 1);
    }

    #[test]
    fn test_set_speed_clamps_to_band() {
        let mut clock = PlaybackClock::default();
        clock.set_speed(99);
        assert_eq!(clock.speed, MAX_SPEED);
        clock.set_speed(-99);
        assert_eq!(clock.speed, -MAX_SPEED);
    }

    #[test]
    fn test_tick_period_lookup() {
        assert_eq!(PlaybackClock::tick_period(0), None);
        assert_eq!(PlaybackClock::tick_period(1), Some(Duration::from_millis(250)));
        assert_eq!(PlaybackClock::tick_period(-2), Some(Duration::from_millis(125)));
        assert_eq!(
            PlaybackClock::tick_period(3),
            Some(Duration::from_micros(62_500))
        );
        assert_eq!(
            PlaybackClock::tick_period(10),
            Some(Duration::from_micros(31_250))
        );
    }
}
