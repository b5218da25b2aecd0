//! Game clock
//!
//! Tracks game time in hours and tells the tick loop when an infrequent
//! update interval boundary has been crossed.

use serde::{Deserialize, Serialize};

use crate::core::types::{GameTime, Tick};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameClock {
    hours: GameTime,
    tick: Tick,
    /// Game time at which the last infrequent update ran
    last_infrequent: GameTime,
}

impl GameClock {
    pub fn new() -> Self {
        Self::starting_at(0.0)
    }

    pub fn starting_at(hours: GameTime) -> Self {
        Self {
            hours,
            tick: 0,
            last_infrequent: hours,
        }
    }

    pub fn now(&self) -> GameTime {
        self.hours
    }

    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn current_day(&self) -> u64 {
        (self.hours / 24.0).floor() as u64
    }

    pub fn hour_of_day(&self) -> u32 {
        (self.hours % 24.0).floor() as u32
    }

    /// Advance by `delta_hours` of game time (one tick)
    pub fn advance(&mut self, delta_hours: f64) {
        self.hours += delta_hours.max(0.0);
        self.tick += 1;
    }

    /// If at least `interval` hours passed since the last infrequent update,
    /// mark it done and return the elapsed hours it should cover.
    pub fn take_infrequent(&mut self, interval: f64) -> Option<f64> {
        let elapsed = self.hours - self.last_infrequent;
        if elapsed >= interval {
            self.last_infrequent = self.hours;
            Some(elapsed)
        } else {
            None
        }
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}
