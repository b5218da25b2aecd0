//! Physical needs and mood

use serde::{Deserialize, Serialize};

use crate::core::config::NeedsConfig;
use crate::entity::memory::MemoryKind;
use crate::entity::status::StatusKind;

pub const NEED_MAX: f32 = 100.0;

/// Sleep regained per hour while sleeping
pub const SLEEP_RECOVERY_PER_HOUR: f32 = 12.5;

/// Fulfilment values, 100 = fully satisfied, 0 = desperate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    pub food: f32,
    pub drink: f32,
    pub sleep: f32,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            food: 80.0,
            drink: 80.0,
            sleep: 80.0,
        }
    }
}

impl Needs {
    pub fn get(&self, need: NeedType) -> f32 {
        match need {
            NeedType::Food => self.food,
            NeedType::Drink => self.drink,
            NeedType::Sleep => self.sleep,
        }
    }

    /// Least satisfied need
    pub fn most_pressing(&self) -> (NeedType, f32) {
        [
            (NeedType::Drink, self.drink),
            (NeedType::Food, self.food),
            (NeedType::Sleep, self.sleep),
        ]
        .into_iter()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or((NeedType::Food, self.food))
    }

    /// Decay needs over `hours` of game time
    pub fn decay(&mut self, hours: f32, config: &NeedsConfig, sleeping: bool) {
        self.food = (self.food - config.food_decay_per_hour * hours).clamp(0.0, NEED_MAX);
        self.drink = (self.drink - config.drink_decay_per_hour * hours).clamp(0.0, NEED_MAX);
        if !sleeping {
            self.sleep = (self.sleep - config.sleep_decay_per_hour * hours).clamp(0.0, NEED_MAX);
        }
    }

    /// Satisfy a need
    pub fn satisfy(&mut self, need: NeedType, amount: f32) {
        let value = match need {
            NeedType::Food => &mut self.food,
            NeedType::Drink => &mut self.drink,
            NeedType::Sleep => &mut self.sleep,
        };
        *value = (*value + amount).clamp(0.0, NEED_MAX);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeedType {
    Food,
    Drink,
    Sleep,
}

/// Where a mood modifier came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoodSource {
    Status(StatusKind),
    Memory(MemoryKind),
}

/// Happiness modifiers, rebuilt every infrequent update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Mood {
    modifiers: Vec<(MoodSource, i32)>,
}

impl Mood {
    pub const MIN: i32 = -100;
    pub const MAX: i32 = 100;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.modifiers.clear();
    }

    pub fn add(&mut self, source: MoodSource, value: i32) {
        if value != 0 {
            self.modifiers.push((source, value));
        }
    }

    pub fn total(&self) -> i32 {
        self.modifiers
            .iter()
            .map(|(_, v)| *v)
            .sum::<i32>()
            .clamp(Self::MIN, Self::MAX)
    }

    pub fn modifiers(&self) -> &[(MoodSource, i32)] {
        &self.modifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decay_clamps_at_zero() {
        let mut needs = Needs::default();
        needs.decay(1000.0, &NeedsConfig::default(), false);
        assert_eq!(needs.food, 0.0);
        assert_eq!(needs.drink, 0.0);
        assert_eq!(needs.sleep, 0.0);
    }

    #[test]
    fn test_sleeping_skips_sleep_decay() {
        let mut needs = Needs::default();
        needs.decay(2.0, &NeedsConfig::default(), true);
        assert_eq!(needs.sleep, 80.0);
        assert!(needs.food < 80.0);
    }

    #[test]
    fn test_most_pressing_is_lowest() {
        let needs = Needs {
            food: 50.0,
            drink: 20.0,
            sleep: 70.0,
        };
        assert_eq!(needs.most_pressing().0, NeedType::Drink);
    }

    #[test]
    fn test_satisfy_caps_at_max() {
        let mut needs = Needs::default();
        needs.satisfy(NeedType::Food, 500.0);
        assert_eq!(needs.food, NEED_MAX);
    }

    #[test]
    fn test_mood_total_is_clamped() {
        let mut mood = Mood::new();
        mood.add(MoodSource::Memory(MemoryKind::WitnessedDeath), -80);
        mood.add(MoodSource::Status(StatusKind::Starving), -80);
        assert_eq!(mood.total(), Mood::MIN);
        mood.clear();
        assert_eq!(mood.total(), 0);
    }
}
