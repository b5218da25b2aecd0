//! Simulation configuration with documented constants
//!
//! All tunable numbers live here. The config is owned by the world and
//! handed down to the systems that need it; there is no global instance.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::entity::status::StatusKind;
use crate::pathfinding::SearchBudget;

/// Configuration for the simulation systems
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub clock: ClockConfig,
    pub needs: NeedsConfig,
    pub movement: MovementConfig,
    pub pathfinding: PathfindingConfig,
    pub mood: MoodConfig,
    pub status: StatusConfig,
    /// Seed for the world RNG (wandering, tie-free choices)
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Game hours that pass per real second of `delta_seconds`
    ///
    /// At the default (1/60) one in-game hour passes per real minute.
    pub game_hours_per_second: f64,

    /// Cadence of the infrequent update, in game hours
    ///
    /// Goal selection, status progression and memory purging run at this
    /// cadence rather than every tick.
    pub infrequent_interval_hours: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            game_hours_per_second: 1.0 / 60.0,
            infrequent_interval_hours: 1.0,
        }
    }
}

/// Need decay and thresholds. Needs are fulfilment values in 0..=100.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedsConfig {
    /// Food lost per game hour
    ///
    /// At 1.5 a fed settler becomes Hungry (30) after roughly two days.
    pub food_decay_per_hour: f32,

    /// Drink lost per game hour (faster than food)
    pub drink_decay_per_hour: f32,

    /// Sleep lost per game hour while awake
    pub sleep_decay_per_hour: f32,

    /// Below this food value the Hungry status is applied
    pub hungry_threshold: f32,

    /// Below this drink value the Thirsty status is applied
    pub thirsty_threshold: f32,

    /// Below this sleep value the Tired status is applied
    pub tired_threshold: f32,

    /// Below this value a settler starts looking for food or drink on its own
    ///
    /// Sits above the status thresholds so settlers usually eat before they
    /// become Hungry.
    pub seek_threshold: f32,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            food_decay_per_hour: 1.5,
            drink_decay_per_hour: 2.5,
            sleep_decay_per_hour: 4.0,
            hungry_threshold: 30.0,
            thirsty_threshold: 30.0,
            tired_threshold: 20.0,
            seek_threshold: 60.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Walking speed in tiles per real second
    pub move_speed: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self { move_speed: 2.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfindingConfig {
    /// Maximum node expansions per search before giving up for this tick
    ///
    /// Caps the worst case cost of a single search on a large map.
    pub max_expansions: usize,

    /// Attempts allowed per movement step when the expansion cap is hit
    pub max_path_attempts: u32,

    /// Allow 8-way movement (diagonals never cut wall corners)
    pub allow_diagonal: bool,
}

impl Default for PathfindingConfig {
    fn default() -> Self {
        Self {
            max_expansions: 20_000,
            max_path_attempts: 3,
            allow_diagonal: true,
        }
    }
}

impl PathfindingConfig {
    /// Per-search limits handed to the pathfinder
    pub fn budget(&self) -> SearchBudget {
        SearchBudget {
            max_expansions: self.max_expansions,
            allow_diagonal: self.allow_diagonal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodConfig {
    /// Settlers whose mood drops below this break down
    pub mental_break_threshold: i32,

    /// Broken settlers recover once mood rises above this
    pub mental_recovery_threshold: i32,
}

impl Default for MoodConfig {
    fn default() -> Self {
        Self {
            mental_break_threshold: -60,
            mental_recovery_threshold: -20,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Per-kind duration overrides in hours, keyed by snake_case kind name
    pub duration_overrides: BTreeMap<String, f64>,
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and validate a config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_toml(&content)
    }

    /// Parse and validate a config from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.clock.game_hours_per_second <= 0.0 {
            return Err(SimError::InvalidConfig(
                "clock.game_hours_per_second must be positive".into(),
            ));
        }
        if self.clock.infrequent_interval_hours <= 0.0 {
            return Err(SimError::InvalidConfig(
                "clock.infrequent_interval_hours must be positive".into(),
            ));
        }
        if self.needs.seek_threshold < self.needs.hungry_threshold
            || self.needs.seek_threshold < self.needs.thirsty_threshold
        {
            return Err(SimError::InvalidConfig(format!(
                "needs.seek_threshold ({}) should be >= the hungry/thirsty thresholds",
                self.needs.seek_threshold
            )));
        }
        if self.movement.move_speed <= 0.0 {
            return Err(SimError::InvalidConfig("movement.move_speed must be positive".into()));
        }
        if self.pathfinding.max_expansions == 0 {
            return Err(SimError::InvalidConfig("pathfinding.max_expansions must be > 0".into()));
        }
        if self.mood.mental_recovery_threshold <= self.mood.mental_break_threshold {
            return Err(SimError::InvalidConfig(format!(
                "mood.mental_recovery_threshold ({}) should be > mental_break_threshold ({})",
                self.mood.mental_recovery_threshold, self.mood.mental_break_threshold
            )));
        }
        for (name, hours) in &self.status.duration_overrides {
            if StatusKind::from_name(name).is_none() {
                return Err(SimError::InvalidConfig(format!("unknown status kind {name:?}")));
            }
            if *hours <= 0.0 {
                return Err(SimError::InvalidConfig(format!(
                    "duration for {name} must be positive"
                )));
            }
        }
        Ok(())
    }

    /// Configured duration for a status kind, if overridden
    pub fn status_duration(&self, kind: StatusKind) -> Option<f64> {
        self.status.duration_overrides.get(kind.name()).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = SimulationConfig::parse_toml(
            r#"
            seed = 7

            [pathfinding]
            max_expansions = 500

            [status.duration_overrides]
            starving = 48.0
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.pathfinding.max_expansions, 500);
        assert_eq!(config.pathfinding.max_path_attempts, 3);
        assert_eq!(config.status_duration(StatusKind::Starving), Some(48.0));
        assert_eq!(config.status_duration(StatusKind::Hungry), None);
    }

    #[test]
    fn test_unknown_status_override_rejected() {
        let result = SimulationConfig::parse_toml(
            r#"
            [status.duration_overrides]
            grumpy = 3.0
            "#,
        );
        assert!(matches!(result, Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn test_inverted_mood_thresholds_rejected() {
        let mut config = SimulationConfig::default();
        config.mood.mental_recovery_threshold = -80;
        assert!(config.validate().is_err());
    }
}
