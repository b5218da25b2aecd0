//! Status effects and their progression
//!
//! Each entity carries a [`StatusSet`]: at most one effect per kind, each
//! with its own clock. Once per update cycle every effect applies its
//! ongoing effect, then the set decides removals and transitions.
//!
//! Changes to the active set are two-phase: effects only emit
//! [`StatusRequest`]s while the set is iterated, and the requests are
//! applied afterwards in [`StatusSet::process_pending`]. External
//! application requests go through the same queue.

use serde::{Deserialize, Serialize};

use crate::core::config::{NeedsConfig, SimulationConfig};
use crate::core::types::GameTime;
use crate::entity::memory::{MemoryKind, MemoryLedger};
use crate::entity::needs::{Mood, MoodSource, Needs};

/// Starving ends once food rises above this
pub const STARVING_RECOVERY_FOOD: f32 = 1.0;

/// Dying of thirst ends once drink rises above this
pub const DYING_OF_THIRST_RECOVERY_DRINK: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Hungry,
    VeryHungry,
    Starving,
    Thirsty,
    VeryThirsty,
    DyingOfThirst,
    Tired,
    Exhausted,
    Drunk,
    AlcoholDependent,
    Death,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Starvation,
    Dehydration,
    Unknown,
}

const HUNGER_CHAIN: [StatusKind; 3] = [StatusKind::Hungry, StatusKind::VeryHungry, StatusKind::Starving];
const THIRST_CHAIN: [StatusKind; 3] = [
    StatusKind::Thirsty,
    StatusKind::VeryThirsty,
    StatusKind::DyingOfThirst,
];
const FATIGUE_CHAIN: [StatusKind; 2] = [StatusKind::Tired, StatusKind::Exhausted];

impl StatusKind {
    pub const ALL: [StatusKind; 11] = [
        StatusKind::Hungry,
        StatusKind::VeryHungry,
        StatusKind::Starving,
        StatusKind::Thirsty,
        StatusKind::VeryThirsty,
        StatusKind::DyingOfThirst,
        StatusKind::Tired,
        StatusKind::Exhausted,
        StatusKind::Drunk,
        StatusKind::AlcoholDependent,
        StatusKind::Death,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StatusKind::Hungry => "hungry",
            StatusKind::VeryHungry => "very_hungry",
            StatusKind::Starving => "starving",
            StatusKind::Thirsty => "thirsty",
            StatusKind::VeryThirsty => "very_thirsty",
            StatusKind::DyingOfThirst => "dying_of_thirst",
            StatusKind::Tired => "tired",
            StatusKind::Exhausted => "exhausted",
            StatusKind::Drunk => "drunk",
            StatusKind::AlcoholDependent => "alcohol_dependent",
            StatusKind::Death => "death",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Kind entered automatically when this one's duration runs out
    pub fn successor(&self) -> Option<StatusKind> {
        match self {
            StatusKind::Hungry => Some(StatusKind::VeryHungry),
            StatusKind::VeryHungry => Some(StatusKind::Starving),
            StatusKind::Starving => Some(StatusKind::Death),
            StatusKind::Thirsty => Some(StatusKind::VeryThirsty),
            StatusKind::VeryThirsty => Some(StatusKind::DyingOfThirst),
            StatusKind::DyingOfThirst => Some(StatusKind::Death),
            StatusKind::Tired => Some(StatusKind::Exhausted),
            _ => None,
        }
    }

    /// Hours until the effect expires (into its successor, if any)
    pub fn default_hours(&self) -> Option<f64> {
        match self {
            StatusKind::Hungry => Some(24.0),
            StatusKind::VeryHungry => Some(24.0 * 2.0),
            StatusKind::Starving => Some(24.0 * 3.0),
            StatusKind::Thirsty => Some(12.0),
            StatusKind::VeryThirsty => Some(24.0),
            StatusKind::DyingOfThirst => Some(24.0 * 3.0),
            StatusKind::Tired => Some(16.0),
            StatusKind::Drunk => Some(6.0),
            StatusKind::AlcoholDependent => Some(24.0 * 5.0),
            StatusKind::Exhausted | StatusKind::Death => None,
        }
    }

    /// Cause recorded on the Death this kind leads into
    pub fn death_cause(&self) -> Option<DeathCause> {
        match self {
            StatusKind::Starving => Some(DeathCause::Starvation),
            StatusKind::DyingOfThirst => Some(DeathCause::Dehydration),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StatusKind::Death)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEffect {
    kind: StatusKind,
    /// Total hours this effect has been active; never decreases
    time_applied: f64,
    /// Hours since applied or since the last reset
    since_reset: f64,
    threshold_hours: Option<f64>,
    successor: Option<StatusKind>,
    cause: Option<DeathCause>,
}

impl StatusEffect {
    pub fn new(kind: StatusKind, config: &SimulationConfig) -> Self {
        let hours = config.status_duration(kind).or_else(|| kind.default_hours());
        Self {
            kind,
            time_applied: 0.0,
            since_reset: 0.0,
            threshold_hours: hours,
            successor: kind.successor(),
            cause: kind.death_cause(),
        }
    }

    fn death(cause: DeathCause) -> Self {
        Self {
            kind: StatusKind::Death,
            time_applied: 0.0,
            since_reset: 0.0,
            threshold_hours: None,
            successor: None,
            cause: Some(cause),
        }
    }

    pub fn kind(&self) -> StatusKind {
        self.kind
    }

    pub fn time_applied(&self) -> f64 {
        self.time_applied
    }

    pub fn since_reset(&self) -> f64 {
        self.since_reset
    }

    pub fn threshold_hours(&self) -> Option<f64> {
        self.threshold_hours
    }

    pub fn successor(&self) -> Option<StatusKind> {
        self.successor
    }

    pub fn cause(&self) -> Option<DeathCause> {
        self.cause
    }
}

/// What the ongoing effects and removal predicates may look at
pub struct StatusContext<'a> {
    pub now: GameTime,
    pub needs: Option<&'a Needs>,
    pub memories: Option<&'a MemoryLedger>,
    pub needs_config: &'a NeedsConfig,
}

impl StatusContext<'_> {
    fn need_at_least(&self, pick: impl Fn(&Needs) -> f32, threshold: f32) -> bool {
        self.needs.map(|n| pick(n) >= threshold).unwrap_or(false)
    }

    fn need_above(&self, pick: impl Fn(&Needs) -> f32, threshold: f32) -> bool {
        self.needs.map(|n| pick(n) > threshold).unwrap_or(false)
    }

    fn remembers(&self, kind: MemoryKind) -> bool {
        self.memories
            .map(|m| m.has_recent(kind, self.now))
            .unwrap_or(false)
    }
}

#[derive(Debug, Default)]
struct Ongoing {
    mood: i32,
    reset: bool,
    replace_with: Option<StatusKind>,
}

fn apply_ongoing_effect(kind: StatusKind, ctx: &StatusContext) -> Ongoing {
    match kind {
        StatusKind::Hungry | StatusKind::Thirsty | StatusKind::Tired => Ongoing {
            mood: -5,
            ..Ongoing::default()
        },
        StatusKind::VeryHungry => Ongoing {
            mood: -15,
            ..Ongoing::default()
        },
        StatusKind::VeryThirsty => Ongoing {
            mood: -15,
            replace_with: ctx
                .needs
                .filter(|n| n.drink <= 0.0)
                .map(|_| StatusKind::DyingOfThirst),
            ..Ongoing::default()
        },
        StatusKind::Starving => Ongoing {
            mood: -30,
            ..Ongoing::default()
        },
        StatusKind::DyingOfThirst => Ongoing {
            mood: -40,
            ..Ongoing::default()
        },
        StatusKind::Exhausted => Ongoing {
            mood: -20,
            ..Ongoing::default()
        },
        StatusKind::Drunk => Ongoing {
            mood: 10,
            ..Ongoing::default()
        },
        StatusKind::AlcoholDependent => {
            if ctx.remembers(MemoryKind::DrankAlcohol) {
                Ongoing {
                    reset: true,
                    ..Ongoing::default()
                }
            } else {
                // craving
                Ongoing {
                    mood: -10,
                    ..Ongoing::default()
                }
            }
        }
        StatusKind::Death => Ongoing::default(),
    }
}

fn should_remove(kind: StatusKind, ctx: &StatusContext) -> bool {
    let cfg = ctx.needs_config;
    match kind {
        StatusKind::Hungry | StatusKind::VeryHungry => ctx.need_at_least(|n| n.food, cfg.hungry_threshold),
        StatusKind::Starving => ctx.need_above(|n| n.food, STARVING_RECOVERY_FOOD),
        StatusKind::Thirsty | StatusKind::VeryThirsty => {
            ctx.need_at_least(|n| n.drink, cfg.thirsty_threshold)
        }
        StatusKind::DyingOfThirst => ctx.need_above(|n| n.drink, DYING_OF_THIRST_RECOVERY_DRINK),
        StatusKind::Tired | StatusKind::Exhausted => ctx.need_at_least(|n| n.sleep, cfg.tired_threshold),
        StatusKind::Drunk | StatusKind::AlcoholDependent | StatusKind::Death => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatusRequest {
    Apply {
        kind: StatusKind,
        cause: Option<DeathCause>,
    },
    Remove(StatusKind),
}

/// Outcome of processing requests, for the event bus
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatusChange {
    Applied(StatusKind),
    Removed(StatusKind),
    Died(DeathCause),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusSet {
    effects: Vec<StatusEffect>,
    pending: Vec<StatusRequest>,
}

impl StatusSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    pub fn kinds(&self) -> Vec<StatusKind> {
        self.effects.iter().map(|e| e.kind).collect()
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn is_dead(&self) -> bool {
        self.contains(StatusKind::Death)
    }

    pub fn death_cause(&self) -> Option<DeathCause> {
        self.get(StatusKind::Death).and_then(|e| e.cause)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Queue an application; takes effect at the next processing point
    pub fn request_apply(&mut self, kind: StatusKind) {
        let cause = if kind.is_terminal() {
            Some(DeathCause::Unknown)
        } else {
            None
        };
        self.pending.push(StatusRequest::Apply { kind, cause });
    }

    pub fn request_death(&mut self, cause: DeathCause) {
        self.pending.push(StatusRequest::Apply {
            kind: StatusKind::Death,
            cause: Some(cause),
        });
    }

    pub fn request_remove(&mut self, kind: StatusKind) {
        self.pending.push(StatusRequest::Remove(kind));
    }

    /// Queue need-driven statuses for needs that have fallen below their
    /// thresholds, unless a status of the same chain is already active
    pub fn apply_need_statuses(&mut self, needs: &Needs, config: &NeedsConfig) {
        if self.is_dead() {
            return;
        }
        let checks = [
            (needs.food < config.hungry_threshold, &HUNGER_CHAIN[..]),
            (needs.drink < config.thirsty_threshold, &THIRST_CHAIN[..]),
            (needs.sleep < config.tired_threshold, &FATIGUE_CHAIN[..]),
        ];
        for (below, chain) in checks {
            let queued = self
                .pending
                .iter()
                .any(|r| matches!(r, StatusRequest::Apply { kind, .. } if chain.contains(kind)));
            if below && !queued && !chain.iter().any(|k| self.contains(*k)) {
                self.request_apply(chain[0]);
            }
        }
    }

    /// One update cycle covering `elapsed_hours`
    pub fn update(
        &mut self,
        elapsed_hours: f64,
        ctx: &StatusContext,
        mood: &mut Mood,
        config: &SimulationConfig,
    ) -> Vec<StatusChange> {
        if self.is_dead() {
            return self.process_pending(config);
        }

        let mut requests = Vec::new();
        for effect in &mut self.effects {
            let elapsed = elapsed_hours.max(0.0);
            effect.time_applied += elapsed;
            effect.since_reset += elapsed;

            let ongoing = apply_ongoing_effect(effect.kind, ctx);
            mood.add(MoodSource::Status(effect.kind), ongoing.mood);
            if ongoing.reset {
                effect.since_reset = 0.0;
            }

            if let Some(next) = ongoing.replace_with {
                requests.push(StatusRequest::Remove(effect.kind));
                requests.push(StatusRequest::Apply {
                    kind: next,
                    cause: effect.cause,
                });
                continue;
            }

            if should_remove(effect.kind, ctx) {
                requests.push(StatusRequest::Remove(effect.kind));
                continue;
            }

            if let Some(threshold) = effect.threshold_hours {
                if effect.since_reset >= threshold {
                    requests.push(StatusRequest::Remove(effect.kind));
                    if let Some(next) = effect.successor {
                        requests.push(StatusRequest::Apply {
                            kind: next,
                            cause: effect.cause,
                        });
                    }
                }
            }
        }

        requests.append(&mut self.pending);
        self.pending = requests;
        self.process_pending(config)
    }

    /// Apply queued requests: removals first, then applications
    pub fn process_pending(&mut self, config: &SimulationConfig) -> Vec<StatusChange> {
        let requests = std::mem::take(&mut self.pending);
        let mut changes = Vec::new();
        if self.is_dead() {
            return changes;
        }

        for request in &requests {
            if let StatusRequest::Remove(kind) = request {
                if let Some(pos) = self.effects.iter().position(|e| e.kind == *kind) {
                    self.effects.remove(pos);
                    changes.push(StatusChange::Removed(*kind));
                }
            }
        }

        for request in requests {
            let StatusRequest::Apply { kind, cause } = request else {
                continue;
            };
            if kind.is_terminal() {
                for effect in self.effects.drain(..) {
                    changes.push(StatusChange::Removed(effect.kind));
                }
                let cause = cause.unwrap_or(DeathCause::Unknown);
                self.effects.push(StatusEffect::death(cause));
                changes.push(StatusChange::Applied(StatusKind::Death));
                changes.push(StatusChange::Died(cause));
                break;
            }
            if self.contains(kind) {
                continue;
            }
            self.effects.push(StatusEffect::new(kind, config));
            changes.push(StatusChange::Applied(kind));
        }
        changes
    }
}
