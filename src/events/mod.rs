//! Event bus
//!
//! The engine publishes [`SimEvent`]s while it ticks; they are queued and
//! handed to subscribers in one [`EventBus::dispatch`] at the end of the
//! tick. Work from other threads comes in the other direction as
//! [`ExternalRequest`]s over a channel drained at the start of each tick.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::core::types::{EntityId, GameTime, TilePos};
use crate::entity::behaviour::ControllerKind;
use crate::entity::goals::GoalAction;
use crate::entity::memory::MemoryKind;
use crate::entity::status::{DeathCause, StatusKind};

/// Event type codes. Codes are unique and stable across versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u16)]
pub enum EventType {
    StatusApplied = 100,
    StatusRemoved = 101,
    GoalCompleted = 200,
    GoalAbandoned = 201,
    EntityDied = 300,
    EntityRemoved = 301,
    MemoryRecorded = 400,
    MentalBreak = 500,
    BehaviourChanged = 501,
    JobRejected = 502,
}

impl EventType {
    pub const ALL: [EventType; 10] = [
        EventType::StatusApplied,
        EventType::StatusRemoved,
        EventType::GoalCompleted,
        EventType::GoalAbandoned,
        EventType::EntityDied,
        EventType::EntityRemoved,
        EventType::MemoryRecorded,
        EventType::MentalBreak,
        EventType::BehaviourChanged,
        EventType::JobRejected,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.code() == code)
    }
}

/// Why a goal was given up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbandonReason {
    NoPath,
    PathBudgetExhausted,
    ResourceLost,
    Interrupted,
}

/// Immutable event record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    StatusApplied {
        entity: EntityId,
        kind: StatusKind,
        at: GameTime,
    },
    StatusRemoved {
        entity: EntityId,
        kind: StatusKind,
        at: GameTime,
    },
    GoalCompleted {
        entity: EntityId,
        action: GoalAction,
    },
    GoalAbandoned {
        entity: EntityId,
        action: GoalAction,
        reason: AbandonReason,
    },
    EntityDied {
        entity: EntityId,
        cause: DeathCause,
        tile: TilePos,
        at: GameTime,
    },
    EntityRemoved {
        entity: EntityId,
    },
    MemoryRecorded {
        entity: EntityId,
        kind: MemoryKind,
    },
    MentalBreak {
        entity: EntityId,
        mood: i32,
    },
    BehaviourChanged {
        entity: EntityId,
        from: ControllerKind,
        to: ControllerKind,
    },
    JobRejected {
        entity: EntityId,
        action: GoalAction,
    },
}

impl SimEvent {
    pub fn event_type(&self) -> EventType {
        match self {
            SimEvent::StatusApplied { .. } => EventType::StatusApplied,
            SimEvent::StatusRemoved { .. } => EventType::StatusRemoved,
            SimEvent::GoalCompleted { .. } => EventType::GoalCompleted,
            SimEvent::GoalAbandoned { .. } => EventType::GoalAbandoned,
            SimEvent::EntityDied { .. } => EventType::EntityDied,
            SimEvent::EntityRemoved { .. } => EventType::EntityRemoved,
            SimEvent::MemoryRecorded { .. } => EventType::MemoryRecorded,
            SimEvent::MentalBreak { .. } => EventType::MentalBreak,
            SimEvent::BehaviourChanged { .. } => EventType::BehaviourChanged,
            SimEvent::JobRejected { .. } => EventType::JobRejected,
        }
    }

    /// Entity the event is about
    pub fn entity(&self) -> EntityId {
        match self {
            SimEvent::StatusApplied { entity, .. }
            | SimEvent::StatusRemoved { entity, .. }
            | SimEvent::GoalCompleted { entity, .. }
            | SimEvent::GoalAbandoned { entity, .. }
            | SimEvent::EntityDied { entity, .. }
            | SimEvent::EntityRemoved { entity }
            | SimEvent::MemoryRecorded { entity, .. }
            | SimEvent::MentalBreak { entity, .. }
            | SimEvent::BehaviourChanged { entity, .. }
            | SimEvent::JobRejected { entity, .. } => *entity,
        }
    }
}

pub type EventHandler = Box<dyn FnMut(&SimEvent) + Send>;

#[derive(Default)]
pub struct EventBus {
    queued: Vec<SimEvent>,
    subscribers: BTreeMap<EventType, Vec<EventHandler>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("queued", &self.queued.len())
            .field(
                "subscribers",
                &self.subscribers.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&mut self, event: SimEvent) {
        self.queued.push(event);
    }

    pub fn subscribe<F>(&mut self, event_type: EventType, handler: F)
    where
        F: FnMut(&SimEvent) + Send + 'static,
    {
        self.subscribers
            .entry(event_type)
            .or_default()
            .push(Box::new(handler));
    }

    pub fn pending(&self) -> &[SimEvent] {
        &self.queued
    }

    /// Deliver queued events in publish order and hand them back
    pub fn dispatch(&mut self) -> Vec<SimEvent> {
        let events = std::mem::take(&mut self.queued);
        for event in &events {
            if let Some(handlers) = self.subscribers.get_mut(&event.event_type()) {
                for handler in handlers.iter_mut() {
                    handler(event);
                }
            }
        }
        events
    }
}

/// Requests other threads may make of the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExternalRequest {
    ApplyStatus { entity: EntityId, kind: StatusKind },
    RemoveEntity { entity: EntityId },
}

/// Clonable handle for sending requests into the tick thread
#[derive(Debug, Clone)]
pub struct RequestSender {
    tx: mpsc::UnboundedSender<ExternalRequest>,
}

impl RequestSender {
    /// Returns false once the simulation has been dropped
    pub fn send(&self, request: ExternalRequest) -> bool {
        self.tx.send(request).is_ok()
    }
}

#[derive(Debug)]
pub struct RequestInbox {
    tx: mpsc::UnboundedSender<ExternalRequest>,
    rx: mpsc::UnboundedReceiver<ExternalRequest>,
}

impl Default for RequestInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestInbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> RequestSender {
        RequestSender { tx: self.tx.clone() }
    }

    /// Everything received so far, without blocking
    pub fn drain(&mut self) -> Vec<ExternalRequest> {
        let mut requests = Vec::new();
        while let Ok(request) = self.rx.try_recv() {
            requests.push(request);
        }
        requests
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_type_codes_unique() {
        let codes: HashSet<u16> = EventType::ALL.iter().map(|t| t.code()).collect();
        assert_eq!(codes.len(), EventType::ALL.len());
        for t in EventType::ALL {
            assert_eq!(EventType::from_code(t.code()), Some(t));
        }
    }

    #[test]
    fn test_dispatch_reaches_subscribers_of_type() {
        let mut bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        bus.subscribe(EventType::EntityRemoved, move |e| {
            sink.lock().unwrap().push(e.entity());
        });

        bus.publish(SimEvent::EntityRemoved { entity: EntityId(3) });
        bus.publish(SimEvent::GoalCompleted {
            entity: EntityId(4),
            action: GoalAction::Eat,
        });
        assert!(seen.lock().unwrap().is_empty());

        let delivered = bus.dispatch();
        assert_eq!(delivered.len(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![EntityId(3)]);
        assert!(bus.pending().is_empty());
    }

    #[test]
    fn test_requests_cross_threads() {
        let mut inbox = RequestInbox::new();
        let sender = inbox.sender();
        let handle = std::thread::spawn(move || {
            sender.send(ExternalRequest::RemoveEntity { entity: EntityId(9) })
        });
        assert!(handle.join().unwrap());
        assert_eq!(
            inbox.drain(),
            vec![ExternalRequest::RemoveEntity { entity: EntityId(9) }]
        );
        assert!(inbox.drain().is_empty());
    }
}
