//! Battle events emitted by a tick.
//!
//! Events never mutate state. They exist for logging, tests, and whatever
//! presentation layer sits on top of the session.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, Side};

/// Something observable that happened during one battle tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    /// A unit locked onto a new target.
    TargetAcquired {
        /// The unit that picked a target
        unit: EntityId,
        /// The chosen opponent
        target: EntityId,
    },
    /// A swing connected.
    AttackLanded {
        /// Attacker
        attacker: EntityId,
        /// Victim
        target: EntityId,
        /// Hit points removed
        damage: i64,
    },
    /// A unit was found at or below zero hit points by the death sweep.
    UnitDied {
        /// The fallen unit
        unit: EntityId,
        /// Its side
        side: Side,
    },
}

/// Ordered record of the events of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<BattleEvent>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn record(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    /// Drains and returns all recorded events in recording order.
    pub fn take_events(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of hits recorded so far.
    #[must_use]
    pub fn hits(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, BattleEvent::AttackLanded { .. }))
            .count()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
