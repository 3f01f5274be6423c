//! Component structs held by every entity.
//!
//! Grid placement lives on the entity itself; these hold the continuous
//! battle state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::EntityId;

/// Per-entity behaviour state.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitState {
    /// No target, or outside battle
    #[default]
    Idle,
    /// Closing distance to the target
    Moving,
    /// Target in range
    Attacking,
    /// Terminal for the rest of the battle
    Dead,
}

/// Continuous position and facing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Position in grid units; authoritative during battle
    pub position: Vec2,
    /// Whether the sprite faces right
    pub facing_right: bool,
}

impl Transform {
    /// Creates a transform at `position`.
    #[must_use]
    pub const fn new(position: Vec2, facing_right: bool) -> Self {
        Self {
            position,
            facing_right,
        }
    }
}

/// Hit points, attack timing and targeting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    /// Current hit points; may dip below zero
    pub hp: i64,
    /// Maximum hit points from the last stat refresh
    pub max_hp: i64,
    /// Timestamp of the last landed attack in milliseconds
    pub last_attack_ms: Option<f64>,
    /// Current target
    pub target: Option<EntityId>,
    /// Behaviour state
    pub state: UnitState,
}

impl CombatState {
    /// Full-health combat state.
    #[must_use]
    pub const fn full(max_hp: i64) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            last_attack_ms: None,
            target: None,
            state: UnitState::Idle,
        }
    }

    /// Returns `true` while the attack cooldown has elapsed at `now_ms`.
    #[must_use]
    pub fn ready_to_attack(&self, now_ms: f64, interval_ms: f64) -> bool {
        self.last_attack_ms
            .map_or(true, |last| now_ms - last > interval_ms)
    }
}
