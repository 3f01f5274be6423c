//! Balance configuration.
//!
//! Every tunable number of the economy and the battle loop lives here.
//! [`BalanceConfig::default`] is the shipped tuning; a JSON document may
//! override any subset of fields. Archetypes and growth constants are not
//! configurable.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading a balance file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON parsing failed
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Price curve and cap of one global upgrade track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeTrack {
    /// Price at level 1
    pub base_cost: u64,
    /// Added per level above 1
    pub cost_step: u64,
    /// Highest reachable level
    pub max_level: u32,
}

impl UpgradeTrack {
    /// Price of the next purchase when the track sits at `level`.
    #[must_use]
    pub fn cost_at(&self, level: u32) -> u64 {
        self.base_cost + self.cost_step * u64::from(level.saturating_sub(1))
    }
}

/// Tuning of the battle loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleTuning {
    /// Longest simulated step per tick in seconds
    pub max_step_s: f64,
    /// Radius below which moving units push each other apart
    pub separation_radius: f32,
    /// Push strength; displacement is `offset * strength * dt`
    pub separation_strength: f32,
    /// Simulated milliseconds without any landed hit before the battle is
    /// declared a stalemate
    pub stalemate_timeout_ms: f64,
    /// Divisor of the level in the enemy tech formula
    pub enemy_tech_divisor: f64,
}

impl Default for BattleTuning {
    fn default() -> Self {
        Self {
            max_step_s: 0.1,
            separation_radius: 0.6,
            separation_strength: 3.0,
            stalemate_timeout_ms: 60_000.0,
            enemy_tech_divisor: 10.0,
        }
    }
}

/// Economy and battle tuning for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    /// Coins at the start of every run
    pub starting_coins: u64,
    /// First random recruit price
    pub recruit_base_cost: u64,
    /// Added to a recruit price after each purchase
    pub recruit_cost_step: u64,
    /// Premium recruit price as a multiple of the random price
    pub premium_multiplier: u64,
    /// Per-type recruit price before tier scaling
    pub specific_base_cost: u64,
    /// Per-type tech price at level 1
    pub tech_base_cost: u64,
    /// Per-type tech price increase per level
    pub tech_cost_step: u64,
    /// Unit cap at capacity level 1
    pub base_unit_cap: u32,
    /// Extra units per capacity level
    pub cap_per_level: u32,
    /// Capacity upgrade track
    pub capacity: UpgradeTrack,
    /// Luck upgrade track
    pub luck: UpgradeTrack,
    /// Top-tier mastery track
    pub mastery: UpgradeTrack,
    /// First artifact price
    pub artifact_base_cost: u64,
    /// Added to the artifact price after each purchase
    pub artifact_cost_step: u64,
    /// Fraction of a unit's value refunded on sale
    pub sell_ratio: f64,
    /// Synthesis price
    pub synthesis_cost: u64,
    /// Minimum level of both synthesis ingredients
    pub synthesis_min_level: u32,
    /// Supply drop cooldown in milliseconds
    pub supply_cooldown_ms: f64,
    /// Supply payout at level 0
    pub supply_base: u64,
    /// Supply payout increase per level
    pub supply_per_level: u64,
    /// Victory loot at level 0
    pub loot_base: u64,
    /// Victory loot increase per level
    pub loot_per_level: u64,
    /// Drags shorter than this many screen pixels are selections
    pub tap_threshold_px: f32,
    /// Battle loop tuning
    pub battle: BattleTuning,
}

impl Default for BalanceConfig {
    fn default() -> Self {
        Self {
            starting_coins: 2000,
            recruit_base_cost: 100,
            recruit_cost_step: 10,
            premium_multiplier: 2,
            specific_base_cost: 100,
            tech_base_cost: 100,
            tech_cost_step: 20,
            base_unit_cap: 10,
            cap_per_level: 2,
            capacity: UpgradeTrack {
                base_cost: 200,
                cost_step: 100,
                max_level: 20,
            },
            luck: UpgradeTrack {
                base_cost: 200,
                cost_step: 100,
                max_level: 10,
            },
            mastery: UpgradeTrack {
                base_cost: 200,
                cost_step: 20,
                max_level: 100,
            },
            artifact_base_cost: 200,
            artifact_cost_step: 50,
            sell_ratio: 0.2,
            synthesis_cost: 500,
            synthesis_min_level: 3,
            supply_cooldown_ms: 30_000.0,
            supply_base: 100,
            supply_per_level: 10,
            loot_base: 150,
            loot_per_level: 50,
            tap_threshold_px: 10.0,
            battle: BattleTuning::default(),
        }
    }
}

impl BalanceConfig {
    /// Parses a configuration from JSON; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] if the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads a configuration from a JSON file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Json`] if it is malformed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Unit cap at a capacity level.
    #[must_use]
    pub fn unit_cap(&self, capacity_level: u32) -> u32 {
        self.base_unit_cap + self.cap_per_level * capacity_level.saturating_sub(1)
    }

    /// Per-type tech price when the type sits at `level`.
    #[must_use]
    pub fn tech_cost(&self, level: u32) -> u64 {
        self.tech_base_cost + self.tech_cost_step * u64::from(level.saturating_sub(1))
    }
}
