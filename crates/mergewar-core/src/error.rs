//! Error types for game actions.
//!
//! Every variant is recoverable: an action that fails leaves the session
//! untouched (see [`GameError::MissingIngredients`] for the single documented
//! exception around synthesis).

use thiserror::Error;

use crate::archetype::UnitType;
use crate::entity::EntityId;
use crate::grid::GridCell;
use crate::level::{Difficulty, GenerationError};
use crate::persistence::PersistenceError;
use crate::session::GamePhase;

/// Errors returned by game actions.
#[derive(Debug, Error)]
pub enum GameError {
    /// The wallet cannot cover the price of the action.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Coins currently held
        have: u64,
        /// Coins required
        need: u64,
    },

    /// No free cell is left in the player half of the grid.
    #[error("no free cell in the player half")]
    NoFreeCell,

    /// The player already fields the maximum number of units.
    #[error("unit cap reached ({cap})")]
    UnitCapReached {
        /// Current unit cap
        cap: u32,
    },

    /// A global upgrade is already at its maximum level.
    #[error("upgrade already at max level {max}")]
    MaxLevelReached {
        /// The maximum level
        max: u32,
    },

    /// The unit type has no per-type tech track.
    #[error("{0} is upgraded through mythic mastery")]
    NotUpgradable(UnitType),

    /// The unit type cannot be bought directly.
    #[error("{0} can only be obtained through synthesis")]
    NotRecruitable(UnitType),

    /// Synthesis ingredients are not on the board.
    #[error("missing synthesis ingredients (level {min_level}+ required)")]
    MissingIngredients {
        /// Minimum ingredient level
        min_level: u32,
    },

    /// No recipe or achievement with the given id exists.
    #[error("unknown id: {0}")]
    UnknownId(String),

    /// The achievement threshold has not been reached yet.
    #[error("achievement {0} not earned yet")]
    AchievementNotEarned(&'static str),

    /// The achievement reward was already collected.
    #[error("achievement {0} already claimed")]
    AchievementAlreadyClaimed(&'static str),

    /// The supply drop is still cooling down.
    #[error("supply drop not ready")]
    SupplyNotReady,

    /// The action is not allowed in the current phase.
    #[error("action not allowed during {0:?}")]
    WrongPhase(GamePhase),

    /// The difficulty has not been unlocked yet.
    #[error("difficulty {0:?} is locked")]
    DifficultyLocked(Difficulty),

    /// Player units may not be placed in the enemy half.
    #[error("cell {0} is in enemy territory")]
    EnemyTerritory(GridCell),

    /// The cell lies outside the grid.
    #[error("cell {0} is off the grid")]
    OutOfBounds(GridCell),

    /// No living entity with this id exists.
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),

    /// The entity belongs to the enemy.
    #[error("entity {0} is not player-owned")]
    NotPlayerOwned(EntityId),

    /// The level generator failed.
    #[error("level generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// Reading or writing persisted progress failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
}

impl GameError {
    /// Returns `true` for the insufficient-resource family (funds, cells, cap).
    #[must_use]
    pub const fn is_insufficient_resource(&self) -> bool {
        matches!(
            self,
            Self::InsufficientFunds { .. } | Self::NoFreeCell | Self::UnitCapReached { .. }
        )
    }
}

/// Convenience alias for results of game actions.
pub type Result<T> = std::result::Result<T, GameError>;
