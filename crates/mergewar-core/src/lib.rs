//! # Mergewar Core
//!
//! Preparation-phase grid management and the real-time battle simulation for
//! Mergewar, a merge-and-battle auto-battler.
//!
//! The crate is organized leaves first:
//!
//! - [`archetype`]: Immutable per-unit base profiles and tiers
//! - [`stats`]: Pure stat derivation (level, tech and artifact scaling)
//! - [`entity`] / [`arena`]: Battle participants and the store that owns them
//! - [`placement`]: Drag/drop resolution into moves, swaps and merges
//! - [`simulation`] / [`resolver`]: The per-tick battle loop
//! - [`economy`]: Coins, recruitment, upgrades, artifacts and synthesis
//! - [`level`]: Enemy roster generation
//! - [`persistence`]: The single persisted progress flag
//! - [`session`]: The phase machine tying everything together
//!
//! ## Usage
//!
//! ```
//! use mergewar_core::config::BalanceConfig;
//! use mergewar_core::level::{Difficulty, ProceduralGenerator};
//! use mergewar_core::persistence::MemoryStore;
//! use mergewar_core::session::{GamePhase, GameSession};
//!
//! let mut session = GameSession::new(
//!     BalanceConfig::default(),
//!     Box::new(ProceduralGenerator::new(7)),
//!     Box::new(MemoryStore::default()),
//!     7,
//!     0.0,
//! );
//! session.start_game(Difficulty::Normal).unwrap();
//! assert_eq!(session.phase(), GamePhase::Preparation);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod archetype;
pub mod arena;
pub mod config;
pub mod economy;
pub mod entity;
pub mod error;
pub mod event;
pub mod grid;
pub mod level;
pub mod persistence;
pub mod placement;
pub mod resolver;
pub mod session;
pub mod simulation;
pub mod stats;

#[cfg(test)]
mod tests;

pub use archetype::{Archetype, UnitTier, UnitType};
pub use arena::Arena;
pub use config::BalanceConfig;
pub use entity::{Entity, EntityId, Side, UnitState};
pub use error::{GameError, Result};
pub use grid::GridCell;
pub use session::{GamePhase, GameSession, TickHandle};
pub use simulation::{Battle, BattleOutcome};
pub use stats::{ArtifactLevels, DerivedStats, StatContext};
