//! Test helper functions for setting up sessions, arenas and battles.

use crate::archetype::UnitType;
use crate::arena::Arena;
use crate::config::BalanceConfig;
use crate::entity::{EntityId, Side};
use crate::grid::GridCell;
use crate::level::{Difficulty, EnemySpawn, GenerationError, LevelConfig, LevelGenerator};
use crate::persistence::MemoryStore;
use crate::session::{GameSession, TickHandle};
use crate::simulation::{BattleOutcome, TickReport};
use crate::stats::StatContext;

/// Frame interval used by every driven battle, in milliseconds.
pub const FRAME_MS: f64 = 16.0;

/// Upper bound on frames before a driven battle is considered hung.
pub const MAX_FRAMES: usize = 100_000;

// =============================================================================
// Generators
// =============================================================================

/// Serves the same roster for every level, failing once `fail_from` is
/// reached.
#[derive(Debug, Clone)]
pub struct ScriptedGenerator {
    roster: Vec<EnemySpawn>,
    fail_from: Option<u32>,
}

impl ScriptedGenerator {
    /// Always succeeds with `roster`.
    pub fn new(roster: Vec<EnemySpawn>) -> Self {
        Self {
            roster,
            fail_from: None,
        }
    }

    /// Fails for every level `>= level`.
    pub fn failing_from(mut self, level: u32) -> Self {
        self.fail_from = Some(level);
        self
    }
}

impl LevelGenerator for ScriptedGenerator {
    fn generate(&mut self, level: u32, _difficulty: Difficulty) -> Result<LevelConfig, GenerationError> {
        if self.fail_from.is_some_and(|from| level >= from) {
            return Err(GenerationError::Unavailable(format!("level {level} offline")));
        }
        Ok(LevelConfig {
            level,
            enemies: self.roster.clone(),
        })
    }
}

/// A level-1 enemy of `unit_type` on `(x, y)`.
pub fn enemy(unit_type: UnitType, x: i32, y: i32) -> EnemySpawn {
    EnemySpawn {
        unit_type,
        level: 1,
        cell: GridCell::new(x, y),
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// A session over `generator` with default balance, already in preparation.
pub fn started_session(generator: ScriptedGenerator) -> GameSession {
    started_session_with(BalanceConfig::default(), generator)
}

/// Like [`started_session`] with custom balance.
pub fn started_session_with(config: BalanceConfig, generator: ScriptedGenerator) -> GameSession {
    let mut session = GameSession::new(
        config,
        Box::new(generator),
        Box::new(MemoryStore::default()),
        11,
        0.0,
    );
    session
        .start_game(Difficulty::Normal)
        .expect("scripted level 1 loads");
    session
}

/// Drives frames until the battle ends.
///
/// # Returns
///
/// The outcome and every report, in order.
pub fn drive_battle(session: &mut GameSession, handle: TickHandle) -> (BattleOutcome, Vec<TickReport>) {
    let mut reports = Vec::new();
    let mut t = 0.0;
    for _ in 0..MAX_FRAMES {
        t += FRAME_MS;
        let Some(report) = session.on_frame(handle, t) else {
            break;
        };
        let outcome = report.outcome;
        reports.push(report);
        if let Some(outcome) = outcome {
            return (outcome, reports);
        }
    }
    panic!("battle did not finish within {MAX_FRAMES} frames");
}

// =============================================================================
// Arenas
// =============================================================================

/// Spawns a default-context player unit on `(x, y)`.
pub fn spawn_player(arena: &mut Arena, unit_type: UnitType, level: u32, x: i32, y: i32) -> EntityId {
    arena.spawn_unit(unit_type, level, Side::Player, GridCell::new(x, y), &StatContext::default())
}

/// Spawns a default-context enemy unit on `(x, y)`.
pub fn spawn_enemy(arena: &mut Arena, unit_type: UnitType, level: u32, x: i32, y: i32) -> EntityId {
    arena.spawn_unit(unit_type, level, Side::Enemy, GridCell::new(x, y), &StatContext::default())
}

/// Distance between two entities, `f32::INFINITY` if either is missing.
pub fn distance_between(arena: &Arena, a: EntityId, b: EntityId) -> f32 {
    match (arena.get(a), arena.get(b)) {
        (Some(a), Some(b)) => a.position().distance(b.position()),
        _ => f32::INFINITY,
    }
}
