//! The game session: phase machine over arena, economy and battle.
//!
//! ```text
//! DifficultySelect ──start_game──▶ Preparation ──start_battle──▶ Battle
//!                                   ▲      ▲                    │
//!                     next_level ───┘      └── retry_level ─┐   ▼
//!                        (Victory)                (Defeat)  Victory / Defeat
//!                                                              │
//!                                    final level won ──▶ GameClear
//! ```
//!
//! A battle is driven by the caller: [`GameSession::start_battle`] arms it and
//! hands out a [`TickHandle`], and every [`GameSession::on_frame`] call with
//! that handle advances it one tick. Any transition that disarms the battle
//! invalidates outstanding handles, so a late frame can never touch a reset
//! roster.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::arena::Arena;
use crate::archetype::UnitType;
use crate::config::BalanceConfig;
use crate::economy::{Economy, GlobalTech, RecruitKind};
use crate::entity::{EntityId, Side};
use crate::error::{GameError, Result};
use crate::grid::GridCell;
use crate::level::{enemy_tech_level, Difficulty, LevelConfig, LevelGenerator};
use crate::persistence::ProgressStore;
use crate::placement::{resolve_placement, DragGesture, GestureKind, PlacementOutcome};
use crate::simulation::{Battle, BattleOutcome, TickReport};
use crate::stats::{ArtifactKind, StatContext};

/// Top-level game phase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamePhase {
    /// Choosing a difficulty; no run in progress
    DifficultySelect,
    /// Arranging and buying units
    Preparation,
    /// A battle is armed
    Battle,
    /// The last battle was won
    Victory,
    /// The last battle was lost
    Defeat,
    /// The final level of the difficulty was won
    GameClear,
}

/// Proof that a battle was armed by a particular [`GameSession::start_battle`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct TickHandle {
    epoch: u64,
}

/// What a pointer drag turned into.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DropResult {
    /// A short drag; the unit is now selected
    Selected(EntityId),
    /// The unit was dropped on a player cell
    Placed(PlacementOutcome),
    /// Released outside the grid; nothing happened
    OffGrid,
}

/// A single player's game.
pub struct GameSession {
    config: BalanceConfig,
    generator: Box<dyn LevelGenerator>,
    store: Box<dyn ProgressStore>,
    arena: Arena,
    economy: Economy,
    phase: GamePhase,
    difficulty: Difficulty,
    max_unlocked: Difficulty,
    level: u32,
    enemy_tech: u32,
    battle: Option<Battle>,
    /// Bumped on every arm and disarm; handles from other epochs are stale.
    epoch: u64,
    selected: Option<EntityId>,
    last_outcome: Option<BattleOutcome>,
    just_unlocked: Option<Difficulty>,
}

impl std::fmt::Debug for GameSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("phase", &self.phase)
            .field("difficulty", &self.difficulty)
            .field("level", &self.level)
            .field("entities", &self.arena.entity_count())
            .field("coins", &self.economy.coins())
            .field("epoch", &self.epoch)
            .finish_non_exhaustive()
    }
}

impl GameSession {
    /// Creates a session in [`GamePhase::DifficultySelect`].
    ///
    /// The unlocked difficulty is read from `store`; a read failure is
    /// logged and treated as nothing unlocked beyond Normal.
    ///
    /// # Arguments
    ///
    /// * `config` - Balance tuning
    /// * `generator` - Source of enemy rosters
    /// * `store` - Where the unlocked difficulty is kept
    /// * `seed` - Seeds recruit draws and artifact rolls
    /// * `now_ms` - Clock reading that starts the supply cooldown
    #[must_use]
    pub fn new(
        config: BalanceConfig,
        generator: Box<dyn LevelGenerator>,
        store: Box<dyn ProgressStore>,
        seed: u64,
        now_ms: f64,
    ) -> Self {
        let max_unlocked = store.load_max_difficulty().unwrap_or_else(|e| {
            error!(error = %e, "failed to read progress, assuming Normal");
            Difficulty::Normal
        });
        Self {
            economy: Economy::new(config.clone(), seed, now_ms),
            config,
            generator,
            store,
            arena: Arena::new(),
            phase: GamePhase::DifficultySelect,
            difficulty: Difficulty::Normal,
            max_unlocked,
            level: 1,
            enemy_tech: 1,
            battle: None,
            epoch: 0,
            selected: None,
            last_outcome: None,
            just_unlocked: None,
        }
    }

    // ===== Accessors =====

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Difficulty of the current run.
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Highest unlocked difficulty.
    #[must_use]
    pub const fn max_unlocked(&self) -> Difficulty {
        self.max_unlocked
    }

    /// Current level number, starting at 1.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Tech level enemies were spawned with.
    #[must_use]
    pub const fn enemy_tech(&self) -> u32 {
        self.enemy_tech
    }

    /// All units.
    #[must_use]
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Mutable roster access for tools and tests.
    pub fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    /// Wallet and progression.
    #[must_use]
    pub const fn economy(&self) -> &Economy {
        &self.economy
    }

    /// Mutable wallet access for tools and tests.
    pub fn economy_mut(&mut self) -> &mut Economy {
        &mut self.economy
    }

    /// Balance tuning.
    #[must_use]
    pub const fn config(&self) -> &BalanceConfig {
        &self.config
    }

    /// Unit chosen by the last short drag.
    #[must_use]
    pub const fn selected(&self) -> Option<EntityId> {
        self.selected
    }

    /// Result of the most recent battle.
    #[must_use]
    pub const fn last_outcome(&self) -> Option<BattleOutcome> {
        self.last_outcome
    }

    /// Difficulty unlocked by the most recent game clear, if any.
    #[must_use]
    pub const fn just_unlocked(&self) -> Option<Difficulty> {
        self.just_unlocked
    }

    /// Returns `true` while a battle is armed.
    #[must_use]
    pub const fn is_battle_armed(&self) -> bool {
        self.battle.is_some()
    }

    /// Returns `true` if `difficulty` may be started.
    #[must_use]
    pub const fn is_unlocked(&self, difficulty: Difficulty) -> bool {
        difficulty.rank() <= self.max_unlocked.rank()
    }

    fn require_phase(&self, expected: GamePhase) -> Result<()> {
        if self.phase != expected {
            warn!(phase = ?self.phase, ?expected, "action rejected in current phase");
            return Err(GameError::WrongPhase(self.phase));
        }
        Ok(())
    }

    fn enter(&mut self, phase: GamePhase) {
        if self.phase != phase {
            info!(from = ?self.phase, to = ?phase, level = self.level, "phase change");
        }
        self.phase = phase;
    }

    /// Drops the armed battle, if any, and invalidates every handle.
    fn disarm(&mut self) {
        if self.battle.take().is_some() {
            debug!(epoch = self.epoch, "battle disarmed");
        }
        self.epoch += 1;
    }

    /// Disarms ahead of a reload. An armed battle that is torn down counts as
    /// lost, so the session never sits in Battle with nothing armed.
    fn abandon_battle(&mut self) {
        let was_armed = self.battle.is_some();
        self.disarm();
        if was_armed {
            self.enter(GamePhase::Defeat);
        }
    }

    // ===== Run lifecycle =====

    /// Starts a fresh run at level 1.
    ///
    /// # Errors
    ///
    /// [`GameError::DifficultyLocked`] if `difficulty` is not unlocked and
    /// [`GameError::Generation`] if the first level cannot be produced. The
    /// session is unchanged on error, apart from an armed battle being
    /// abandoned as a defeat.
    pub fn start_game(&mut self, difficulty: Difficulty) -> Result<()> {
        if !self.is_unlocked(difficulty) {
            warn!(%difficulty, "difficulty locked");
            return Err(GameError::DifficultyLocked(difficulty));
        }
        self.abandon_battle();
        let config = self.generate(1, difficulty)?;

        self.difficulty = difficulty;
        self.reset_run();
        self.install_level(1, &config);
        info!(%difficulty, "run started");
        Ok(())
    }

    /// Reloads `level` of the current run: player units return to their
    /// cells at full health and a new enemy roster is generated.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] before a run has started and
    /// [`GameError::Generation`] if the roster cannot be produced; the
    /// roster is untouched in that case and an armed battle ends as a defeat.
    pub fn load_level(&mut self, level: u32) -> Result<()> {
        if self.phase == GamePhase::DifficultySelect {
            return Err(GameError::WrongPhase(self.phase));
        }
        self.abandon_battle();
        let config = self.generate(level, self.difficulty)?;
        self.install_level(level, &config);
        Ok(())
    }

    /// Advances after a victory; clearing the final level unlocks the next
    /// difficulty and ends in [`GamePhase::GameClear`].
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] unless the last battle was won,
    /// [`GameError::Persistence`] if the unlock cannot be saved and
    /// [`GameError::Generation`] if the next level cannot be produced.
    pub fn next_level(&mut self) -> Result<()> {
        self.require_phase(GamePhase::Victory)?;

        if self.level >= self.difficulty.settings().max_level {
            let unlock = self
                .difficulty
                .next()
                .filter(|next| next.rank() > self.max_unlocked.rank());
            if let Some(next) = unlock {
                if let Err(e) = self.store.save_max_difficulty(next) {
                    error!(error = %e, "failed to save unlocked difficulty");
                    return Err(e.into());
                }
                self.max_unlocked = next;
                info!(unlocked = %next, "difficulty unlocked");
            }
            self.just_unlocked = unlock;
            self.enter(GamePhase::GameClear);
            return Ok(());
        }

        self.load_level(self.level + 1)
    }

    /// Replays the current level after a defeat.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] unless the last battle was lost and
    /// [`GameError::Generation`] if the roster cannot be produced.
    pub fn retry_level(&mut self) -> Result<()> {
        self.require_phase(GamePhase::Defeat)?;
        self.load_level(self.level)
    }

    /// Restarts the current difficulty from level 1 with a fresh wallet.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] before a run has started and
    /// [`GameError::Generation`] if level 1 cannot be produced.
    pub fn reset_mode(&mut self) -> Result<()> {
        if self.phase == GamePhase::DifficultySelect {
            return Err(GameError::WrongPhase(self.phase));
        }
        self.abandon_battle();
        let config = self.generate(1, self.difficulty)?;
        self.reset_run();
        self.install_level(1, &config);
        info!(difficulty = %self.difficulty, "mode reset");
        Ok(())
    }

    /// Forgets all progress, including unlocked difficulties and claimed
    /// achievements, and returns to difficulty selection.
    ///
    /// # Errors
    ///
    /// [`GameError::Persistence`] if the store cannot be cleared; nothing is
    /// reset in that case.
    pub fn full_reset(&mut self) -> Result<()> {
        self.disarm();
        if let Err(e) = self.store.clear() {
            error!(error = %e, "failed to clear progress");
            return Err(e.into());
        }
        self.max_unlocked = Difficulty::Normal;
        self.economy.forget_achievements();
        self.reset_run();
        self.just_unlocked = None;
        self.enter(GamePhase::DifficultySelect);
        info!("full reset");
        Ok(())
    }

    fn reset_run(&mut self) {
        self.economy.new_run();
        self.arena = Arena::new();
        self.level = 1;
        self.selected = None;
        self.last_outcome = None;
    }

    fn generate(&mut self, level: u32, difficulty: Difficulty) -> Result<LevelConfig> {
        self.generator.generate(level, difficulty).map_err(|e| {
            error!(level, %difficulty, error = %e, "level generation failed");
            GameError::Generation(e)
        })
    }

    fn install_level(&mut self, level: u32, config: &LevelConfig) {
        if config.level != level {
            warn!(requested = level, generated = config.level, "generator labelled roster with another level");
        }
        let player_ctx = self.economy.player_context();
        for entity in self.arena.entities_sorted_mut() {
            if entity.side() == Side::Player {
                entity.reset_for_battle(&player_ctx);
            }
        }
        self.arena.despawn_side(Side::Enemy);

        self.enemy_tech = enemy_tech_level(level, self.difficulty, self.config.battle.enemy_tech_divisor);
        let enemy_ctx = StatContext::flat(self.enemy_tech);
        for spawn in &config.enemies {
            if !spawn.cell.in_bounds() || !spawn.cell.is_enemy_half() {
                warn!(cell = %spawn.cell, "ignoring enemy spawn outside enemy half");
                continue;
            }
            self.arena
                .spawn_unit(spawn.unit_type, spawn.level.max(1), Side::Enemy, spawn.cell, &enemy_ctx);
        }
        self.arena.rebuild_spatial();

        self.level = level;
        self.selected = None;
        self.just_unlocked = None;
        self.enter(GamePhase::Preparation);
        info!(
            level,
            enemies = config.enemies.len(),
            enemy_tech = self.enemy_tech,
            "level loaded"
        );
    }

    // ===== Battle =====

    /// Arms a battle over the current roster.
    ///
    /// `now_ms` is the timestamp the first frame's step is measured from.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside preparation.
    pub fn start_battle(&mut self, now_ms: f64) -> Result<TickHandle> {
        self.require_phase(GamePhase::Preparation)?;
        self.disarm();

        let battle = Battle::start(
            &mut self.arena,
            self.economy.player_context(),
            StatContext::flat(self.enemy_tech),
            self.config.battle,
            now_ms,
        );
        self.battle = Some(battle);
        self.selected = None;
        self.enter(GamePhase::Battle);
        Ok(TickHandle { epoch: self.epoch })
    }

    /// Advances the armed battle to `timestamp_ms`.
    ///
    /// Returns `None` and does nothing if `handle` is stale or no battle is
    /// armed. When the battle ends the session moves to Victory (paying
    /// loot) or Defeat and disarms itself.
    pub fn on_frame(&mut self, handle: TickHandle, timestamp_ms: f64) -> Option<TickReport> {
        if handle.epoch != self.epoch {
            debug!(handle = handle.epoch, current = self.epoch, "stale tick ignored");
            return None;
        }
        let battle = self.battle.as_mut()?;
        let report = battle.tick(&mut self.arena, timestamp_ms);

        if report.kills > 0 {
            self.economy.record_kills(report.kills);
        }
        if let Some(outcome) = report.outcome {
            self.finish_battle(outcome);
        }
        Some(report)
    }

    fn finish_battle(&mut self, outcome: BattleOutcome) {
        self.disarm();
        self.last_outcome = Some(outcome);
        match outcome {
            BattleOutcome::Victory => {
                self.economy.award_victory(self.level);
                self.enter(GamePhase::Victory);
            }
            BattleOutcome::Defeat(reason) => {
                info!(?reason, "battle lost");
                self.enter(GamePhase::Defeat);
            }
        }
    }

    /// Abandons the armed battle; it counts as a defeat.
    ///
    /// Returns `false` if no battle was armed.
    pub fn cancel_battle(&mut self) -> bool {
        if self.battle.is_none() {
            return false;
        }
        self.abandon_battle();
        true
    }

    // ===== Preparation =====

    /// Applies a pointer drag. `target` is the cell under the pointer at
    /// release, if it was over the grid.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside preparation, otherwise whatever
    /// [`resolve_placement`] rejects.
    pub fn place(&mut self, gesture: DragGesture, target: Option<GridCell>) -> Result<DropResult> {
        self.require_phase(GamePhase::Preparation)?;
        if gesture.classify(self.config.tap_threshold_px) == GestureKind::Select {
            if self.arena.get(gesture.unit).is_none() {
                return Err(GameError::EntityNotFound(gesture.unit));
            }
            self.selected = Some(gesture.unit);
            return Ok(DropResult::Selected(gesture.unit));
        }
        let Some(cell) = target else {
            return Ok(DropResult::OffGrid);
        };
        self.move_unit(gesture.unit, cell).map(DropResult::Placed)
    }

    /// Drops a player unit on `cell`: move, swap or merge.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside preparation, otherwise whatever
    /// [`resolve_placement`] rejects.
    pub fn move_unit(&mut self, id: EntityId, cell: GridCell) -> Result<PlacementOutcome> {
        self.require_phase(GamePhase::Preparation)?;
        let outcome = resolve_placement(&mut self.arena, id, cell, &self.economy.player_context())?;
        if outcome.is_merge() {
            self.economy.record_merge();
            self.selected = None;
        }
        Ok(outcome)
    }

    /// Buys a unit. See [`Economy::recruit`].
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside preparation, plus the economy's
    /// errors.
    pub fn recruit(&mut self, kind: RecruitKind) -> Result<EntityId> {
        self.require_phase(GamePhase::Preparation)?;
        self.economy.recruit(&mut self.arena, kind)
    }

    /// Raises one type's tech. See [`Economy::upgrade_tech`].
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside preparation, plus the economy's
    /// errors.
    pub fn upgrade_tech(&mut self, unit_type: UnitType) -> Result<u32> {
        self.require_phase(GamePhase::Preparation)?;
        self.economy.upgrade_tech(&mut self.arena, unit_type)
    }

    /// Raises a global track. See [`Economy::upgrade_global`].
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside preparation, plus the economy's
    /// errors.
    pub fn upgrade_global(&mut self, track: GlobalTech) -> Result<u32> {
        self.require_phase(GamePhase::Preparation)?;
        self.economy.upgrade_global(&mut self.arena, track)
    }

    /// Buys an artifact. See [`Economy::buy_artifact`].
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside preparation, plus the economy's
    /// errors.
    pub fn buy_artifact(&mut self) -> Result<ArtifactKind> {
        self.require_phase(GamePhase::Preparation)?;
        self.economy.buy_artifact(&mut self.arena)
    }

    /// Sells a player unit. See [`Economy::sell`].
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside preparation, plus the economy's
    /// errors.
    pub fn sell(&mut self, id: EntityId) -> Result<u64> {
        self.require_phase(GamePhase::Preparation)?;
        let refund = self.economy.sell(&mut self.arena, id)?;
        if self.selected == Some(id) {
            self.selected = None;
        }
        Ok(refund)
    }

    /// Runs a synthesis recipe. See [`Economy::synthesize`].
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] outside preparation, plus the economy's
    /// errors.
    pub fn synthesize(&mut self, recipe_id: &str) -> Result<EntityId> {
        self.require_phase(GamePhase::Preparation)?;
        self.economy.synthesize(&mut self.arena, recipe_id)
    }

    /// Collects an achievement reward. Allowed in any phase.
    ///
    /// # Errors
    ///
    /// See [`Economy::claim_achievement`].
    pub fn claim_achievement(&mut self, id: &str) -> Result<u64> {
        self.economy.claim_achievement(id)
    }

    /// Collects the supply drop for the current level.
    ///
    /// # Errors
    ///
    /// [`GameError::WrongPhase`] during difficulty selection and
    /// [`GameError::SupplyNotReady`] while cooling down.
    pub fn claim_supply(&mut self, now_ms: f64) -> Result<u64> {
        if self.phase == GamePhase::DifficultySelect {
            return Err(GameError::WrongPhase(self.phase));
        }
        self.economy.claim_supply(now_ms, self.level)
    }
}

// =============================================================================
// Tests
// =============================================================================
