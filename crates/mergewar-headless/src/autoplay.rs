//! A greedy player used for balance runs.
//!
//! Each preparation phase it collects rewards, synthesizes whatever it can,
//! merges every matching pair, recruits until the board or wallet runs out and
//! spends the rest on tech and artifacts. Battles run on a simulated clock.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use mergewar_core::economy::{RecruitKind, RECIPES};
use mergewar_core::level::Difficulty;
use mergewar_core::session::{GamePhase, GameSession};
use mergewar_core::{EntityId, GameError, GridCell, Side, UnitType};
use serde::Serialize;
use tracing::{debug, info};

/// Simulated frame interval in milliseconds.
pub const FRAME_MS: f64 = 16.0;

/// Frames after which a battle is abandoned as hung.
const MAX_FRAMES_PER_BATTLE: u32 = 500_000;

/// When to give up.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    /// Retries per level before the run ends
    pub max_retries: u32,
    /// Stop after winning this level
    pub max_levels: u32,
}

/// What one run achieved.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Seed of the generator and the economy
    pub seed: u64,
    /// Difficulty played
    pub difficulty: Difficulty,
    /// Last level reached
    pub level_reached: u32,
    /// Whether the final level was won
    pub cleared: bool,
    /// Battles fought
    pub battles: u32,
    /// Battles lost
    pub defeats: u32,
    /// Enemies killed
    pub kills: u64,
    /// Merges performed
    pub merges: u64,
    /// Coins left at the end
    pub coins: u64,
}

/// Drives one session to completion.
pub struct AutoPlayer {
    session: GameSession,
    policy: Policy,
    clock_ms: f64,
    battles: u32,
    defeats: u32,
}

fn attempt<T>(action: &str, result: Result<T, GameError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(action, error = %e, "skipped");
            None
        }
    }
}

impl AutoPlayer {
    /// Wraps a session that has not started a run yet.
    pub fn new(session: GameSession, policy: Policy) -> Self {
        Self {
            session,
            policy,
            clock_ms: 0.0,
            battles: 0,
            defeats: 0,
        }
    }

    /// Plays `difficulty` until it is cleared, the level limit is reached or
    /// retries run out.
    pub fn play(mut self, seed: u64, difficulty: Difficulty) -> Result<RunSummary> {
        self.session.start_game(difficulty)?;
        let mut retries = 0;

        loop {
            match self.session.phase() {
                GamePhase::Preparation => {
                    self.shop();
                    self.fight()?;
                }
                GamePhase::Victory => {
                    retries = 0;
                    if self.session.level() >= self.policy.max_levels {
                        break;
                    }
                    self.session.next_level()?;
                }
                GamePhase::Defeat => {
                    if retries >= self.policy.max_retries {
                        break;
                    }
                    retries += 1;
                    self.session.retry_level()?;
                }
                GamePhase::GameClear => break,
                phase => bail!("unexpected phase {phase:?}"),
            }
        }

        let stats = *self.session.economy().stats();
        let summary = RunSummary {
            seed,
            difficulty,
            level_reached: self.session.level(),
            cleared: self.session.phase() == GamePhase::GameClear,
            battles: self.battles,
            defeats: self.defeats,
            kills: stats.kills,
            merges: stats.merges,
            coins: self.session.economy().coins(),
        };
        info!(seed, level = summary.level_reached, cleared = summary.cleared, "run finished");
        Ok(summary)
    }

    // ===== Preparation =====

    fn shop(&mut self) {
        self.collect_rewards();

        for recipe in &RECIPES {
            attempt("synthesize", self.session.synthesize(recipe.id));
        }
        self.merge_all();

        while attempt("recruit", self.session.recruit(RecruitKind::Random)).is_some() {
            self.merge_all();
        }

        if let Some(unit_type) = self.favourite_type() {
            while attempt("tech", self.session.upgrade_tech(unit_type)).is_some() {}
        }
        attempt("artifact", self.session.buy_artifact());
    }

    fn collect_rewards(&mut self) {
        if self.session.economy().supply_ready(self.clock_ms) {
            attempt("supply", self.session.claim_supply(self.clock_ms));
        }
        let ready: Vec<&'static str> = self
            .session
            .economy()
            .claimable_achievements()
            .map(|a| a.id)
            .collect();
        for id in ready {
            attempt("achievement", self.session.claim_achievement(id));
        }
    }

    fn merge_all(&mut self) {
        while let Some((moving, target)) = self.find_pair() {
            if attempt("merge", self.session.move_unit(moving, target)).is_none() {
                break;
            }
        }
    }

    /// First unit that shares type and level with an earlier one, and that
    /// earlier unit's cell.
    fn find_pair(&self) -> Option<(EntityId, GridCell)> {
        let mut seen: BTreeMap<(UnitType, u32), GridCell> = BTreeMap::new();
        for unit in self.session.arena().by_side(Side::Player) {
            let key = (unit.unit_type(), unit.level());
            if let Some(&cell) = seen.get(&key) {
                return Some((unit.id(), cell));
            }
            seen.insert(key, unit.cell());
        }
        None
    }

    /// Most fielded type that has its own tech track.
    fn favourite_type(&self) -> Option<UnitType> {
        let mut counts: BTreeMap<UnitType, u32> = BTreeMap::new();
        for unit in self.session.arena().by_side(Side::Player) {
            if !unit.unit_type().tier().is_top() {
                *counts.entry(unit.unit_type()).or_default() += 1;
            }
        }
        counts
            .into_iter()
            .max_by_key(|&(unit_type, count)| (count, std::cmp::Reverse(unit_type)))
            .map(|(unit_type, _)| unit_type)
    }

    // ===== Battle =====

    fn fight(&mut self) -> Result<()> {
        let handle = self.session.start_battle(self.clock_ms)?;
        self.battles += 1;

        for _ in 0..MAX_FRAMES_PER_BATTLE {
            self.clock_ms += FRAME_MS;
            let Some(report) = self.session.on_frame(handle, self.clock_ms) else {
                break;
            };
            if let Some(outcome) = report.outcome {
                if !outcome.is_victory() {
                    self.defeats += 1;
                }
                return Ok(());
            }
        }
        bail!("battle on level {} did not finish", self.session.level())
    }
}
