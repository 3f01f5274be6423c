//! The battle loop.
//!
//! A [`Battle`] advances the arena one frame at a time. Each
//! [`Battle::tick`] runs four steps:
//!
//! 1. **SWEEP**: Mark entities at or below zero hp as dead, counting kills
//! 2. **LIVENESS**: Stop with an outcome if a side has no living units
//! 3. **UPDATE**: Visit every living unit in id order on the working copy:
//!    retarget, face, then attack or move with separation
//! 4. **APPLY**: Swap the working copy in as the new arena
//!
//! Ticks are driven by caller-supplied timestamps in milliseconds. The step
//! between two ticks is clamped so a long pause never skips simulation.
//!
//! # Example
//!
//! ```
//! use mergewar_core::arena::Arena;
//! use mergewar_core::archetype::UnitType;
//! use mergewar_core::config::BattleTuning;
//! use mergewar_core::entity::Side;
//! use mergewar_core::grid::GridCell;
//! use mergewar_core::simulation::{Battle, BattleOutcome};
//! use mergewar_core::stats::StatContext;
//!
//! let mut arena = Arena::new();
//! let ctx = StatContext::default();
//! arena.spawn_unit(UnitType::Infantry, 1, Side::Player, GridCell::new(3, 4), &ctx);
//!
//! let mut battle = Battle::start(&mut arena, ctx, StatContext::flat(1), BattleTuning::default(), 0.0);
//! let report = battle.tick(&mut arena, 16.0);
//! assert_eq!(report.outcome, Some(BattleOutcome::Victory));
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::arena::Arena;
use crate::config::BattleTuning;
use crate::entity::{EntityId, Side, UnitState};
use crate::event::{BattleEvent, EventLog};
use crate::resolver::{targeting, CombatResolver, PhysicsResolver};
use crate::stats::StatContext;

// =============================================================================
// Outcomes
// =============================================================================

/// Why a battle was lost.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DefeatReason {
    /// Every player unit fell while enemies remained
    PlayerWiped,
    /// Both sides were wiped out in the same sweep
    MutualDestruction,
    /// No hit landed for the stalemate timeout
    Stalemate,
}

/// Terminal result of a battle.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleOutcome {
    /// All enemies eliminated with at least one player unit standing
    Victory,
    /// Anything else
    Defeat(DefeatReason),
}

impl BattleOutcome {
    /// Returns `true` for [`BattleOutcome::Victory`].
    #[must_use]
    pub const fn is_victory(self) -> bool {
        matches!(self, Self::Victory)
    }
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Set once the battle has ended
    pub outcome: Option<BattleOutcome>,
    /// Enemies that died in this tick's sweep
    pub kills: u32,
    /// Events in the order they happened
    pub events: Vec<BattleEvent>,
    /// Simulated seconds advanced
    pub dt_s: f64,
}

// =============================================================================
// Battle
// =============================================================================

/// A running battle.
///
/// The battle does not own the arena; the session hands it in on every tick.
/// Internally the battle keeps a second arena as the working copy and swaps
/// it in at the end of each tick, so the caller only ever observes whole
/// pre-tick or post-tick snapshots.
#[derive(Debug, Clone)]
pub struct Battle {
    /// Working copy written during a tick.
    scratch: Arena,
    player_ctx: StatContext,
    enemy_ctx: StatContext,
    tuning: BattleTuning,
    physics: PhysicsResolver,
    last_timestamp_ms: f64,
    elapsed_ms: f64,
    /// Simulated time since the last landed hit.
    quiet_ms: f64,
    ticks: u64,
    outcome: Option<BattleOutcome>,
}

impl Battle {
    /// Arms a battle over `arena`.
    ///
    /// # Arguments
    ///
    /// * `arena` - Roster to fight with; its spatial index is rebuilt
    /// * `player_ctx` - Tech and artifacts of the player
    /// * `enemy_ctx` - Flat enemy tech, cached for the whole battle
    /// * `tuning` - Step clamp, separation and stalemate settings
    /// * `start_ms` - Timestamp the first tick's step is measured from
    #[must_use]
    pub fn start(
        arena: &mut Arena,
        player_ctx: StatContext,
        enemy_ctx: StatContext,
        tuning: BattleTuning,
        start_ms: f64,
    ) -> Self {
        arena.rebuild_spatial();
        Self {
            scratch: Arena::new(),
            player_ctx,
            enemy_ctx,
            physics: PhysicsResolver::with_separation(
                tuning.separation_radius,
                tuning.separation_strength,
            ),
            tuning,
            last_timestamp_ms: start_ms,
            elapsed_ms: 0.0,
            quiet_ms: 0.0,
            ticks: 0,
            outcome: None,
        }
    }

    /// Advances the battle to `timestamp_ms`.
    ///
    /// Once an outcome has been reached further ticks change nothing and
    /// report the same outcome.
    pub fn tick(&mut self, arena: &mut Arena, timestamp_ms: f64) -> TickReport {
        if let Some(outcome) = self.outcome {
            return TickReport {
                outcome: Some(outcome),
                kills: 0,
                events: Vec::new(),
                dt_s: 0.0,
            };
        }

        let dt_s = ((timestamp_ms - self.last_timestamp_ms) / 1000.0).clamp(0.0, self.tuning.max_step_s);
        self.last_timestamp_ms = timestamp_ms;
        self.ticks += 1;

        let mut log = EventLog::new();
        self.scratch.clone_from(arena);

        let kills = CombatResolver::sweep_dead(&mut self.scratch, &mut log);
        let mut outcome = CombatResolver::liveness(&self.scratch);

        if outcome.is_none() {
            #[allow(clippy::cast_possible_truncation)]
            let dt = dt_s as f32;
            let ids: Vec<EntityId> = self.scratch.entity_ids_sorted().collect();
            for id in ids {
                self.update_unit(id, timestamp_ms, dt, &mut log);
            }
        }

        std::mem::swap(arena, &mut self.scratch);

        self.elapsed_ms += dt_s * 1000.0;
        if log.hits() > 0 {
            self.quiet_ms = 0.0;
        } else {
            self.quiet_ms += dt_s * 1000.0;
        }
        if outcome.is_none()
            && self.tuning.stalemate_timeout_ms > 0.0
            && self.quiet_ms >= self.tuning.stalemate_timeout_ms
        {
            warn!(
                elapsed_ms = self.elapsed_ms,
                quiet_ms = self.quiet_ms,
                "battle stalled, declaring defeat"
            );
            outcome = Some(BattleOutcome::Defeat(DefeatReason::Stalemate));
        }

        let events = log.take_events();
        debug!(
            tick = self.ticks,
            dt_s,
            kills,
            events = events.len(),
            "battle tick"
        );

        self.outcome = outcome;
        TickReport {
            outcome,
            kills,
            events,
            dt_s,
        }
    }

    /// One unit's turn: retarget, face, then attack or move.
    fn update_unit(&mut self, id: EntityId, now_ms: f64, dt: f32, log: &mut EventLog) {
        let next = &mut self.scratch;
        let Some(unit) = next.get_alive(id) else {
            return;
        };
        let ctx = match unit.side() {
            Side::Player => &self.player_ctx,
            Side::Enemy => &self.enemy_ctx,
        };
        let stats = unit.stats(ctx);

        let Some(target) = targeting::acquire(next, id, log) else {
            if let Some(unit) = next.get_mut(id) {
                unit.combat.state = UnitState::Idle;
            }
            return;
        };
        let (Some(me), Some(foe)) = (next.get(id), next.get(target)) else {
            return;
        };
        let distance = targeting::distance(me, foe);
        let goal = foe.position();
        let in_range = distance <= stats.range;

        if let Some(unit) = next.get_mut(id) {
            unit.transform.facing_right = goal.x > unit.position().x;
            unit.combat.state = if in_range {
                UnitState::Attacking
            } else {
                UnitState::Moving
            };
        }

        if in_range {
            CombatResolver::try_strike(next, id, target, &stats, now_ms, log);
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let speed = stats.move_speed as f32;
            PhysicsResolver::step_toward(next, id, goal, speed, dt);
            self.physics.separate(next, id, dt);
        }
    }

    /// Terminal outcome, once reached.
    #[must_use]
    pub const fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    /// Number of ticks run so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated milliseconds so far.
    #[must_use]
    pub const fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Stat context used for enemy units.
    #[must_use]
    pub const fn enemy_context(&self) -> &StatContext {
        &self.enemy_ctx
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::UnitType;
    use crate::grid::GridCell;
    use glam::Vec2;

    fn start(arena: &mut Arena) -> Battle {
        Battle::start(
            arena,
            StatContext::default(),
            StatContext::flat(1),
            BattleTuning::default(),
            0.0,
        )
    }

    mod terminal_tests {
        use super::*;

        #[test]
        fn no_enemies_is_immediate_victory() {
            let mut arena = Arena::new();
            arena.spawn_unit(UnitType::Archer, 1, Side::Player, GridCell::new(0, 7), &StatContext::default());
            let mut battle = start(&mut arena);

            let report = battle.tick(&mut arena, 16.0);
            assert_eq!(report.outcome, Some(BattleOutcome::Victory));
            assert_eq!(battle.outcome(), Some(BattleOutcome::Victory));
        }

        #[test]
        fn no_players_is_immediate_defeat() {
            let mut arena = Arena::new();
            arena.spawn_unit(UnitType::Archer, 1, Side::Enemy, GridCell::new(0, 0), &StatContext::default());
            let mut battle = start(&mut arena);

            let report = battle.tick(&mut arena, 16.0);
            assert_eq!(
                report.outcome,
                Some(BattleOutcome::Defeat(DefeatReason::PlayerWiped))
            );
        }

        #[test]
        fn empty_roster_is_defeat_not_draw() {
            let mut arena = Arena::new();
            let mut battle = start(&mut arena);
            let report = battle.tick(&mut arena, 16.0);
            assert_eq!(
                report.outcome,
                Some(BattleOutcome::Defeat(DefeatReason::MutualDestruction))
            );
        }

        #[test]
        fn finished_battle_ignores_further_ticks() {
            let mut arena = Arena::new();
            arena.spawn_unit(UnitType::Archer, 1, Side::Player, GridCell::new(0, 7), &StatContext::default());
            let mut battle = start(&mut arena);
            battle.tick(&mut arena, 16.0);
            let before = arena.entities_sorted().cloned().collect::<Vec<_>>();

            let report = battle.tick(&mut arena, 5000.0);
            assert_eq!(report.outcome, Some(BattleOutcome::Victory));
            assert_eq!(battle.ticks(), 1);
            assert_eq!(arena.entities_sorted().cloned().collect::<Vec<_>>(), before);
        }
    }

    mod step_tests {
        use super::*;

        #[test]
        fn step_is_clamped_to_max() {
            let mut arena = Arena::new();
            let ctx = StatContext::default();
            arena.spawn_unit(UnitType::Infantry, 1, Side::Player, GridCell::new(3, 7), &ctx);
            arena.spawn_unit(UnitType::Infantry, 1, Side::Enemy, GridCell::new(3, 0), &ctx);
            let mut battle = start(&mut arena);

            let report = battle.tick(&mut arena, 10_000.0);
            assert!((report.dt_s - 0.1).abs() < 1e-12);
        }

        #[test]
        fn backwards_timestamp_does_not_rewind() {
            let mut arena = Arena::new();
            let ctx = StatContext::default();
            arena.spawn_unit(UnitType::Infantry, 1, Side::Player, GridCell::new(3, 7), &ctx);
            arena.spawn_unit(UnitType::Infantry, 1, Side::Enemy, GridCell::new(3, 0), &ctx);
            let mut battle = Battle::start(
                &mut arena,
                ctx,
                StatContext::flat(1),
                BattleTuning::default(),
                500.0,
            );

            let report = battle.tick(&mut arena, 400.0);
            assert!(report.dt_s.abs() < f64::EPSILON);
        }
    }

    mod behaviour_tests {
        use super::*;

        #[test]
        fn out_of_range_unit_moves_toward_target() {
            let mut arena = Arena::new();
            let ctx = StatContext::default();
            let p = arena.spawn_unit(UnitType::Infantry, 1, Side::Player, GridCell::new(3, 7), &ctx);
            let e = arena.spawn_unit(UnitType::Tank, 1, Side::Enemy, GridCell::new(3, 2), &ctx);
            let mut battle = start(&mut arena);

            battle.tick(&mut arena, 100.0);

            let unit = arena.get(p).unwrap();
            assert_eq!(unit.state(), UnitState::Moving);
            assert_eq!(unit.combat.target, Some(e));
            // 2.5 units/s for 0.1 s
            assert!((unit.position().y - 6.75).abs() < 1e-5);
        }

        #[test]
        fn in_range_unit_attacks_and_faces_target() {
            let mut arena = Arena::new();
            let ctx = StatContext::default();
            let p = arena.spawn_unit(UnitType::Archer, 1, Side::Player, GridCell::new(3, 5), &ctx);
            let e = arena.spawn_unit(UnitType::Golem, 1, Side::Enemy, GridCell::new(1, 3), &ctx);
            let mut battle = start(&mut arena);

            let report = battle.tick(&mut arena, 16.0);

            let archer = arena.get(p).unwrap();
            assert_eq!(archer.state(), UnitState::Attacking);
            assert!(!archer.transform.facing_right);
            assert_eq!(arena.get(e).unwrap().hp(), 575);
            assert!(report
                .events
                .iter()
                .any(|ev| matches!(ev, BattleEvent::AttackLanded { attacker, .. } if *attacker == p)));
        }

        #[test]
        fn killed_enemy_counts_on_next_sweep() {
            let mut arena = Arena::new();
            let ctx = StatContext::default();
            arena.spawn_unit(UnitType::Sniper, 1, Side::Player, GridCell::new(3, 7), &ctx);
            let e = arena.spawn_unit(UnitType::Infantry, 1, Side::Enemy, GridCell::new(3, 1), &ctx);
            let mut battle = start(&mut arena);

            let first = battle.tick(&mut arena, 16.0);
            assert_eq!(first.kills, 0);
            assert!(first.outcome.is_none());
            assert!(arena.get(e).unwrap().hp() <= 0);

            let second = battle.tick(&mut arena, 32.0);
            assert_eq!(second.kills, 1);
            assert_eq!(second.outcome, Some(BattleOutcome::Victory));
            assert_eq!(arena.get(e).unwrap().state(), UnitState::Dead);
        }

        #[test]
        fn dead_units_neither_move_nor_attack() {
            let mut arena = Arena::new();
            let ctx = StatContext::default();
            let dead = arena.spawn_unit(UnitType::Archer, 1, Side::Player, GridCell::new(3, 5), &ctx);
            let _alive = arena.spawn_unit(UnitType::Infantry, 1, Side::Player, GridCell::new(0, 7), &ctx);
            let e = arena.spawn_unit(UnitType::Golem, 1, Side::Enemy, GridCell::new(3, 3), &ctx);
            arena.get_mut(dead).unwrap().combat.hp = 0;
            let mut battle = start(&mut arena);

            let report = battle.tick(&mut arena, 16.0);

            assert_eq!(arena.get(dead).unwrap().position(), Vec2::new(3.0, 5.0));
            assert!(!report
                .events
                .iter()
                .any(|ev| matches!(ev, BattleEvent::AttackLanded { attacker, .. } if *attacker == dead)));
            assert_eq!(arena.get(e).unwrap().hp(), 600);
        }
    }

    mod stalemate_tests {
        use super::*;

        #[test]
        fn quiet_battle_times_out() {
            let mut arena = Arena::new();
            let ctx = StatContext::default();
            arena.spawn_unit(UnitType::Infantry, 1, Side::Player, GridCell::new(0, 7), &ctx);
            arena.spawn_unit(UnitType::Infantry, 1, Side::Enemy, GridCell::new(6, 0), &ctx);
            let tuning = BattleTuning {
                stalemate_timeout_ms: 250.0,
                ..BattleTuning::default()
            };
            let mut battle = Battle::start(&mut arena, ctx, StatContext::flat(1), tuning, 0.0);

            // 9.2 apart at 2.5 units/s: nobody is in range for several seconds
            assert!(battle.tick(&mut arena, 100.0).outcome.is_none());
            assert!(battle.tick(&mut arena, 200.0).outcome.is_none());
            let report = battle.tick(&mut arena, 300.0);
            assert_eq!(
                report.outcome,
                Some(BattleOutcome::Defeat(DefeatReason::Stalemate))
            );
            assert!((battle.elapsed_ms() - 300.0).abs() < 1e-6);
        }

        #[test]
        fn hits_reset_the_quiet_timer() {
            let mut arena = Arena::new();
            let ctx = StatContext::default();
            arena.spawn_unit(UnitType::Golem, 1, Side::Player, GridCell::new(3, 4), &ctx);
            arena.spawn_unit(UnitType::Golem, 1, Side::Enemy, GridCell::new(3, 3), &ctx);
            let tuning = BattleTuning {
                stalemate_timeout_ms: 2500.0,
                ..BattleTuning::default()
            };
            let mut battle = Battle::start(&mut arena, ctx, StatContext::flat(1), tuning, 0.0);

            // golems swing every 1.67 s, so the 2.5 s quiet window never closes
            let mut t = 0.0;
            for _ in 0..100 {
                t += 100.0;
                let report = battle.tick(&mut arena, t);
                assert_ne!(
                    report.outcome,
                    Some(BattleOutcome::Defeat(DefeatReason::Stalemate))
                );
            }
        }
    }
}
