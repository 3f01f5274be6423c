//! Combat resolver: deaths, liveness and attacks.
//!
//! The `CombatResolver` handles:
//! - The death sweep at the start of each tick
//! - The liveness check that decides whether the battle is over
//! - Attack timing and damage application
//!
//! # Destruction Handling
//!
//! Damage may push hit points below zero. The entity keeps fighting state
//! until the next death sweep marks it `Dead`, but every query that matters
//! (targeting, movement, attacking) already treats `hp <= 0` as dead.

use crate::arena::Arena;
use crate::entity::{EntityId, Side, UnitState};
use crate::event::{BattleEvent, EventLog};
use crate::simulation::{BattleOutcome, DefeatReason};
use crate::stats::DerivedStats;

/// Resolver for combat state.
///
/// # Example
///
/// ```
/// use mergewar_core::arena::Arena;
/// use mergewar_core::resolver::CombatResolver;
/// use mergewar_core::simulation::{BattleOutcome, DefeatReason};
///
/// let arena = Arena::new();
/// assert_eq!(
///     CombatResolver::liveness(&arena),
///     Some(BattleOutcome::Defeat(DefeatReason::MutualDestruction))
/// );
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CombatResolver;

impl CombatResolver {
    /// Marks every entity at or below zero hp as `Dead`.
    ///
    /// # Returns
    ///
    /// The number of enemies that died since the previous sweep.
    pub fn sweep_dead(next: &mut Arena, log: &mut EventLog) -> u32 {
        let mut kills = 0;
        for entity in next.entities_sorted_mut() {
            if entity.is_alive() || entity.state() == UnitState::Dead {
                continue;
            }
            entity.combat.state = UnitState::Dead;
            if entity.side() == Side::Enemy {
                kills += 1;
            }
            log.record(BattleEvent::UnitDied {
                unit: entity.id(),
                side: entity.side(),
            });
        }
        kills
    }

    /// Terminal outcome for the current roster, if any.
    ///
    /// Both sides wiped out counts as a defeat, not a draw.
    #[must_use]
    pub fn liveness(arena: &Arena) -> Option<BattleOutcome> {
        let players = arena.any_alive(Side::Player);
        let enemies = arena.any_alive(Side::Enemy);
        match (players, enemies) {
            (false, false) => Some(BattleOutcome::Defeat(DefeatReason::MutualDestruction)),
            (false, true) => Some(BattleOutcome::Defeat(DefeatReason::PlayerWiped)),
            (true, false) => Some(BattleOutcome::Victory),
            (true, true) => None,
        }
    }

    /// Swings at `target` if the attacker's cooldown has elapsed.
    ///
    /// Damage is applied to the working copy immediately, so a unit that is
    /// killed earlier in the tick stops being a valid target for everyone
    /// after it.
    ///
    /// # Returns
    ///
    /// `true` if the attack landed.
    pub fn try_strike(
        next: &mut Arena,
        attacker: EntityId,
        target: EntityId,
        stats: &DerivedStats,
        now_ms: f64,
        log: &mut EventLog,
    ) -> bool {
        let ready = next
            .get(attacker)
            .is_some_and(|a| {
                a.is_alive() && a.combat.ready_to_attack(now_ms, stats.attack_interval_ms())
            });
        if !ready || next.get_alive(target).is_none() {
            return false;
        }

        if let Some(victim) = next.get_mut(target) {
            victim.combat.hp -= stats.damage;
        }
        if let Some(a) = next.get_mut(attacker) {
            a.combat.last_attack_ms = Some(now_ms);
        }
        log.record(BattleEvent::AttackLanded {
            attacker,
            target,
            damage: stats.damage,
        });
        true
    }
}
