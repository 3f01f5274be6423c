//! Coins, recruitment, upgrades and rewards.
//!
//! [`Economy`] owns every number the player spends or earns during a run and
//! the player's half of the stat model (tech book and artifact levels). Each
//! purchase validates everything first and only then spends and mutates, so a
//! rejected action never costs coins. Actions that touch units take the
//! [`Arena`] explicitly.
//!
//! # Submodules
//!
//! - [`gacha`]: Tier tables for random recruits
//! - [`synthesis`]: Top-tier recipes
//! - [`achievements`]: Run-stat thresholds with one-time rewards
//! - [`supply`]: The timed supply drop

pub mod achievements;
pub mod gacha;
pub mod supply;
pub mod synthesis;

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::archetype::{UnitTier, UnitType};
use crate::arena::{Arena, HpAdjust};
use crate::config::{BalanceConfig, UpgradeTrack};
use crate::entity::{Entity, EntityId, Side};
use crate::error::{GameError, Result};
use crate::stats::{ArtifactKind, ArtifactLevels, StatContext, TechBook};

pub use achievements::{Achievement, Metric, RunStats, ACHIEVEMENTS};
pub use gacha::TierTable;
pub use synthesis::{Recipe, SynthesisPlan, RECIPES};

// =============================================================================
// Purchase kinds
// =============================================================================

/// How a unit is recruited.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecruitKind {
    /// Basic draw over Common to Legendary
    Random,
    /// Draw over Rare to Legendary at a multiple of the random price
    Premium,
    /// A chosen type at its own price
    Specific(UnitType),
}

/// Run-wide upgrade tracks.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalTech {
    /// Raises the unit cap
    Capacity,
    /// Improves recruit odds
    Luck,
    /// Tech level of every top-tier unit
    MythicMastery,
}

impl GlobalTech {
    /// All tracks.
    pub const ALL: [Self; 3] = [Self::Capacity, Self::Luck, Self::MythicMastery];
}

// =============================================================================
// Economy
// =============================================================================

/// Wallet, prices and progression of the player.
#[derive(Debug, Clone)]
pub struct Economy {
    config: BalanceConfig,
    coins: u64,
    recruit_cost: u64,
    unit_costs: [u64; UnitType::COUNT],
    tech: TechBook,
    capacity_level: u32,
    luck_level: u32,
    artifacts: ArtifactLevels,
    artifact_cost: u64,
    stats: RunStats,
    /// Survives new runs; cleared only by a full reset.
    claimed: BTreeSet<&'static str>,
    last_supply_ms: f64,
    rng: ChaCha8Rng,
}

impl Economy {
    /// Creates an economy at the start of a run.
    ///
    /// `now_ms` starts the supply cooldown.
    #[must_use]
    pub fn new(config: BalanceConfig, seed: u64, now_ms: f64) -> Self {
        let mut economy = Self {
            coins: 0,
            recruit_cost: 0,
            unit_costs: [0; UnitType::COUNT],
            tech: TechBook::default(),
            capacity_level: 1,
            luck_level: 1,
            artifacts: ArtifactLevels::default(),
            artifact_cost: 0,
            stats: RunStats::default(),
            claimed: BTreeSet::new(),
            last_supply_ms: now_ms,
            rng: ChaCha8Rng::seed_from_u64(seed),
            config,
        };
        economy.new_run();
        economy
    }

    /// Resets coins, prices, tech, artifacts and run stats.
    ///
    /// Claimed achievements and the supply timer carry over.
    pub fn new_run(&mut self) {
        self.coins = self.config.starting_coins;
        self.recruit_cost = self.config.recruit_base_cost;
        for unit_type in UnitType::ALL {
            self.unit_costs[unit_type.index()] = self.initial_unit_cost(unit_type);
        }
        self.tech = TechBook::default();
        self.capacity_level = 1;
        self.luck_level = 1;
        self.artifacts = ArtifactLevels::default();
        self.artifact_cost = self.config.artifact_base_cost;
        self.stats = RunStats::default();
    }

    /// Forgets every claimed achievement.
    pub fn forget_achievements(&mut self) {
        self.claimed.clear();
    }

    fn initial_unit_cost(&self, unit_type: UnitType) -> u64 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let cost = (self.config.specific_base_cost as f64 * unit_type.tier().cost_multiplier()).floor() as u64;
        cost
    }

    // ===== Accessors =====

    /// Coins held.
    #[must_use]
    pub const fn coins(&self) -> u64 {
        self.coins
    }

    /// Overrides the wallet. Meant for tools and tests.
    pub fn set_coins(&mut self, coins: u64) {
        self.coins = coins;
    }

    /// Current random recruit price.
    #[must_use]
    pub const fn recruit_cost(&self) -> u64 {
        self.recruit_cost
    }

    /// Current price of one type in the shop.
    #[must_use]
    pub const fn unit_cost(&self, unit_type: UnitType) -> u64 {
        self.unit_costs[unit_type.index()]
    }

    /// Price of the next artifact.
    #[must_use]
    pub const fn artifact_cost(&self) -> u64 {
        self.artifact_cost
    }

    /// Player tech levels.
    #[must_use]
    pub const fn tech(&self) -> &TechBook {
        &self.tech
    }

    /// Player artifact levels.
    #[must_use]
    pub const fn artifacts(&self) -> &ArtifactLevels {
        &self.artifacts
    }

    /// Run counters.
    #[must_use]
    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// The balance this economy was built with.
    #[must_use]
    pub const fn config(&self) -> &BalanceConfig {
        &self.config
    }

    /// Stat context for player units.
    #[must_use]
    pub const fn player_context(&self) -> StatContext {
        StatContext::new(self.tech, self.artifacts)
    }

    /// Multiplier on coin rewards.
    #[must_use]
    pub fn gold_multiplier(&self) -> f64 {
        self.artifacts.gold_multiplier()
    }

    /// Most units the player may field.
    #[must_use]
    pub fn unit_cap(&self) -> u32 {
        self.config.unit_cap(self.capacity_level)
    }

    /// Level of a global track.
    #[must_use]
    pub const fn global_level(&self, track: GlobalTech) -> u32 {
        match track {
            GlobalTech::Capacity => self.capacity_level,
            GlobalTech::Luck => self.luck_level,
            GlobalTech::MythicMastery => self.tech.mastery(),
        }
    }

    const fn track(&self, track: GlobalTech) -> &UpgradeTrack {
        match track {
            GlobalTech::Capacity => &self.config.capacity,
            GlobalTech::Luck => &self.config.luck,
            GlobalTech::MythicMastery => &self.config.mastery,
        }
    }

    /// Price of the next level of a global track.
    #[must_use]
    pub fn global_cost(&self, track: GlobalTech) -> u64 {
        self.track(track).cost_at(self.global_level(track))
    }

    /// Price of the next tech level of a type.
    #[must_use]
    pub fn tech_cost(&self, unit_type: UnitType) -> u64 {
        self.config.tech_cost(self.tech.unit_level(unit_type))
    }

    /// Returns `true` if the achievement reward was collected.
    #[must_use]
    pub fn is_claimed(&self, id: &str) -> bool {
        self.claimed.contains(id)
    }

    fn ensure_funds(&self, need: u64) -> Result<()> {
        if self.coins < need {
            warn!(have = self.coins, need, "insufficient funds");
            return Err(GameError::InsufficientFunds {
                have: self.coins,
                need,
            });
        }
        Ok(())
    }

    // ===== Recruitment =====

    /// Buys a level 1 unit and places it on the first free player cell.
    ///
    /// # Errors
    ///
    /// - [`GameError::UnitCapReached`] if the player fields the cap already
    /// - [`GameError::NotRecruitable`] for a specific top-tier type
    /// - [`GameError::InsufficientFunds`] if the price is not covered
    /// - [`GameError::NoFreeCell`] if the player half is full
    pub fn recruit(&mut self, arena: &mut Arena, kind: RecruitKind) -> Result<EntityId> {
        let cap = self.unit_cap();
        if arena.count_side(Side::Player) >= cap as usize {
            return Err(GameError::UnitCapReached { cap });
        }

        let cost = match kind {
            RecruitKind::Random => self.recruit_cost,
            RecruitKind::Premium => self.recruit_cost * self.config.premium_multiplier,
            RecruitKind::Specific(unit_type) => {
                if unit_type.tier().is_top() {
                    return Err(GameError::NotRecruitable(unit_type));
                }
                self.unit_cost(unit_type)
            }
        };
        self.ensure_funds(cost)?;

        let ctx = self.player_context();
        let luck = self.luck_level;
        let rng = &mut self.rng;
        let (id, unit_type, cell) = arena.transaction(|next| {
            let cell = next.first_free_player_cell().ok_or(GameError::NoFreeCell)?;
            let unit_type = match kind {
                RecruitKind::Random => TierTable::random(luck).draw(rng),
                RecruitKind::Premium => TierTable::premium(luck).draw(rng),
                RecruitKind::Specific(unit_type) => unit_type,
            };
            let id = next.spawn_unit(unit_type, 1, Side::Player, cell, &ctx);
            Ok::<_, GameError>((id, unit_type, cell))
        })?;
        self.coins -= cost;
        match kind {
            RecruitKind::Random | RecruitKind::Premium => {
                self.recruit_cost += self.config.recruit_cost_step;
            }
            RecruitKind::Specific(unit_type) => {
                self.unit_costs[unit_type.index()] += self.config.recruit_cost_step;
            }
        }
        self.stats.summons += 1;

        info!(?kind, %unit_type, %cell, cost, "recruited unit");
        Ok(id)
    }

    // ===== Upgrades =====

    /// Raises one type's tech level and refills its player units.
    ///
    /// # Errors
    ///
    /// [`GameError::NotUpgradable`] for top-tier types, which follow mythic
    /// mastery, and [`GameError::InsufficientFunds`].
    pub fn upgrade_tech(&mut self, arena: &mut Arena, unit_type: UnitType) -> Result<u32> {
        if unit_type.tier().is_top() {
            return Err(GameError::NotUpgradable(unit_type));
        }
        let cost = self.tech_cost(unit_type);
        self.ensure_funds(cost)?;

        self.coins -= cost;
        let level = self.tech.raise_unit(unit_type);
        let ctx = self.player_context();
        arena.reprice(
            |e| e.side() == Side::Player && e.unit_type() == unit_type,
            &ctx,
            HpAdjust::Refill,
        );

        info!(%unit_type, level, cost, "tech upgraded");
        Ok(level)
    }

    /// Raises a global track. Mastery refills player top-tier units.
    ///
    /// # Errors
    ///
    /// [`GameError::MaxLevelReached`] and [`GameError::InsufficientFunds`].
    pub fn upgrade_global(&mut self, arena: &mut Arena, track: GlobalTech) -> Result<u32> {
        let max = self.track(track).max_level;
        if self.global_level(track) >= max {
            return Err(GameError::MaxLevelReached { max });
        }
        let cost = self.global_cost(track);
        self.ensure_funds(cost)?;

        self.coins -= cost;
        let level = match track {
            GlobalTech::Capacity => {
                self.capacity_level += 1;
                self.capacity_level
            }
            GlobalTech::Luck => {
                self.luck_level += 1;
                self.luck_level
            }
            GlobalTech::MythicMastery => {
                let level = self.tech.raise_mastery();
                let ctx = self.player_context();
                arena.reprice(
                    |e| e.side() == Side::Player && e.unit_type().tier() == UnitTier::Mythic,
                    &ctx,
                    HpAdjust::Refill,
                );
                level
            }
        };

        info!(?track, level, cost, "global upgrade");
        Ok(level)
    }

    /// Buys a random artifact level and reprices every player unit, keeping
    /// missing hit points missing.
    ///
    /// # Errors
    ///
    /// [`GameError::InsufficientFunds`].
    pub fn buy_artifact(&mut self, arena: &mut Arena) -> Result<ArtifactKind> {
        let cost = self.artifact_cost;
        self.ensure_funds(cost)?;

        self.coins -= cost;
        let kind = ArtifactKind::ALL[self.rng.gen_range(0..ArtifactKind::ALL.len())];
        let level = self.artifacts.increment(kind);
        self.artifact_cost += self.config.artifact_cost_step;
        let ctx = self.player_context();
        arena.reprice(|e| e.side() == Side::Player, &ctx, HpAdjust::HealDelta);

        info!(?kind, level, cost, "artifact acquired");
        Ok(kind)
    }

    // ===== Selling and synthesis =====

    /// Refund for selling `entity` at current prices.
    #[must_use]
    pub fn sell_value(&self, entity: &Entity) -> u64 {
        #[allow(clippy::cast_precision_loss)]
        let base = (self.recruit_cost as f64 * entity.unit_type().tier().cost_multiplier()).floor();
        let exponent = i32::try_from(entity.level().saturating_sub(1)).unwrap_or(i32::MAX);
        let total = base * 2f64.powi(exponent);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let refund = (total * self.config.sell_ratio).floor() as u64;
        refund
    }

    /// Removes a player unit for a partial refund.
    ///
    /// # Errors
    ///
    /// [`GameError::EntityNotFound`] or [`GameError::NotPlayerOwned`].
    pub fn sell(&mut self, arena: &mut Arena, id: EntityId) -> Result<u64> {
        let (refund, unit_type) = arena.transaction(|next| {
            let entity = next.get(id).ok_or(GameError::EntityNotFound(id))?;
            if entity.side() != Side::Player {
                return Err(GameError::NotPlayerOwned(id));
            }
            let sold = (self.sell_value(entity), entity.unit_type());
            next.despawn(id);
            Ok::<_, GameError>(sold)
        })?;
        self.coins += refund;
        info!(%unit_type, refund, "unit sold");
        Ok(refund)
    }

    /// Turns two level-gated ingredients into a level 1 top-tier unit.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownId`], [`GameError::InsufficientFunds`] and
    /// [`GameError::MissingIngredients`]. If the ingredients vanish between
    /// planning and commit the price is already spent.
    pub fn synthesize(&mut self, arena: &mut Arena, recipe_id: &str) -> Result<EntityId> {
        let recipe = synthesis::recipe(recipe_id)?;
        let cost = self.config.synthesis_cost;
        let min_level = self.config.synthesis_min_level;
        self.ensure_funds(cost)?;
        let plan = synthesis::plan(arena, recipe, min_level)?;

        self.coins -= cost;
        let id = synthesis::commit(arena, &plan, &self.player_context(), min_level)?;
        info!(recipe = recipe.id, result = %recipe.result, "synthesis complete");
        Ok(id)
    }

    // ===== Rewards =====

    /// Collects an earned achievement.
    ///
    /// # Errors
    ///
    /// [`GameError::UnknownId`], [`GameError::AchievementAlreadyClaimed`] and
    /// [`GameError::AchievementNotEarned`].
    pub fn claim_achievement(&mut self, id: &str) -> Result<u64> {
        let achievement = achievements::find(id).ok_or_else(|| GameError::UnknownId(id.to_owned()))?;
        if self.claimed.contains(achievement.id) {
            return Err(GameError::AchievementAlreadyClaimed(achievement.id));
        }
        if !achievement.is_earned(&self.stats) {
            return Err(GameError::AchievementNotEarned(achievement.id));
        }

        self.claimed.insert(achievement.id);
        self.coins += achievement.reward;
        info!(id = achievement.id, reward = achievement.reward, "achievement claimed");
        Ok(achievement.reward)
    }

    /// Achievements that are earned but not yet claimed.
    pub fn claimable_achievements(&self) -> impl Iterator<Item = &'static Achievement> + '_ {
        ACHIEVEMENTS
            .iter()
            .filter(|a| a.is_earned(&self.stats) && !self.claimed.contains(a.id))
    }

    /// Returns `true` once the supply cooldown has elapsed.
    #[must_use]
    pub fn supply_ready(&self, now_ms: f64) -> bool {
        supply::is_claimable(now_ms, self.last_supply_ms, self.config.supply_cooldown_ms)
    }

    /// Collects the supply drop and restarts its cooldown.
    ///
    /// # Errors
    ///
    /// [`GameError::SupplyNotReady`] while cooling down.
    pub fn claim_supply(&mut self, now_ms: f64, level: u32) -> Result<u64> {
        if !self.supply_ready(now_ms) {
            return Err(GameError::SupplyNotReady);
        }
        let amount = supply::payout(
            self.config.supply_base,
            self.config.supply_per_level,
            level,
            self.gold_multiplier(),
        );
        self.coins += amount;
        self.last_supply_ms = now_ms;
        info!(amount, level, "supply claimed");
        Ok(amount)
    }

    /// Pays victory loot for `level` and counts the win.
    pub fn award_victory(&mut self, level: u32) -> u64 {
        let base = self.config.loot_base + self.config.loot_per_level * u64::from(level);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let loot = (base as f64 * self.gold_multiplier()).floor() as u64;
        self.coins += loot;
        self.stats.wins += 1;
        info!(level, loot, "victory loot");
        loot
    }

    /// Adds battle kills to the run counters.
    pub fn record_kills(&mut self, kills: u32) {
        self.stats.kills += u64::from(kills);
    }

    /// Counts one merge.
    pub fn record_merge(&mut self) {
        self.stats.merges += 1;
    }
}

// =============================================================================
// Tests
// =============================================================================
