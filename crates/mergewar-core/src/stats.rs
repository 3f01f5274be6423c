//! Stat derivation.
//!
//! Derived stats are a pure function of archetype, level, tech level and
//! artifact levels. Nothing here holds mutable state; callers pass the
//! relevant [`StatContext`] explicitly.
//!
//! # Example
//!
//! ```
//! use mergewar_core::archetype::UnitType;
//! use mergewar_core::stats::{derive_stats, ArtifactLevels};
//!
//! let stats = derive_stats(UnitType::Archer, 2, 1, &ArtifactLevels::default());
//! assert_eq!(stats.hp, 144); // floor(80 * 1.8)
//! assert_eq!(stats.damage, 40); // floor(25 * 1.6)
//! ```

use serde::{Deserialize, Serialize};

use crate::archetype::UnitType;

/// Per-level hit point growth factor.
pub const HP_GROWTH: f64 = 1.8;

/// Per-level damage growth factor.
pub const DAMAGE_GROWTH: f64 = 1.6;

/// Hit point and damage bonus per tech level above 1.
pub const TECH_STEP: f64 = 0.2;

// =============================================================================
// Artifacts
// =============================================================================

/// The five account-wide artifacts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// +5% damage per level
    HolySword,
    /// +5% hit points per level
    AncientShield,
    /// +3% attack rate per level
    WarDrums,
    /// +5% move speed per level
    WindCloak,
    /// +10% currency gains per level
    MidasGlove,
}

impl ArtifactKind {
    /// All artifacts, in acquisition-table order.
    pub const ALL: [Self; 5] = [
        Self::HolySword,
        Self::AncientShield,
        Self::WarDrums,
        Self::WindCloak,
        Self::MidasGlove,
    ];

    /// Fractional bonus granted per level.
    #[must_use]
    pub const fn per_level(self) -> f64 {
        match self {
            Self::HolySword | Self::AncientShield | Self::WindCloak => 0.05,
            Self::WarDrums => 0.03,
            Self::MidasGlove => 0.1,
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Levels of the five artifacts, all starting at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactLevels {
    levels: [u32; 5],
}

impl ArtifactLevels {
    /// Returns the level of one artifact.
    #[must_use]
    pub const fn get(&self, kind: ArtifactKind) -> u32 {
        self.levels[kind.index()]
    }

    /// Raises one artifact by a level and returns the new level.
    pub fn increment(&mut self, kind: ArtifactKind) -> u32 {
        let slot = &mut self.levels[kind.index()];
        *slot += 1;
        *slot
    }

    /// Sets one artifact level directly.
    pub fn set(&mut self, kind: ArtifactKind, level: u32) {
        self.levels[kind.index()] = level;
    }

    /// Multiplier `1 + per_level * level` for one artifact.
    #[must_use]
    pub fn multiplier(&self, kind: ArtifactKind) -> f64 {
        kind.per_level().mul_add(f64::from(self.get(kind)), 1.0)
    }

    /// Multiplier applied to all currency gains.
    #[must_use]
    pub fn gold_multiplier(&self) -> f64 {
        self.multiplier(ArtifactKind::MidasGlove)
    }
}

// =============================================================================
// Tech
// =============================================================================

/// Per-type tech levels plus the shared mastery track for the top tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechBook {
    unit_levels: [u32; UnitType::COUNT],
    mastery: u32,
}

impl Default for TechBook {
    fn default() -> Self {
        Self::uniform(1)
    }
}

impl TechBook {
    /// A book where every track sits at the same level.
    #[must_use]
    pub const fn uniform(level: u32) -> Self {
        Self {
            unit_levels: [level; UnitType::COUNT],
            mastery: level,
        }
    }

    /// Tech level that applies to `unit_type`.
    ///
    /// Top-tier types read the shared mastery level instead of their own slot.
    #[must_use]
    pub fn level_for(&self, unit_type: UnitType) -> u32 {
        if unit_type.tier().is_top() {
            self.mastery
        } else {
            self.unit_levels[unit_type.index()]
        }
    }

    /// Per-type level, ignoring the mastery redirect.
    #[must_use]
    pub const fn unit_level(&self, unit_type: UnitType) -> u32 {
        self.unit_levels[unit_type.index()]
    }

    /// Shared mastery level.
    #[must_use]
    pub const fn mastery(&self) -> u32 {
        self.mastery
    }

    /// Raises the per-type track and returns the new level.
    pub fn raise_unit(&mut self, unit_type: UnitType) -> u32 {
        let slot = &mut self.unit_levels[unit_type.index()];
        *slot += 1;
        *slot
    }

    /// Raises the mastery track and returns the new level.
    pub fn raise_mastery(&mut self) -> u32 {
        self.mastery += 1;
        self.mastery
    }
}

// =============================================================================
// Derivation
// =============================================================================

/// Everything one side contributes to its units' stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatContext {
    /// Tech levels
    pub tech: TechBook,
    /// Artifact levels
    pub artifacts: ArtifactLevels,
}

impl StatContext {
    /// Creates a context from explicit parts.
    #[must_use]
    pub const fn new(tech: TechBook, artifacts: ArtifactLevels) -> Self {
        Self { tech, artifacts }
    }

    /// A context with one tech level for every type and no artifacts.
    ///
    /// This is how enemies are scaled.
    #[must_use]
    pub fn flat(tech_level: u32) -> Self {
        Self {
            tech: TechBook::uniform(tech_level),
            artifacts: ArtifactLevels::default(),
        }
    }

    /// Derives stats for a unit of this side.
    #[must_use]
    pub fn derive(&self, unit_type: UnitType, level: u32) -> DerivedStats {
        derive_stats(
            unit_type,
            level,
            self.tech.level_for(unit_type),
            &self.artifacts,
        )
    }
}

/// Fully scaled combat attributes of a unit at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    /// Maximum hit points
    pub hp: i64,
    /// Damage per hit
    pub damage: i64,
    /// Attacks per second, two decimals
    pub attack_rate: f64,
    /// Attack range in grid units
    pub range: f32,
    /// Grid units per second, two decimals
    pub move_speed: f64,
}

impl DerivedStats {
    /// Minimum milliseconds between two attacks.
    #[must_use]
    pub fn attack_interval_ms(&self) -> f64 {
        1000.0 / self.attack_rate
    }
}

/// Derives the combat attributes of a unit.
///
/// Level scaling, tech scaling and the artifact multiplier are multiplied
/// together and floored once. Attack rate and move speed are rounded to two
/// decimals; range never scales.
///
/// # Arguments
///
/// * `unit_type` - Archetype to scale
/// * `level` - Unit level, at least 1
/// * `tech_level` - Tech level that applies to this type, at least 1
/// * `artifacts` - Artifact levels of the owning side
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn derive_stats(
    unit_type: UnitType,
    level: u32,
    tech_level: u32,
    artifacts: &ArtifactLevels,
) -> DerivedStats {
    let base = unit_type.archetype();
    let level_exp = exponent(level);
    let tech_mult = tech_multiplier(tech_level);

    let hp = base.hp
        * HP_GROWTH.powi(level_exp)
        * tech_mult
        * artifacts.multiplier(ArtifactKind::AncientShield);
    let damage = base.damage
        * DAMAGE_GROWTH.powi(level_exp)
        * tech_mult
        * artifacts.multiplier(ArtifactKind::HolySword);

    DerivedStats {
        hp: hp.floor() as i64,
        damage: damage.floor() as i64,
        attack_rate: round2(base.attack_rate * artifacts.multiplier(ArtifactKind::WarDrums)),
        range: base.range,
        move_speed: round2(base.move_speed * artifacts.multiplier(ArtifactKind::WindCloak)),
    }
}

/// Tech multiplier `1 + 0.2 * (tech_level - 1)`.
#[must_use]
pub fn tech_multiplier(tech_level: u32) -> f64 {
    TECH_STEP.mul_add(f64::from(tech_level.max(1) - 1), 1.0)
}

#[allow(clippy::cast_possible_wrap)]
fn exponent(level: u32) -> i32 {
    level.max(1).saturating_sub(1).min(i32::MAX as u32) as i32
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// =============================================================================
// Tests
// =============================================================================
