//! Difficulty settings and enemy roster generation.
//!
//! The session only sees the [`LevelGenerator`] trait. [`ProceduralGenerator`]
//! is the shipped implementation: a seeded `ChaCha8Rng` drives every roll, so
//! one seed always produces the same sequence of levels.

use std::collections::BTreeSet;
use std::fmt;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::archetype::UnitType;
use crate::grid::{GridCell, ENEMY_LAST_ROW, GRID_COLS};

/// Hard cap on enemies per level.
pub const MAX_ENEMIES: u32 = 16;

/// Random cells tried per enemy before it is dropped.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 20;

// =============================================================================
// Difficulty
// =============================================================================

/// Campaign difficulty.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Difficulty {
    /// 30 levels
    #[default]
    Normal,
    /// 40 levels
    Hard,
    /// 50 levels
    Hell,
}

/// Fixed parameters of one difficulty.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DifficultySettings {
    /// Display name
    pub name: &'static str,
    /// Final level of the campaign
    pub max_level: u32,
    /// Scales enemy tech
    pub enemy_multiplier: f64,
}

impl Difficulty {
    /// Every difficulty in unlock order.
    pub const ALL: [Self; 3] = [Self::Normal, Self::Hard, Self::Hell];

    /// Unlock rank, starting at 0.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self as u8
    }

    /// Parameters of this difficulty.
    #[must_use]
    pub const fn settings(self) -> DifficultySettings {
        match self {
            Self::Normal => DifficultySettings {
                name: "Normal",
                max_level: 30,
                enemy_multiplier: 0.8,
            },
            Self::Hard => DifficultySettings {
                name: "Hard",
                max_level: 40,
                enemy_multiplier: 1.0,
            },
            Self::Hell => DifficultySettings {
                name: "Hell",
                max_level: 50,
                enemy_multiplier: 1.2,
            },
        }
    }

    /// The difficulty unlocked by clearing this one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Normal => Some(Self::Hard),
            Self::Hard => Some(Self::Hell),
            Self::Hell => None,
        }
    }

    /// Enemy unit level at `level` of the campaign.
    #[must_use]
    pub const fn enemy_unit_level(self, level: u32) -> u32 {
        match self {
            Self::Normal => 1 + level / 8,
            Self::Hard => 1 + level / 6,
            Self::Hell => 2 + level / 5,
        }
    }

    /// Enemies spawned at `level`, capped at [`MAX_ENEMIES`].
    #[must_use]
    pub fn enemy_count(self, level: u32) -> u32 {
        let base = 2 + level / 4;
        let bonus = match self {
            Self::Normal => 0,
            Self::Hard => level / 10,
            Self::Hell => 1 + level / 5,
        };
        (base + bonus).min(MAX_ENEMIES)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.settings().name)
    }
}

/// Tech level of every enemy unit at `level`: `max(1, ceil(level / divisor * multiplier))`.
#[must_use]
pub fn enemy_tech_level(level: u32, difficulty: Difficulty, divisor: f64) -> u32 {
    let raw = (f64::from(level) / divisor * difficulty.settings().enemy_multiplier).ceil();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let tech = raw.max(1.0) as u32;
    tech
}

/// Unit types enemies may field at `level`.
#[must_use]
pub fn enemy_pool(level: u32) -> Vec<UnitType> {
    let mut pool = vec![UnitType::Infantry, UnitType::Archer];
    if level > 3 {
        pool.extend([UnitType::Tank, UnitType::Spearman]);
    }
    if level > 6 {
        pool.extend([UnitType::Mage, UnitType::Assassin]);
    }
    if level > 10 {
        pool.extend([UnitType::Golem, UnitType::Dragon]);
    }
    pool
}

// =============================================================================
// Level content
// =============================================================================

/// One enemy in a level.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Archetype
    pub unit_type: UnitType,
    /// Merge level
    pub level: u32,
    /// Cell in the enemy half
    pub cell: GridCell,
}

/// Enemy roster of a level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Level number this roster was produced for
    pub level: u32,
    /// Enemies to spawn, in spawn order
    pub enemies: Vec<EnemySpawn>,
}

/// Errors a level generator can report.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The content source could not produce a level
    #[error("level content unavailable: {0}")]
    Unavailable(String),
}

/// Source of enemy rosters.
pub trait LevelGenerator: Send {
    /// Produces the roster for `level` at `difficulty`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] if no roster can be produced. The session
    /// leaves its state untouched in that case.
    fn generate(&mut self, level: u32, difficulty: Difficulty) -> Result<LevelConfig, GenerationError>;
}

/// Seeded procedural roster generator.
///
/// # Example
///
/// ```
/// use mergewar_core::level::{Difficulty, LevelGenerator, ProceduralGenerator};
///
/// let mut generator = ProceduralGenerator::new(42);
/// let config = generator.generate(1, Difficulty::Normal).unwrap();
/// assert_eq!(config.enemies.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ProceduralGenerator {
    rng: ChaCha8Rng,
}

impl ProceduralGenerator {
    /// Creates a generator from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn random_enemy_cell(&mut self) -> GridCell {
        GridCell::new(
            self.rng.gen_range(0..GRID_COLS),
            self.rng.gen_range(0..=ENEMY_LAST_ROW),
        )
    }
}

impl LevelGenerator for ProceduralGenerator {
    fn generate(&mut self, level: u32, difficulty: Difficulty) -> Result<LevelConfig, GenerationError> {
        let pool = enemy_pool(level);
        let count = difficulty.enemy_count(level);
        let unit_level = difficulty.enemy_unit_level(level);

        let mut occupied = BTreeSet::new();
        let mut enemies = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let cell = (0..MAX_PLACEMENT_ATTEMPTS)
                .map(|_| self.random_enemy_cell())
                .find(|cell| !occupied.contains(cell));
            let Some(cell) = cell else {
                continue;
            };
            occupied.insert(cell);

            let unit_type = *pool
                .choose(&mut self.rng)
                .ok_or_else(|| GenerationError::Unavailable("empty enemy pool".into()))?;
            enemies.push(EnemySpawn {
                unit_type,
                level: unit_level,
                cell,
            });
        }

        debug!(level, %difficulty, enemies = enemies.len(), "generated level");
        Ok(LevelConfig { level, enemies })
    }
}
