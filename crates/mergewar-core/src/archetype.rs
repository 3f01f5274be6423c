//! Unit archetypes: the immutable base combat profile of every unit type.
//!
//! Archetypes are process-wide constants. Every [`UnitType`] maps to exactly
//! one [`Archetype`] through an exhaustive table, so an unknown archetype
//! cannot be represented.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Rarity rank of a unit type. Controls base power and acquisition cost.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitTier {
    /// Cheapest, weakest rank
    Common,
    /// Second rank
    Rare,
    /// Third rank
    Epic,
    /// Highest rank obtainable from recruitment
    Legendary,
    /// Top rank, obtainable only through synthesis
    Mythic,
}

impl UnitTier {
    /// All tiers from lowest to highest.
    pub const ALL: [Self; 5] = [
        Self::Common,
        Self::Rare,
        Self::Epic,
        Self::Legendary,
        Self::Mythic,
    ];

    /// Multiplier applied to the base recruit cost for units of this tier.
    #[must_use]
    pub const fn cost_multiplier(self) -> f64 {
        match self {
            Self::Common => 1.0,
            Self::Rare => 3.0,
            Self::Epic => 8.0,
            Self::Legendary => 20.0,
            Self::Mythic => 50.0,
        }
    }

    /// Returns `true` for the top rank, which uses the shared mastery track.
    #[must_use]
    pub const fn is_top(self) -> bool {
        matches!(self, Self::Mythic)
    }
}

/// Static combat profile for a unit type at level 1 with no upgrades.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Archetype {
    /// Rarity rank
    pub tier: UnitTier,
    /// Base hit points
    pub hp: f64,
    /// Base damage per hit
    pub damage: f64,
    /// Attacks per second
    pub attack_rate: f64,
    /// Attack range in grid units
    pub range: f32,
    /// Movement speed in grid units per second
    pub move_speed: f64,
    /// Display name
    pub name: &'static str,
    /// Display icon
    pub icon: &'static str,
}

/// Unit type identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UnitType {
    /// Common melee
    Infantry,
    /// Common ranged
    Archer,
    /// Rare tank
    Tank,
    /// Rare reach melee
    Spearman,
    /// Epic long-range caster
    Mage,
    /// Epic fast melee
    Assassin,
    /// Legendary bruiser
    Golem,
    /// Legendary mid-range
    Dragon,
    /// Mythic melee
    Paladin,
    /// Mythic extreme range
    Sniper,
    /// Mythic mid-range
    VoidWalker,
}

static ARCHETYPES: [Archetype; UnitType::COUNT] = [
    Archetype {
        tier: UnitTier::Common,
        hp: 120.0,
        damage: 15.0,
        attack_rate: 1.2,
        range: 1.2,
        move_speed: 2.5,
        name: "Infantry",
        icon: "⚔️",
    },
    Archetype {
        tier: UnitTier::Common,
        hp: 80.0,
        damage: 25.0,
        attack_rate: 1.0,
        range: 5.5,
        move_speed: 2.2,
        name: "Archer",
        icon: "🏹",
    },
    Archetype {
        tier: UnitTier::Rare,
        hp: 300.0,
        damage: 12.0,
        attack_rate: 0.8,
        range: 1.2,
        move_speed: 1.8,
        name: "Tank",
        icon: "🛡️",
    },
    Archetype {
        tier: UnitTier::Rare,
        hp: 150.0,
        damage: 22.0,
        attack_rate: 1.1,
        range: 2.5,
        move_speed: 2.3,
        name: "Spearman",
        icon: "🔱",
    },
    Archetype {
        tier: UnitTier::Epic,
        hp: 90.0,
        damage: 45.0,
        attack_rate: 0.7,
        range: 6.0,
        move_speed: 2.0,
        name: "Mage",
        icon: "🧙",
    },
    Archetype {
        tier: UnitTier::Epic,
        hp: 140.0,
        damage: 40.0,
        attack_rate: 2.0,
        range: 1.2,
        move_speed: 3.5,
        name: "Assassin",
        icon: "🥷",
    },
    Archetype {
        tier: UnitTier::Legendary,
        hp: 600.0,
        damage: 25.0,
        attack_rate: 0.6,
        range: 1.2,
        move_speed: 1.5,
        name: "Golem",
        icon: "🗿",
    },
    Archetype {
        tier: UnitTier::Legendary,
        hp: 400.0,
        damage: 70.0,
        attack_rate: 0.9,
        range: 3.5,
        move_speed: 2.5,
        name: "Dragon",
        icon: "🐉",
    },
    Archetype {
        tier: UnitTier::Mythic,
        hp: 2000.0,
        damage: 100.0,
        attack_rate: 1.0,
        range: 1.2,
        move_speed: 2.0,
        name: "Paladin",
        icon: "⚜️",
    },
    Archetype {
        tier: UnitTier::Mythic,
        hp: 350.0,
        damage: 400.0,
        attack_rate: 0.6,
        range: 8.0,
        move_speed: 1.5,
        name: "Sniper",
        icon: "🎯",
    },
    Archetype {
        tier: UnitTier::Mythic,
        hp: 1000.0,
        damage: 150.0,
        attack_rate: 1.6,
        range: 3.0,
        move_speed: 2.5,
        name: "Void Walker",
        icon: "👾",
    },
];

impl UnitType {
    /// Number of unit types.
    pub const COUNT: usize = 11;

    /// All unit types in table order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Infantry,
        Self::Archer,
        Self::Tank,
        Self::Spearman,
        Self::Mage,
        Self::Assassin,
        Self::Golem,
        Self::Dragon,
        Self::Paladin,
        Self::Sniper,
        Self::VoidWalker,
    ];

    /// Returns the immutable base profile for this type.
    #[must_use]
    pub fn archetype(self) -> &'static Archetype {
        &ARCHETYPES[self.index()]
    }

    /// Returns this type's rarity rank.
    #[must_use]
    pub fn tier(self) -> UnitTier {
        self.archetype().tier
    }

    /// Dense index into per-type tables.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Iterates over every type of the given tier, in table order.
    pub fn of_tier(tier: UnitTier) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |t| t.tier() == tier)
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.archetype().name)
    }
}
