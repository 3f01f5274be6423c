//! Recruit draws.
//!
//! A draw first rolls a tier from a [`TierTable`], then picks a unit type
//! uniformly within that tier. The tables are pure functions of the luck
//! level, so the same roll always lands on the same tier.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::archetype::{UnitTier, UnitType};

/// Cumulative-threshold sampler over unit tiers.
///
/// Entries are checked from the top of the unit range downward: the first
/// entry owns rolls in `(1 - p, 1]`, the second the next `p` below that, and
/// so on. Whatever is left goes to the fallback tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierTable {
    entries: Vec<(UnitTier, f64)>,
    fallback: UnitTier,
}

impl TierTable {
    /// Builds a table from `(tier, probability)` pairs, best tier first.
    #[must_use]
    pub fn new(entries: Vec<(UnitTier, f64)>, fallback: UnitTier) -> Self {
        Self { entries, fallback }
    }

    /// Table for the basic random recruit.
    ///
    /// At luck 1: Legendary 1%, Epic 9%, Rare 30%, Common the rest. Each
    /// further luck level adds 0.5%, 1% and 2% respectively.
    #[must_use]
    pub fn random(luck_level: u32) -> Self {
        let luck = f64::from(luck_level.saturating_sub(1));
        Self::new(
            vec![
                (UnitTier::Legendary, 0.01 + luck * 0.005),
                (UnitTier::Epic, 0.09 + luck * 0.01),
                (UnitTier::Rare, 0.30 + luck * 0.02),
            ],
            UnitTier::Common,
        )
    }

    /// Table for the premium recruit: never Common.
    ///
    /// At luck 1: Legendary 10%, Epic 40%, Rare the rest. Each further luck
    /// level adds 1% and 2%.
    #[must_use]
    pub fn premium(luck_level: u32) -> Self {
        let luck = f64::from(luck_level.saturating_sub(1));
        Self::new(
            vec![
                (UnitTier::Legendary, 0.10 + luck * 0.01),
                (UnitTier::Epic, 0.40 + luck * 0.02),
            ],
            UnitTier::Rare,
        )
    }

    /// Probability of landing on `tier`.
    #[must_use]
    pub fn probability(&self, tier: UnitTier) -> f64 {
        if tier == self.fallback {
            let listed: f64 = self.entries.iter().map(|(_, p)| p).sum();
            return (1.0 - listed).max(0.0);
        }
        self.entries
            .iter()
            .filter(|(t, _)| *t == tier)
            .map(|(_, p)| p)
            .sum()
    }

    /// Maps a roll in `[0, 1)` to a tier.
    #[must_use]
    pub fn tier_for_roll(&self, roll: f64) -> UnitTier {
        let mut threshold = 1.0;
        for (tier, p) in &self.entries {
            threshold -= p;
            if roll > threshold {
                return *tier;
            }
        }
        self.fallback
    }

    /// Draws a unit type.
    pub fn draw(&self, rng: &mut impl Rng) -> UnitType {
        let tier = self.tier_for_roll(rng.gen::<f64>());
        let candidates: Vec<UnitType> = UnitType::of_tier(tier).collect();
        candidates
            .choose(rng)
            .copied()
            .unwrap_or(UnitType::Infantry)
    }
}
