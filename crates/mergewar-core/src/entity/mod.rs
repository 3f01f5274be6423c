//! Battle participants.
//!
//! - [`EntityId`]: Unique identifier for entities
//! - [`Side`]: Owning side
//! - [`Entity`]: A unit on the grid, with its continuous battle state
//!
//! # Example
//!
//! ```
//! use mergewar_core::archetype::UnitType;
//! use mergewar_core::entity::{Entity, EntityId, Side, UnitState};
//! use mergewar_core::grid::GridCell;
//! use mergewar_core::stats::ArtifactLevels;
//!
//! let archer = Entity::create(
//!     EntityId::new(1),
//!     UnitType::Archer,
//!     1,
//!     Side::Player,
//!     GridCell::new(0, 7),
//!     1,
//!     &ArtifactLevels::default(),
//! );
//!
//! assert_eq!(archer.hp(), 80);
//! assert_eq!(archer.state(), UnitState::Idle);
//! assert!(archer.transform.facing_right);
//! ```

pub mod components;

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::archetype::UnitType;
use crate::grid::GridCell;
use crate::stats::{derive_stats, ArtifactLevels, DerivedStats, StatContext};

pub use components::{CombatState, Transform, UnitState};

/// Unique identifier for an entity.
///
/// Ids are assigned monotonically by the [`Arena`](crate::arena::Arena) and
/// never reused, so ordering by id is ordering by creation.
///
/// # Example
///
/// ```
/// use mergewar_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    ///
    /// # Arguments
    ///
    /// * `id` - The raw identifier value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Owning side of an entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The player's units, lower half of the grid
    Player,
    /// Generated enemies, upper half of the grid
    Enemy,
}

impl Side {
    /// The side this one fights.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Enemy => write!(f, "Enemy"),
        }
    }
}

/// A unit in the arena.
///
/// # Invariants
///
/// - The `EntityId` is unique within an arena
/// - An entity with `hp <= 0` is dead regardless of its stored state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    unit_type: UnitType,
    side: Side,
    level: u32,
    cell: GridCell,
    /// Continuous position and facing
    pub transform: Transform,
    /// Hit points, target and attack timing
    pub combat: CombatState,
}

impl Entity {
    /// Creates a full-health entity standing on `cell`.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier
    /// * `unit_type` - Archetype
    /// * `level` - Merge level, at least 1
    /// * `side` - Owning side; player units face right
    /// * `cell` - Grid cell; the continuous position starts there
    /// * `tech_level` - Tech level that applies to this type
    /// * `artifacts` - Artifact levels of the owning side
    #[must_use]
    pub fn create(
        id: EntityId,
        unit_type: UnitType,
        level: u32,
        side: Side,
        cell: GridCell,
        tech_level: u32,
        artifacts: &ArtifactLevels,
    ) -> Self {
        let stats = derive_stats(unit_type, level, tech_level, artifacts);
        Self {
            id,
            unit_type,
            side,
            level: level.max(1),
            cell,
            transform: Transform::new(cell.to_position(), side == Side::Player),
            combat: CombatState::full(stats.hp),
        }
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the archetype.
    #[must_use]
    pub const fn unit_type(&self) -> UnitType {
        self.unit_type
    }

    /// Returns the owning side.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Returns the merge level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Returns the grid cell.
    #[must_use]
    pub const fn cell(&self) -> GridCell {
        self.cell
    }

    /// Returns the continuous position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.transform.position
    }

    /// Returns current hit points.
    #[must_use]
    pub const fn hp(&self) -> i64 {
        self.combat.hp
    }

    /// Returns the behaviour state.
    #[must_use]
    pub const fn state(&self) -> UnitState {
        self.combat.state
    }

    /// Returns `true` while hit points are above zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.combat.hp > 0
    }

    /// Creates an entity scaled by a side's whole [`StatContext`].
    #[must_use]
    pub fn from_context(
        id: EntityId,
        unit_type: UnitType,
        level: u32,
        side: Side,
        cell: GridCell,
        ctx: &StatContext,
    ) -> Self {
        Self::create(
            id,
            unit_type,
            level,
            side,
            cell,
            ctx.tech.level_for(unit_type),
            &ctx.artifacts,
        )
    }

    /// Derives this entity's current stats from its side's context.
    #[must_use]
    pub fn stats(&self, ctx: &StatContext) -> DerivedStats {
        ctx.derive(self.unit_type, self.level)
    }

    /// Places the entity on `cell`, snapping the continuous position to it.
    pub fn set_cell(&mut self, cell: GridCell) {
        self.cell = cell;
        self.transform.position = cell.to_position();
    }

    /// Readies the entity for a new battle: back on its cell at full health
    /// with current stats, no target, idle.
    pub fn reset_for_battle(&mut self, ctx: &StatContext) {
        let stats = self.stats(ctx);
        self.transform = Transform::new(self.cell.to_position(), self.side == Side::Player);
        self.combat = CombatState::full(stats.hp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TechBook;

    mod entity_id_tests {
        use super::*;

        #[test]
        fn ordering() {
            assert!(EntityId::new(1) < EntityId::new(2));
            assert_eq!(EntityId::new(7).as_u64(), 7);
        }

        #[test]
        fn debug_and_display_format() {
            let id = EntityId::new(42);
            assert_eq!(format!("{id:?}"), "EntityId(42)");
            assert_eq!(format!("{id}"), "42");
        }

        #[test]
        fn conversions() {
            let id: EntityId = 5u64.into();
            let raw: u64 = id.into();
            assert_eq!(raw, 5);
        }
    }

    mod side_tests {
        use super::*;

        #[test]
        fn opponent_is_symmetric() {
            assert_eq!(Side::Player.opponent(), Side::Enemy);
            assert_eq!(Side::Enemy.opponent(), Side::Player);
        }
    }

    mod entity_tests {
        use super::*;

        #[test]
        fn create_uses_derived_hp() {
            let mut tech = TechBook::default();
            tech.raise_unit(UnitType::Tank);
            let ctx = StatContext::new(tech, ArtifactLevels::default());

            let tank = Entity::from_context(
                EntityId::new(3),
                UnitType::Tank,
                2,
                Side::Player,
                GridCell::new(1, 6),
                &ctx,
            );

            let expected = ctx.derive(UnitType::Tank, 2).hp;
            assert_eq!(tank.hp(), expected);
            assert_eq!(tank.combat.max_hp, expected);
            assert_eq!(tank.position(), Vec2::new(1.0, 6.0));
        }

        #[test]
        fn enemies_face_left() {
            let enemy = Entity::create(
                EntityId::new(1),
                UnitType::Infantry,
                1,
                Side::Enemy,
                GridCell::new(3, 0),
                1,
                &ArtifactLevels::default(),
            );
            assert!(!enemy.transform.facing_right);
        }

        #[test]
        fn zero_hp_is_dead() {
            let mut unit = Entity::create(
                EntityId::new(1),
                UnitType::Infantry,
                1,
                Side::Player,
                GridCell::new(0, 7),
                1,
                &ArtifactLevels::default(),
            );
            unit.combat.hp = 0;
            assert!(!unit.is_alive());
            unit.combat.hp = -15;
            assert!(!unit.is_alive());
        }

        #[test]
        fn reset_for_battle_restores_everything() {
            let ctx = StatContext::default();
            let mut unit = Entity::from_context(
                EntityId::new(1),
                UnitType::Archer,
                1,
                Side::Player,
                GridCell::new(2, 5),
                &ctx,
            );
            unit.transform.position = Vec2::new(2.7, 1.3);
            unit.transform.facing_right = false;
            unit.combat.hp = -4;
            unit.combat.state = UnitState::Dead;
            unit.combat.target = Some(EntityId::new(9));
            unit.combat.last_attack_ms = Some(1234.0);

            unit.reset_for_battle(&ctx);

            assert_eq!(unit.position(), Vec2::new(2.0, 5.0));
            assert_eq!(unit.hp(), 80);
            assert_eq!(unit.state(), UnitState::Idle);
            assert!(unit.combat.target.is_none());
            assert!(unit.combat.last_attack_ms.is_none());
            assert!(unit.transform.facing_right);
        }
    }
}
