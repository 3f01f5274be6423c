//! Placement and merge resolution for the preparation phase.
//!
//! Dropping a player unit on a cell of the player half does one of three
//! things:
//!
//! - **Move**: the cell is empty, so the unit relocates there
//! - **Merge**: the cell holds a unit of the same type and level, so both are
//!   replaced by a single unit one level higher
//! - **Swap**: the cell holds any other unit, so the two trade places
//!
//! Every change runs inside [`Arena::transaction`], so a rejected drop never
//! leaves a partial edit behind.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::arena::Arena;
use crate::entity::{EntityId, Side};
use crate::error::{GameError, Result};
use crate::grid::GridCell;
use crate::stats::StatContext;

/// What a successful drop did.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementOutcome {
    /// Relocated onto an empty cell
    Moved,
    /// Traded places with another unit
    Swapped {
        /// The unit that was displaced
        other: EntityId,
    },
    /// Combined with an identical unit
    Merged {
        /// The new, higher level unit
        new_id: EntityId,
    },
}

impl PlacementOutcome {
    /// Returns `true` for a merge.
    #[must_use]
    pub const fn is_merge(self) -> bool {
        matches!(self, Self::Merged { .. })
    }
}

/// Drops `moving` onto `target`.
///
/// # Errors
///
/// - [`GameError::OutOfBounds`] if `target` is off the grid
/// - [`GameError::EnemyTerritory`] if `target` lies in the enemy half
/// - [`GameError::EntityNotFound`] if `moving` is unknown or dead
/// - [`GameError::NotPlayerOwned`] if `moving` is an enemy
///
/// The arena is unchanged on error.
pub fn resolve_placement(
    arena: &mut Arena,
    moving: EntityId,
    target: GridCell,
    ctx: &StatContext,
) -> Result<PlacementOutcome> {
    if !target.in_bounds() {
        return Err(GameError::OutOfBounds(target));
    }
    if target.is_enemy_half() {
        return Err(GameError::EnemyTerritory(target));
    }

    arena.transaction(|next| {
        let me = next.get_alive(moving).ok_or(GameError::EntityNotFound(moving))?;
        if me.side() != Side::Player {
            return Err(GameError::NotPlayerOwned(moving));
        }
        let (unit_type, level, origin) = (me.unit_type(), me.level(), me.cell());

        let occupant = next
            .occupant_at(target)
            .filter(|id| *id != moving)
            .and_then(|id| next.get(id))
            .map(|e| (e.id(), e.unit_type(), e.level()));

        let outcome = match occupant {
            None => {
                next.move_to_cell(moving, target);
                PlacementOutcome::Moved
            }
            Some((other, other_type, other_level))
                if other_type == unit_type && other_level == level =>
            {
                next.despawn(moving);
                next.despawn(other);
                let new_id = next.spawn_unit(unit_type, level + 1, Side::Player, target, ctx);
                PlacementOutcome::Merged { new_id }
            }
            Some((other, _, _)) => {
                next.move_to_cell(moving, target);
                next.move_to_cell(other, origin);
                PlacementOutcome::Swapped { other }
            }
        };

        debug!(unit = %moving, cell = %target, ?outcome, "placement resolved");
        Ok(outcome)
    })
}

// =============================================================================
// Drag gestures
// =============================================================================

/// How a pointer drag should be interpreted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GestureKind {
    /// Too short to be a move; only selects the unit
    Select,
    /// A real drop onto whatever cell lies under the pointer
    Drop,
}

/// A pointer drag of one unit, in screen pixels.
///
/// Translating screen coordinates into a grid cell is the caller's job; the
/// gesture only decides whether the drag counts as a move at all.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DragGesture {
    /// Unit under the pointer when the drag began
    pub unit: EntityId,
    /// Pointer position at press
    pub start: Vec2,
    /// Pointer position at release
    pub end: Vec2,
}

impl DragGesture {
    /// Creates a gesture.
    #[must_use]
    pub const fn new(unit: EntityId, start: Vec2, end: Vec2) -> Self {
        Self { unit, start, end }
    }

    /// Pointer travel in pixels.
    #[must_use]
    pub fn travel(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Drags shorter than `threshold_px` are selections.
    #[must_use]
    pub fn classify(&self, threshold_px: f32) -> GestureKind {
        if self.travel() < threshold_px {
            GestureKind::Select
        } else {
            GestureKind::Drop
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::UnitType;

    fn ctx() -> StatContext {
        StatContext::default()
    }

    fn spawn(arena: &mut Arena, unit_type: UnitType, level: u32, x: i32, y: i32) -> EntityId {
        arena.spawn_unit(unit_type, level, Side::Player, GridCell::new(x, y), &ctx())
    }

    mod move_tests {
        use super::*;

        #[test]
        fn empty_cell_relocates() {
            let mut arena = Arena::new();
            let id = spawn(&mut arena, UnitType::Archer, 1, 0, 7);

            let outcome = resolve_placement(&mut arena, id, GridCell::new(4, 5), &ctx()).unwrap();

            assert_eq!(outcome, PlacementOutcome::Moved);
            let unit = arena.get(id).unwrap();
            assert_eq!(unit.cell(), GridCell::new(4, 5));
            assert_eq!(unit.position(), Vec2::new(4.0, 5.0));
            assert_eq!(arena.spatial().get(id), Some(Vec2::new(4.0, 5.0)));
        }

        #[test]
        fn own_cell_is_a_no_op_move() {
            let mut arena = Arena::new();
            let id = spawn(&mut arena, UnitType::Archer, 1, 2, 6);

            let outcome = resolve_placement(&mut arena, id, GridCell::new(2, 6), &ctx()).unwrap();

            assert_eq!(outcome, PlacementOutcome::Moved);
            assert_eq!(arena.get(id).unwrap().cell(), GridCell::new(2, 6));
        }
    }

    mod merge_tests {
        use super::*;

        #[test]
        fn identical_units_merge_on_target_cell() {
            let mut arena = Arena::new();
            let a = spawn(&mut arena, UnitType::Infantry, 1, 0, 7);
            let b = spawn(&mut arena, UnitType::Infantry, 1, 1, 7);

            let outcome = resolve_placement(&mut arena, a, GridCell::new(1, 7), &ctx()).unwrap();

            let PlacementOutcome::Merged { new_id } = outcome else {
                panic!("expected merge, got {outcome:?}");
            };
            assert!(arena.get(a).is_none());
            assert!(arena.get(b).is_none());
            let merged = arena.get(new_id).unwrap();
            assert_eq!(merged.level(), 2);
            assert_eq!(merged.cell(), GridCell::new(1, 7));
            // floor(120 * 1.8)
            assert_eq!(merged.hp(), 216);
            assert_eq!(merged.combat.max_hp, 216);
            assert_eq!(arena.entity_count(), 1);
        }

        #[test]
        fn merge_uses_current_tech() {
            let mut arena = Arena::new();
            let a = spawn(&mut arena, UnitType::Tank, 2, 3, 5);
            let _b = spawn(&mut arena, UnitType::Tank, 2, 3, 6);
            let mut upgraded = ctx();
            upgraded.tech.raise_unit(UnitType::Tank);

            let outcome = resolve_placement(&mut arena, a, GridCell::new(3, 6), &upgraded).unwrap();

            let PlacementOutcome::Merged { new_id } = outcome else {
                panic!("expected merge");
            };
            assert_eq!(
                arena.get(new_id).unwrap().hp(),
                upgraded.derive(UnitType::Tank, 3).hp
            );
        }

        #[test]
        fn different_level_does_not_merge() {
            let mut arena = Arena::new();
            let a = spawn(&mut arena, UnitType::Infantry, 1, 0, 7);
            let b = spawn(&mut arena, UnitType::Infantry, 2, 1, 7);

            let outcome = resolve_placement(&mut arena, a, GridCell::new(1, 7), &ctx()).unwrap();

            assert_eq!(outcome, PlacementOutcome::Swapped { other: b });
        }
    }

    mod swap_tests {
        use super::*;

        #[test]
        fn different_types_trade_places() {
            let mut arena = Arena::new();
            let a = spawn(&mut arena, UnitType::Archer, 1, 0, 7);
            let b = spawn(&mut arena, UnitType::Tank, 1, 5, 4);
            let hp_before = (arena.get(a).unwrap().hp(), arena.get(b).unwrap().hp());

            let outcome = resolve_placement(&mut arena, a, GridCell::new(5, 4), &ctx()).unwrap();

            assert_eq!(outcome, PlacementOutcome::Swapped { other: b });
            assert_eq!(arena.get(a).unwrap().cell(), GridCell::new(5, 4));
            assert_eq!(arena.get(b).unwrap().cell(), GridCell::new(0, 7));
            assert_eq!(arena.get(b).unwrap().position(), Vec2::new(0.0, 7.0));
            assert_eq!(
                (arena.get(a).unwrap().hp(), arena.get(b).unwrap().hp()),
                hp_before
            );
        }
    }

    mod rejection_tests {
        use super::*;

        #[test]
        fn enemy_half_is_rejected_without_change() {
            let mut arena = Arena::new();
            let id = spawn(&mut arena, UnitType::Archer, 1, 0, 7);
            let before = arena.get(id).cloned();

            let err = resolve_placement(&mut arena, id, GridCell::new(0, 3), &ctx()).unwrap_err();

            assert!(matches!(err, GameError::EnemyTerritory(_)));
            assert_eq!(arena.get(id).cloned(), before);
        }

        #[test]
        fn off_grid_is_rejected() {
            let mut arena = Arena::new();
            let id = spawn(&mut arena, UnitType::Archer, 1, 0, 7);

            let err = resolve_placement(&mut arena, id, GridCell::new(7, 5), &ctx()).unwrap_err();
            assert!(matches!(err, GameError::OutOfBounds(_)));
        }

        #[test]
        fn unknown_and_enemy_units_are_rejected() {
            let mut arena = Arena::new();
            let enemy = arena.spawn_unit(UnitType::Archer, 1, Side::Enemy, GridCell::new(0, 0), &ctx());

            let err = resolve_placement(&mut arena, EntityId::new(99), GridCell::new(0, 7), &ctx())
                .unwrap_err();
            assert!(matches!(err, GameError::EntityNotFound(_)));

            let err = resolve_placement(&mut arena, enemy, GridCell::new(0, 7), &ctx()).unwrap_err();
            assert!(matches!(err, GameError::NotPlayerOwned(_)));
            assert_eq!(arena.get(enemy).unwrap().cell(), GridCell::new(0, 0));
        }
    }

    mod gesture_tests {
        use super::*;

        #[test]
        fn short_drag_is_a_selection() {
            let gesture = DragGesture::new(EntityId::new(0), Vec2::new(100.0, 100.0), Vec2::new(106.0, 107.0));
            assert_eq!(gesture.classify(10.0), GestureKind::Select);
        }

        #[test]
        fn threshold_distance_is_a_drop() {
            let gesture = DragGesture::new(EntityId::new(0), Vec2::ZERO, Vec2::new(6.0, 8.0));
            assert_eq!(gesture.classify(10.0), GestureKind::Drop);
        }
    }
}
