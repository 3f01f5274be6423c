//! Synthesis of top-tier units from two high-level ingredients.
//!
//! Synthesis is split in two. [`plan`] finds the ingredients on the board
//! without touching anything; [`commit`] re-validates them and swaps them for
//! the result. The caller charges the price between the two, so a plan whose
//! ingredients disappeared before commit costs the price and leaves the roster
//! unchanged.

use serde::Serialize;

use crate::archetype::UnitType;
use crate::arena::Arena;
use crate::entity::{Entity, EntityId, Side};
use crate::error::{GameError, Result};
use crate::grid::GridCell;
use crate::stats::StatContext;

/// A fixed synthesis recipe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Recipe {
    /// Stable identifier
    pub id: &'static str,
    /// Unit produced
    pub result: UnitType,
    /// The two ingredient types, in search order
    pub ingredients: [UnitType; 2],
}

/// Every recipe in the game.
pub const RECIPES: [Recipe; 3] = [
    Recipe {
        id: "paladin",
        result: UnitType::Paladin,
        ingredients: [UnitType::Infantry, UnitType::Tank],
    },
    Recipe {
        id: "sniper",
        result: UnitType::Sniper,
        ingredients: [UnitType::Archer, UnitType::Spearman],
    },
    Recipe {
        id: "void_walker",
        result: UnitType::VoidWalker,
        ingredients: [UnitType::Mage, UnitType::Golem],
    },
];

/// Looks up a recipe by id.
///
/// # Errors
///
/// Returns [`GameError::UnknownId`] if no recipe has this id.
pub fn recipe(id: &str) -> Result<&'static Recipe> {
    RECIPES
        .iter()
        .find(|r| r.id == id)
        .ok_or_else(|| GameError::UnknownId(id.to_owned()))
}

/// Ingredients chosen for one synthesis.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SynthesisPlan {
    /// Recipe being made
    pub recipe: &'static Recipe,
    /// First ingredient; the result lands on its cell
    pub first: EntityId,
    /// Second ingredient
    pub second: EntityId,
    /// Where the result will stand
    pub cell: GridCell,
}

fn find_ingredient(
    arena: &Arena,
    unit_type: UnitType,
    min_level: u32,
    exclude: Option<EntityId>,
) -> Option<&Entity> {
    arena.by_side(Side::Player).find(|e| {
        e.unit_type() == unit_type && e.level() >= min_level && Some(e.id()) != exclude
    })
}

/// Picks the first matching player unit for each ingredient.
///
/// # Errors
///
/// Returns [`GameError::MissingIngredients`] if either is absent.
pub fn plan(arena: &Arena, recipe: &'static Recipe, min_level: u32) -> Result<SynthesisPlan> {
    let missing = GameError::MissingIngredients { min_level };
    let [first_type, second_type] = recipe.ingredients;

    let Some(first) = find_ingredient(arena, first_type, min_level, None) else {
        return Err(missing);
    };
    let Some(second) = find_ingredient(arena, second_type, min_level, Some(first.id())) else {
        return Err(missing);
    };

    Ok(SynthesisPlan {
        recipe,
        first: first.id(),
        second: second.id(),
        cell: first.cell(),
    })
}

/// Replaces the planned ingredients with a level 1 result unit.
///
/// # Errors
///
/// Returns [`GameError::MissingIngredients`] if either ingredient is gone;
/// the arena is unchanged in that case.
pub fn commit(
    arena: &mut Arena,
    plan: &SynthesisPlan,
    ctx: &StatContext,
    min_level: u32,
) -> Result<EntityId> {
    arena.transaction(|next| {
        if next.get(plan.first).is_none() || next.get(plan.second).is_none() {
            return Err(GameError::MissingIngredients { min_level });
        }
        next.despawn(plan.first);
        next.despawn(plan.second);
        Ok(next.spawn_unit(plan.recipe.result, 1, Side::Player, plan.cell, ctx))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn(arena: &mut Arena, unit_type: UnitType, level: u32, x: i32, y: i32) -> EntityId {
        arena.spawn_unit(unit_type, level, Side::Player, GridCell::new(x, y), &StatContext::default())
    }

    #[test]
    fn recipes_resolve_by_id() {
        assert_eq!(recipe("sniper").unwrap().result, UnitType::Sniper);
        assert!(matches!(recipe("lich"), Err(GameError::UnknownId(_))));
    }

    #[test]
    fn plan_picks_first_qualifying_units() {
        let mut arena = Arena::new();
        let _weak = spawn(&mut arena, UnitType::Infantry, 2, 0, 7);
        let inf = spawn(&mut arena, UnitType::Infantry, 3, 1, 7);
        let tank = spawn(&mut arena, UnitType::Tank, 4, 2, 7);

        let plan = plan(&arena, recipe("paladin").unwrap(), 3).unwrap();
        assert_eq!(plan.first, inf);
        assert_eq!(plan.second, tank);
        assert_eq!(plan.cell, GridCell::new(1, 7));
    }

    #[test]
    fn plan_without_ingredients_fails() {
        let mut arena = Arena::new();
        spawn(&mut arena, UnitType::Infantry, 3, 0, 7);
        spawn(&mut arena, UnitType::Tank, 2, 1, 7);

        let err = plan(&arena, recipe("paladin").unwrap(), 3).unwrap_err();
        assert!(matches!(err, GameError::MissingIngredients { min_level: 3 }));
    }

    #[test]
    fn enemy_units_are_not_ingredients() {
        let mut arena = Arena::new();
        spawn(&mut arena, UnitType::Mage, 3, 0, 7);
        arena.spawn_unit(UnitType::Golem, 5, Side::Enemy, GridCell::new(0, 0), &StatContext::default());

        assert!(plan(&arena, recipe("void_walker").unwrap(), 3).is_err());
    }

    #[test]
    fn commit_swaps_ingredients_for_result() {
        let mut arena = Arena::new();
        let a = spawn(&mut arena, UnitType::Archer, 3, 4, 6);
        let b = spawn(&mut arena, UnitType::Spearman, 3, 0, 7);
        let plan = plan(&arena, recipe("sniper").unwrap(), 3).unwrap();

        let id = commit(&mut arena, &plan, &StatContext::default(), 3).unwrap();

        assert!(arena.get(a).is_none());
        assert!(arena.get(b).is_none());
        let sniper = arena.get(id).unwrap();
        assert_eq!(sniper.unit_type(), UnitType::Sniper);
        assert_eq!(sniper.level(), 1);
        assert_eq!(sniper.cell(), GridCell::new(4, 6));
        assert_eq!(sniper.hp(), 350);
    }

    #[test]
    fn commit_after_ingredient_vanished_changes_nothing() {
        let mut arena = Arena::new();
        spawn(&mut arena, UnitType::Archer, 3, 4, 6);
        let b = spawn(&mut arena, UnitType::Spearman, 3, 0, 7);
        let plan = plan(&arena, recipe("sniper").unwrap(), 3).unwrap();
        arena.despawn(b);

        let err = commit(&mut arena, &plan, &StatContext::default(), 3).unwrap_err();
        assert!(matches!(err, GameError::MissingIngredients { .. }));
        assert_eq!(arena.entity_count(), 1);
    }
}
