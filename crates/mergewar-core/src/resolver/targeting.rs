//! Target acquisition.

use crate::arena::Arena;
use crate::entity::{Entity, EntityId};
use crate::event::{BattleEvent, EventLog};

/// Straight-line distance between two entities in continuous coordinates.
#[must_use]
pub fn distance(a: &Entity, b: &Entity) -> f32 {
    a.position().distance(b.position())
}

/// Nearest living opponent of `unit`.
///
/// Candidates are visited in id order and only a strictly closer one
/// replaces the current best, so the first found wins ties.
#[must_use]
pub fn nearest_opponent(arena: &Arena, unit: &Entity) -> Option<EntityId> {
    let origin = unit.position();
    let mut best: Option<(EntityId, f32)> = None;
    for other in arena.living(unit.side().opponent()) {
        let d = origin.distance(other.position());
        if best.map_or(true, |(_, best_d)| d < best_d) {
            best = Some((other.id(), d));
        }
    }
    best.map(|(id, _)| id)
}

/// Keeps `unit`'s target if it is still alive, otherwise picks the nearest
/// living opponent and stores it.
///
/// Returns the target to use this tick, or `None` (target cleared) when no
/// opponent is left.
pub fn acquire(arena: &mut Arena, unit: EntityId, log: &mut EventLog) -> Option<EntityId> {
    let entity = arena.get(unit)?;
    if let Some(current) = entity.combat.target {
        if arena.get_alive(current).is_some() {
            return Some(current);
        }
    }

    let found = nearest_opponent(arena, entity);
    if let Some(entity) = arena.get_mut(unit) {
        entity.combat.target = found;
    }
    if let Some(target) = found {
        log.record(BattleEvent::TargetAcquired { unit, target });
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetype::UnitType;
    use crate::entity::Side;
    use crate::grid::GridCell;
    use crate::stats::StatContext;

    fn spawn(arena: &mut Arena, side: Side, x: i32, y: i32) -> EntityId {
        arena.spawn_unit(UnitType::Infantry, 1, side, GridCell::new(x, y), &StatContext::default())
    }

    #[test]
    fn picks_closest_opponent() {
        let mut arena = Arena::new();
        let me = spawn(&mut arena, Side::Player, 3, 7);
        let _far = spawn(&mut arena, Side::Enemy, 0, 0);
        let near = spawn(&mut arena, Side::Enemy, 3, 2);
        let _ally = spawn(&mut arena, Side::Player, 3, 6);

        let unit = arena.get(me).unwrap();
        assert_eq!(nearest_opponent(&arena, unit), Some(near));
    }

    #[test]
    fn first_found_wins_ties() {
        let mut arena = Arena::new();
        let me = spawn(&mut arena, Side::Player, 3, 5);
        let left = spawn(&mut arena, Side::Enemy, 2, 3);
        let _right = spawn(&mut arena, Side::Enemy, 4, 3);

        let unit = arena.get(me).unwrap();
        assert_eq!(nearest_opponent(&arena, unit), Some(left));
    }

    #[test]
    fn dead_opponents_are_skipped() {
        let mut arena = Arena::new();
        let me = spawn(&mut arena, Side::Player, 3, 5);
        let near = spawn(&mut arena, Side::Enemy, 3, 3);
        let far = spawn(&mut arena, Side::Enemy, 3, 0);
        arena.get_mut(near).unwrap().combat.hp = 0;

        let unit = arena.get(me).unwrap();
        assert_eq!(nearest_opponent(&arena, unit), Some(far));
    }

    #[test]
    fn acquire_keeps_living_target() {
        let mut arena = Arena::new();
        let me = spawn(&mut arena, Side::Player, 3, 5);
        let _near = spawn(&mut arena, Side::Enemy, 3, 3);
        let far = spawn(&mut arena, Side::Enemy, 3, 0);
        arena.get_mut(me).unwrap().combat.target = Some(far);

        let mut log = EventLog::new();
        assert_eq!(acquire(&mut arena, me, &mut log), Some(far));
        assert!(log.is_empty());
    }

    #[test]
    fn acquire_replaces_dead_target() {
        let mut arena = Arena::new();
        let me = spawn(&mut arena, Side::Player, 3, 5);
        let old = spawn(&mut arena, Side::Enemy, 3, 3);
        let replacement = spawn(&mut arena, Side::Enemy, 3, 0);
        arena.get_mut(me).unwrap().combat.target = Some(old);
        arena.get_mut(old).unwrap().combat.hp = -1;

        let mut log = EventLog::new();
        assert_eq!(acquire(&mut arena, me, &mut log), Some(replacement));
        assert_eq!(arena.get(me).unwrap().combat.target, Some(replacement));
        assert_eq!(log.take_events().len(), 1);
    }

    #[test]
    fn acquire_clears_target_when_nobody_is_left() {
        let mut arena = Arena::new();
        let me = spawn(&mut arena, Side::Player, 3, 5);
        let only = spawn(&mut arena, Side::Enemy, 3, 3);
        arena.get_mut(me).unwrap().combat.target = Some(only);
        arena.get_mut(only).unwrap().combat.hp = 0;

        let mut log = EventLog::new();
        assert_eq!(acquire(&mut arena, me, &mut log), None);
        assert!(arena.get(me).unwrap().combat.target.is_none());
    }
}
