//! Arena module: the authoritative store of battle participants.
//!
//! The Arena owns every entity of both sides for the active preparation or
//! battle session. It provides:
//! - Entity storage with deterministic iteration order (`BTreeMap`)
//! - Spatial indexing for proximity queries
//! - Entity lifecycle management (spawn/despawn)
//! - Bulk stat refresh after upgrades ([`Arena::reprice`])
//! - All-or-nothing structural edits ([`Arena::transaction`])
//!
//! # Spatial Index Synchronization
//!
//! The spatial index is NOT automatically synchronized when entity positions
//! change through `get_mut()`. Call `update_spatial(id)` afterward. Spawning,
//! despawning and [`Arena::move_to_cell`] keep the index in sync themselves.
//!
//! ```
//! # use mergewar_core::arena::Arena;
//! # use mergewar_core::archetype::UnitType;
//! # use mergewar_core::entity::Side;
//! # use mergewar_core::grid::GridCell;
//! # use mergewar_core::stats::StatContext;
//! # use glam::Vec2;
//! # let mut arena = Arena::new();
//! # let id = arena.spawn_unit(UnitType::Infantry, 1, Side::Player, GridCell::new(0, 7), &StatContext::default());
//! if let Some(entity) = arena.get_mut(id) {
//!     entity.transform.position = Vec2::new(0.5, 6.5);
//! }
//! // REQUIRED: sync spatial index after position change
//! arena.update_spatial(id);
//! ```
//!
//! # Example
//!
//! ```
//! use mergewar_core::arena::Arena;
//! use mergewar_core::archetype::UnitType;
//! use mergewar_core::entity::Side;
//! use mergewar_core::grid::GridCell;
//! use mergewar_core::stats::StatContext;
//!
//! let mut arena = Arena::new();
//! let ctx = StatContext::default();
//!
//! let a = arena.spawn_unit(UnitType::Archer, 1, Side::Player, GridCell::new(0, 7), &ctx);
//! let b = arena.spawn_unit(UnitType::Archer, 1, Side::Player, GridCell::new(1, 7), &ctx);
//!
//! let ids: Vec<_> = arena.entity_ids_sorted().collect();
//! assert_eq!(ids, vec![a, b]);
//! assert_eq!(arena.occupant_at(GridCell::new(1, 7)), Some(b));
//! assert_eq!(arena.first_free_player_cell(), Some(GridCell::new(2, 7)));
//! ```

use std::collections::{BTreeMap, HashMap};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::archetype::UnitType;
use crate::entity::{Entity, EntityId, Side};
use crate::grid::GridCell;
use crate::stats::StatContext;

// =============================================================================
// Spatial Index
// =============================================================================

/// Simple spatial index for proximity queries.
///
/// `HashMap` is acceptable here because we only query by known entity IDs or
/// perform full scans for radius queries, and radius results are sorted by id
/// before they are returned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpatialIndex {
    /// Entity positions indexed by ID.
    positions: HashMap<EntityId, Vec2>,
}

impl SpatialIndex {
    /// Creates a new empty spatial index.
    #[must_use]
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    /// Inserts or updates an entity's position in the index.
    pub fn insert(&mut self, id: EntityId, pos: Vec2) {
        self.positions.insert(id, pos);
    }

    /// Removes an entity from the spatial index.
    pub fn remove(&mut self, id: EntityId) {
        self.positions.remove(&id);
    }

    /// Returns the position of an entity, if known.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<Vec2> {
        self.positions.get(&id).copied()
    }

    /// Queries for entities within a radius of a center point.
    ///
    /// Returns entity IDs sorted by ID for consistent simulation behavior.
    /// The boundary is inclusive.
    ///
    /// # Arguments
    ///
    /// * `center` - The center point of the query
    /// * `radius` - The search radius
    #[must_use]
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        let radius_sq = radius * radius;
        let mut results: Vec<EntityId> = self
            .positions
            .iter()
            .filter(|(_, pos)| center.distance_squared(**pos) <= radius_sq)
            .map(|(id, _)| *id)
            .collect();

        results.sort();
        results
    }

    /// Returns the number of entities in the spatial index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Returns true if the spatial index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

// =============================================================================
// Stat refresh
// =============================================================================

/// How [`Arena::reprice`] treats current hit points.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HpAdjust {
    /// Set hp to the new maximum
    Refill,
    /// Add the change in maximum hp to current hp
    HealDelta,
}

// =============================================================================
// Arena
// =============================================================================

/// Container of every entity in the session.
///
/// # Determinism
///
/// The Arena uses `BTreeMap` for entity storage. Entity IDs are assigned
/// monotonically, so iterating over entities always produces them in
/// creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    /// Monotonically increasing entity ID counter.
    next_id: u64,
    /// Entity storage with deterministic iteration order.
    entities: BTreeMap<EntityId, Entity>,
    /// Spatial index for proximity queries.
    spatial: SpatialIndex,
}

impl Arena {
    /// Creates a new empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entities: BTreeMap::new(),
            spatial: SpatialIndex::new(),
        }
    }

    /// Spawns a full-health unit on `cell`, scaled by `ctx`.
    ///
    /// # Returns
    ///
    /// The unique ID assigned to the new entity.
    pub fn spawn_unit(
        &mut self,
        unit_type: UnitType,
        level: u32,
        side: Side,
        cell: GridCell,
        ctx: &StatContext,
    ) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;

        let entity = Entity::from_context(id, unit_type, level, side, cell, ctx);
        self.spatial.insert(id, entity.position());
        self.entities.insert(id, entity);
        id
    }

    /// Despawns an entity from the arena.
    ///
    /// # Returns
    ///
    /// The removed entity, if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        self.spatial.remove(id);
        self.entities.remove(&id)
    }

    /// Removes every entity of one side.
    ///
    /// # Returns
    ///
    /// How many entities were removed.
    pub fn despawn_side(&mut self, side: Side) -> usize {
        let doomed: Vec<EntityId> = self.by_side(side).map(Entity::id).collect();
        for id in &doomed {
            self.despawn(*id);
        }
        doomed.len()
    }

    /// Returns a reference to an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable reference to an entity by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns a reference to an entity only while it is alive.
    #[must_use]
    pub fn get_alive(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id).filter(|e| e.is_alive())
    }

    /// Returns an iterator over entity IDs in deterministic (sorted) order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Returns an iterator over entities in deterministic (sorted by ID) order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Returns an iterator over mutable entities in deterministic order.
    pub fn entities_sorted_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.entities.values_mut()
    }

    /// Entities of one side, alive or not, in id order.
    pub fn by_side(&self, side: Side) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values().filter(move |e| e.side() == side)
    }

    /// Living entities of one side in id order.
    pub fn living(&self, side: Side) -> impl Iterator<Item = &Entity> + '_ {
        self.by_side(side).filter(|e| e.is_alive())
    }

    /// Returns `true` if at least one entity of `side` is alive.
    #[must_use]
    pub fn any_alive(&self, side: Side) -> bool {
        self.living(side).next().is_some()
    }

    /// Number of entities of one side, alive or not.
    #[must_use]
    pub fn count_side(&self, side: Side) -> usize {
        self.by_side(side).count()
    }

    /// The living entity standing on `cell`, if any.
    #[must_use]
    pub fn occupant_at(&self, cell: GridCell) -> Option<EntityId> {
        self.entities
            .values()
            .find(|e| e.is_alive() && e.cell() == cell)
            .map(Entity::id)
    }

    /// First unoccupied cell in the player half, scanning rows bottom-up and
    /// columns left to right.
    #[must_use]
    pub fn first_free_player_cell(&self) -> Option<GridCell> {
        GridCell::player_fill_order().find(|cell| self.occupant_at(*cell).is_none())
    }

    /// Moves an entity onto `cell`, snapping its continuous position.
    ///
    /// Returns `false` if no such entity exists.
    pub fn move_to_cell(&mut self, id: EntityId, cell: GridCell) -> bool {
        let Some(entity) = self.entities.get_mut(&id) else {
            return false;
        };
        entity.set_cell(cell);
        self.spatial.insert(id, cell.to_position());
        true
    }

    /// Returns the number of entities in the arena.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the arena has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns a reference to the spatial index.
    #[must_use]
    pub fn spatial(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Updates the spatial index for an entity.
    ///
    /// Call this after modifying an entity's position to keep the spatial
    /// index in sync.
    pub fn update_spatial(&mut self, id: EntityId) {
        if let Some(entity) = self.entities.get(&id) {
            self.spatial.insert(id, entity.position());
        }
    }

    /// Rebuilds the whole spatial index from entity positions.
    pub fn rebuild_spatial(&mut self) {
        self.spatial.clear();
        for (id, entity) in &self.entities {
            self.spatial.insert(*id, entity.position());
        }
    }

    /// Refreshes max hp of every entity matching `filter` from `ctx`.
    ///
    /// Identity, position, target and state are preserved. With
    /// [`HpAdjust::HealDelta`] an entity already below its old maximum keeps
    /// the same missing amount.
    ///
    /// # Returns
    ///
    /// How many entities were refreshed.
    pub fn reprice<F>(&mut self, filter: F, ctx: &StatContext, adjust: HpAdjust) -> usize
    where
        F: Fn(&Entity) -> bool,
    {
        let mut refreshed = 0;
        for entity in self.entities.values_mut().filter(|e| filter(e)) {
            let new_max = entity.stats(ctx).hp;
            let combat = &mut entity.combat;
            match adjust {
                HpAdjust::Refill => combat.hp = new_max,
                HpAdjust::HealDelta => combat.hp += new_max - combat.max_hp,
            }
            combat.max_hp = new_max;
            refreshed += 1;
        }
        refreshed
    }

    /// Runs `edit` on a copy of the arena and installs the copy only if the
    /// edit succeeds.
    ///
    /// # Errors
    ///
    /// Returns whatever `edit` returns; the arena is untouched in that case.
    pub fn transaction<T, E, F>(&mut self, edit: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let mut working = self.clone();
        let value = edit(&mut working)?;
        *self = working;
        Ok(value)
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
