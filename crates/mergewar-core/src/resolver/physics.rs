//! Physics resolver for movement toward targets and local separation.
//!
//! The `PhysicsResolver` handles:
//! - Stepping a unit toward its target by `move_speed * dt`
//! - Separation: pushing a moving unit away from every living neighbour
//!   closer than the separation radius
//!
//! # Variable Timestep
//!
//! Unlike a fixed-step integrator, battle ticks follow the caller's frame
//! timestamps. The step is clamped by the simulation before it gets here.

use glam::Vec2;

use crate::arena::Arena;
use crate::entity::EntityId;

/// Default radius below which two units push each other apart.
pub const DEFAULT_SEPARATION_RADIUS: f32 = 0.6;

/// Default separation strength; the push is `offset * strength * dt`.
pub const DEFAULT_SEPARATION_STRENGTH: f32 = 3.0;

/// Resolver for unit movement.
///
/// # Example
///
/// ```
/// use mergewar_core::resolver::PhysicsResolver;
///
/// let resolver = PhysicsResolver::new();
/// assert!((resolver.separation_radius() - 0.6).abs() < f32::EPSILON);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PhysicsResolver {
    separation_radius: f32,
    separation_strength: f32,
}

impl Default for PhysicsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsResolver {
    /// Creates a physics resolver with the default separation tuning.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            separation_radius: DEFAULT_SEPARATION_RADIUS,
            separation_strength: DEFAULT_SEPARATION_STRENGTH,
        }
    }

    /// Creates a physics resolver with custom separation tuning.
    #[must_use]
    pub const fn with_separation(radius: f32, strength: f32) -> Self {
        Self {
            separation_radius: radius,
            separation_strength: strength,
        }
    }

    /// Returns the separation radius.
    #[must_use]
    pub const fn separation_radius(&self) -> f32 {
        self.separation_radius
    }

    /// Moves `unit` toward `goal` by `speed * dt` along the normalized
    /// direction. Does nothing when the unit already stands on `goal`.
    pub fn step_toward(next: &mut Arena, unit: EntityId, goal: Vec2, speed: f32, dt: f32) {
        let Some(entity) = next.get_mut(unit) else {
            return;
        };
        let offset = goal - entity.transform.position;
        let len = offset.length();
        if len > 0.0 {
            entity.transform.position += offset / len * speed * dt;
        }
        next.update_spatial(unit);
    }

    /// Pushes `unit` away from every other living entity closer than the
    /// separation radius.
    ///
    /// Neighbours are visited in id order and each push moves the unit
    /// before the next distance is measured. A single push is shorter than
    /// `radius * strength * dt`, so the index is searched wide enough to
    /// cover every neighbour the unit can drift into range of.
    pub fn separate(&self, next: &mut Arena, unit: EntityId, dt: f32) {
        let Some(origin) = next.get(unit).map(crate::entity::Entity::position) else {
            return;
        };
        #[allow(clippy::cast_precision_loss)]
        let pushes = next.entity_count().saturating_sub(1) as f32;
        let reach = self.separation_radius * (1.0 + self.separation_strength * dt.max(0.0) * pushes);
        let candidates = next.spatial().query_radius(origin, reach);

        let mut position = origin;
        for other in candidates {
            if other == unit {
                continue;
            }
            let Some(neighbour) = next.get_alive(other) else {
                continue;
            };
            let away = position - neighbour.position();
            if away.length() < self.separation_radius {
                position += away * self.separation_strength * dt;
            }
        }

        if let Some(entity) = next.get_mut(unit) {
            entity.transform.position = position;
        }
        next.update_spatial(unit);
    }
}
