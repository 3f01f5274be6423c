//! Per-tick battle resolution.
//!
//! A battle tick works on a working copy of the arena. The resolvers here
//! mutate that copy one concern at a time:
//!
//! - [`targeting`]: Target validation and nearest-opponent search
//! - [`CombatResolver`]: Death sweep, liveness, attack timing and damage
//! - [`PhysicsResolver`]: Stepping toward a target and local separation
//!
//! # Invariants
//!
//! - An entity with `hp <= 0` is never a target, never moves and never deals
//!   damage.
//! - Entities are visited in id order, so a tick is deterministic for a given
//!   snapshot and timestamp.

mod combat;
mod physics;
pub mod targeting;

pub use combat::CombatResolver;
pub use physics::PhysicsResolver;
