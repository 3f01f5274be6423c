//! Cross-module tests.
//!
//! - `determinism.rs`: Same seed and inputs produce identical runs
//! - `integration.rs`: End-to-end scenarios through [`crate::session::GameSession`]
//! - `helpers.rs`: Scripted generators, session setup and battle drivers

mod helpers;
