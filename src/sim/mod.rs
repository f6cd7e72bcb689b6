//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time enters only through `Engine::advance` / `Engine::tick`
//! - Seeded RNG only
//! - Stable iteration order (asteroids in creation order)
//! - No rendering or platform dependencies

pub mod engine;
pub mod events;
pub mod problem;
pub mod state;
pub mod timer;

pub use engine::{Engine, PlayArea};
pub use events::{DestroyEffect, GameEvent, RenderSink};
pub use problem::{Operator, Problem};
pub use state::{GamePhase, GameState};
pub use timer::PeriodicTimer;
