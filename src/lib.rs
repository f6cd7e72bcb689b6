//! Math Galaxy - type the answer to blast falling arithmetic asteroids
//!
//! Core modules:
//! - `sim`: Deterministic arcade engine (spawning, falling, matching, scoring)
//! - `settings`: Engine tunables and difficulty presets

pub mod settings;
pub mod sim;

pub use settings::{Difficulty, Settings};
pub use sim::{Engine, GameEvent, GamePhase, PlayArea, RenderSink};

/// Game configuration constants
pub mod consts {
    /// Position tick period (~60 Hz for smooth motion)
    pub const POSITION_TICK_MS: u32 = 16;
    /// Vertical advance of every asteroid per position tick
    pub const FALL_PER_TICK: f32 = 1.2;

    /// Spawn cadence at session start
    pub const INITIAL_SPAWN_INTERVAL_MS: u32 = 2500;
    /// Difficulty ramp only applies while the interval is above this
    pub const MIN_SPAWN_INTERVAL_MS: u32 = 800;
    /// Interval reduction per ramp step
    pub const SPAWN_INTERVAL_STEP_MS: u32 = 200;
    /// Ramp whenever score lands on a multiple of this
    pub const RAMP_SCORE_THRESHOLD: u32 = 50;

    /// Score per destroyed asteroid
    pub const SCORE_AWARD: u32 = 10;
    /// Shield loss when an asteroid reaches the bottom
    pub const DAMAGE_PER_MISS: u32 = 20;
    pub const MAX_HEALTH: u32 = 100;

    /// Rendered asteroid size (square)
    pub const OBJECT_SIZE: f32 = 110.0;
    /// Asteroids past `height - BOTTOM_MARGIN` hit the ship
    pub const BOTTOM_MARGIN: f32 = 120.0;
    /// Fallback play-area width when the host can't report one
    pub const DEFAULT_WIDTH: f32 = 600.0;

    /// Longest frame the host feeds the engine (prevents spiral of death
    /// after the tab was backgrounded)
    pub const MAX_FRAME_MS: f64 = 250.0;
}
