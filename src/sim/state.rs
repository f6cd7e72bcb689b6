//! Session state
//!
//! Everything a single playthrough owns: score, shields, spawn cadence and
//! the live asteroids in creation order.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::problem::Problem;
use crate::settings::Settings;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Start screen, nothing running
    #[default]
    Idle,
    /// Asteroids falling, input accepted
    Playing,
    /// Shields depleted, waiting for restart
    GameOver,
}

/// Complete session state (deterministic for a given seed)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    pub score: u32,
    pub health: u32,
    /// Current time between spawns
    pub spawn_interval_ms: u32,
    /// Live asteroids, oldest first
    pub problems: Vec<Problem>,
    /// Score frozen at game over
    pub final_score: Option<u32>,
    /// Position ticks since session start
    pub time_ticks: u64,
    rng: Pcg32,
    next_id: u32,
}

impl GameState {
    /// Create an idle state with the given seed
    pub fn new(seed: u64, settings: &Settings) -> Self {
        Self {
            seed,
            phase: GamePhase::Idle,
            score: 0,
            health: settings.max_health,
            spawn_interval_ms: settings.initial_spawn_interval_ms,
            problems: Vec::new(),
            final_score: None,
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Reset counters for a fresh session. The RNG keeps running so
    /// consecutive sessions differ; ids never repeat.
    pub fn reset(&mut self, settings: &Settings) {
        self.phase = GamePhase::Idle;
        self.score = 0;
        self.health = settings.max_health;
        self.spawn_interval_ms = settings.initial_spawn_interval_ms;
        self.problems.clear();
        self.final_score = None;
        self.time_ticks = 0;
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Index of the oldest live asteroid answered by `value`
    pub fn first_match(&self, value: i64) -> Option<usize> {
        self.problems.iter().position(|p| p.is_answered_by(value))
    }
}
