//! Engine settings and difficulty presets
//!
//! Every gameplay constant the engine reads lives here so a page can retune
//! a session without rebuilding.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Difficulty preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Cadet,
    #[default]
    Pilot,
    Ace,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Cadet => "Cadet",
            Difficulty::Pilot => "Pilot",
            Difficulty::Ace => "Ace",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "cadet" | "easy" => Some(Difficulty::Cadet),
            "pilot" | "normal" => Some(Difficulty::Pilot),
            "ace" | "hard" => Some(Difficulty::Ace),
            _ => None,
        }
    }

    /// Asteroid fall speed per position tick
    pub fn fall_per_tick(&self) -> f32 {
        match self {
            Difficulty::Cadet => 0.9,
            Difficulty::Pilot => FALL_PER_TICK,
            Difficulty::Ace => 1.6,
        }
    }

    /// Spawn interval at session start
    pub fn initial_spawn_interval_ms(&self) -> u32 {
        match self {
            Difficulty::Cadet => 3000,
            Difficulty::Pilot => INITIAL_SPAWN_INTERVAL_MS,
            Difficulty::Ace => 2000,
        }
    }

    /// Interval below which the difficulty ramp stops
    pub fn min_spawn_interval_ms(&self) -> u32 {
        match self {
            Difficulty::Cadet => 1200,
            Difficulty::Pilot => MIN_SPAWN_INTERVAL_MS,
            Difficulty::Ace => 600,
        }
    }
}

/// Engine tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Preset these values were derived from (informational)
    pub difficulty: Difficulty,

    // === Motion ===
    /// Position tick period (ms)
    pub position_tick_ms: u32,
    /// Vertical advance per position tick
    pub fall_per_tick: f32,

    // === Spawning ===
    pub initial_spawn_interval_ms: u32,
    pub min_spawn_interval_ms: u32,
    pub spawn_interval_step_ms: u32,
    /// Ramp difficulty whenever score lands on a multiple of this
    pub ramp_score_threshold: u32,

    // === Scoring ===
    pub score_award: u32,
    pub damage_per_miss: u32,
    pub max_health: u32,

    // === Geometry ===
    pub object_size: f32,
    pub bottom_margin: f32,
    pub default_width: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Pilot,

            position_tick_ms: POSITION_TICK_MS,
            fall_per_tick: FALL_PER_TICK,

            initial_spawn_interval_ms: INITIAL_SPAWN_INTERVAL_MS,
            min_spawn_interval_ms: MIN_SPAWN_INTERVAL_MS,
            spawn_interval_step_ms: SPAWN_INTERVAL_STEP_MS,
            ramp_score_threshold: RAMP_SCORE_THRESHOLD,

            score_award: SCORE_AWARD,
            damage_per_miss: DAMAGE_PER_MISS,
            max_health: MAX_HEALTH,

            object_size: OBJECT_SIZE,
            bottom_margin: BOTTOM_MARGIN,
            default_width: DEFAULT_WIDTH,
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_preset(preset: Difficulty) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a difficulty preset (updates preset-dependent values only)
    pub fn apply_preset(&mut self, preset: Difficulty) {
        self.difficulty = preset;
        self.fall_per_tick = preset.fall_per_tick();
        self.initial_spawn_interval_ms = preset.initial_spawn_interval_ms();
        self.min_spawn_interval_ms = preset.min_spawn_interval_ms();
    }

    /// Parse a JSON override. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.sanitized())
    }

    /// Clamp values that would stall or break the engine
    pub fn sanitized(mut self) -> Self {
        at_least_one("position_tick_ms", &mut self.position_tick_ms);
        at_least_one("initial_spawn_interval_ms", &mut self.initial_spawn_interval_ms);
        at_least_one("ramp_score_threshold", &mut self.ramp_score_threshold);
        // A zero award would land every score on the ramp threshold
        at_least_one("score_award", &mut self.score_award);
        at_least_one("max_health", &mut self.max_health);
        if !self.fall_per_tick.is_finite() || self.fall_per_tick <= 0.0 {
            log::warn!(
                "Rejected fall_per_tick {}, using {}",
                self.fall_per_tick,
                FALL_PER_TICK
            );
            self.fall_per_tick = FALL_PER_TICK;
        }
        if !self.default_width.is_finite() || self.default_width <= 0.0 {
            log::warn!(
                "Rejected default_width {}, using {}",
                self.default_width,
                DEFAULT_WIDTH
            );
            self.default_width = DEFAULT_WIDTH;
        }
        self
    }
}

fn at_least_one(name: &str, value: &mut u32) {
    if *value == 0 {
        log::warn!("Rejected {} 0, using 1", name);
        *value = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_consts() {
        let s = Settings::default();
        assert_eq!(s.position_tick_ms, 16);
        assert_eq!(s.initial_spawn_interval_ms, 2500);
        assert_eq!(s.min_spawn_interval_ms, 800);
        assert_eq!(s.spawn_interval_step_ms, 200);
        assert_eq!(s.score_award, 10);
        assert_eq!(s.damage_per_miss, 20);
        assert_eq!(s.max_health, 100);
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("ACE"), Some(Difficulty::Ace));
        assert_eq!(Difficulty::from_str(" easy "), Some(Difficulty::Cadet));
        assert_eq!(Difficulty::from_str("pilot"), Some(Difficulty::Pilot));
        assert_eq!(Difficulty::from_str("ludicrous"), None);
    }

    #[test]
    fn test_preset_only_touches_pacing() {
        let s = Settings::from_preset(Difficulty::Ace);
        assert_eq!(s.difficulty, Difficulty::Ace);
        assert_eq!(s.initial_spawn_interval_ms, 2000);
        assert_eq!(s.min_spawn_interval_ms, 600);
        assert_eq!(s.score_award, SCORE_AWARD);
    }

    #[test]
    fn test_from_json_partial_override() {
        let s = Settings::from_json(r#"{ "fall_per_tick": 2.0, "max_health": 60 }"#).unwrap();
        assert_eq!(s.fall_per_tick, 2.0);
        assert_eq!(s.max_health, 60);
        assert_eq!(s.initial_spawn_interval_ms, INITIAL_SPAWN_INTERVAL_MS);
    }

    #[test]
    fn test_from_json_sanitizes() {
        let s = Settings::from_json(r#"{ "position_tick_ms": 0, "fall_per_tick": -1.0 }"#)
            .unwrap();
        assert_eq!(s.position_tick_ms, 1);
        assert_eq!(s.fall_per_tick, FALL_PER_TICK);
    }

    #[test]
    fn test_sanitize_zeroed_counters() {
        let s = Settings::from_json(
            r#"{ "score_award": 0, "ramp_score_threshold": 0, "max_health": 0, "initial_spawn_interval_ms": 0 }"#,
        )
        .unwrap();
        assert_eq!(s.score_award, 1);
        assert_eq!(s.ramp_score_threshold, 1);
        assert_eq!(s.max_health, 1);
        assert_eq!(s.initial_spawn_interval_ms, 1);
        assert_eq!(s.damage_per_miss, DAMAGE_PER_MISS);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(Settings::from_json("not json").is_err());
    }
}
