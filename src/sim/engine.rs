//! Arcade engine
//!
//! Drives the session state machine (`Idle -> Playing -> GameOver -> Playing`):
//! spawning, falling, answer matching, scoring and shield damage. Two periodic
//! activities run while playing, the position tick and the spawn tick. Both
//! are owned here and fed wall time through [`Engine::advance`].
//!
//! Nothing in here touches a rendering surface. Side effects are queued as
//! [`GameEvent`]s and handed to a [`RenderSink`] by the host.

use super::events::{DestroyEffect, GameEvent, RenderSink};
use super::problem::Problem;
use super::state::{GamePhase, GameState};
use super::timer::PeriodicTimer;
use crate::settings::Settings;

/// Play-area dimensions as reported by the host (pixels)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayArea {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl PlayArea {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
        }
    }

    /// Host couldn't measure anything
    pub fn unknown() -> Self {
        Self::default()
    }

    fn usable(value: Option<f32>) -> Option<f32> {
        value.filter(|v| v.is_finite() && *v > 0.0)
    }

    pub fn width_or(&self, fallback: f32) -> f32 {
        Self::usable(self.width).unwrap_or(fallback)
    }

    pub fn height(&self) -> Option<f32> {
        Self::usable(self.height)
    }
}

/// One engine instance per play area
#[derive(Debug, Clone)]
pub struct Engine {
    settings: Settings,
    state: GameState,
    position_timer: PeriodicTimer,
    spawn_timer: PeriodicTimer,
    events: Vec<GameEvent>,
}

impl Engine {
    pub fn new(seed: u64, settings: Settings) -> Self {
        let settings = settings.sanitized();
        Self {
            state: GameState::new(seed, &settings),
            settings,
            position_timer: PeriodicTimer::idle(),
            spawn_timer: PeriodicTimer::idle(),
            events: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn health(&self) -> u32 {
        self.state.health
    }

    pub fn spawn_interval_ms(&self) -> u32 {
        self.state.spawn_interval_ms
    }

    pub fn problems(&self) -> &[Problem] {
        &self.state.problems
    }

    pub fn position_timer(&self) -> &PeriodicTimer {
        &self.position_timer
    }

    pub fn spawn_timer(&self) -> &PeriodicTimer {
        &self.spawn_timer
    }

    /// Pending notifications (oldest first)
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Deliver all pending notifications to a sink
    pub fn dispatch_events<S: RenderSink + ?Sized>(&mut self, sink: &mut S) {
        for event in self.events.drain(..) {
            event.dispatch(sink);
        }
    }

    /// Begin a fresh session. Restarts from scratch if already playing.
    pub fn start(&mut self) {
        self.stop_activities();
        self.state.reset(&self.settings);
        self.state.phase = GamePhase::Playing;

        self.position_timer.schedule(self.settings.position_tick_ms);
        self.spawn_timer.schedule(self.state.spawn_interval_ms);

        self.events.push(GameEvent::SessionStarted);
        log::info!(
            "Session started ({}, spawn every {} ms)",
            self.settings.difficulty.as_str(),
            self.state.spawn_interval_ms
        );
    }

    /// Start again after game over
    pub fn restart(&mut self) {
        log::info!("Restarting (previous score {})", self.state.score);
        self.start();
    }

    /// Cancel both periodic activities (host teardown). Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        if self.stop_activities() {
            log::info!("Engine shut down");
        }
    }

    /// Re-arm both activities after [`Engine::shutdown`] if the session is
    /// still in play (page restored from the back/forward cache). The spawn
    /// tick gets a full interval. Returns true if anything was re-armed.
    pub fn resume(&mut self) -> bool {
        if !self.state.is_playing()
            || self.position_timer.is_active()
            || self.spawn_timer.is_active()
        {
            return false;
        }

        self.position_timer.schedule(self.settings.position_tick_ms);
        self.spawn_timer.schedule(self.state.spawn_interval_ms);
        log::info!(
            "Session resumed (score {}, shields {}%)",
            self.state.score,
            self.state.health
        );
        true
    }

    /// Feed elapsed wall time, firing due activities in chronological order.
    /// On a tie the position tick fires before the spawn tick.
    pub fn advance(&mut self, elapsed_ms: f64, area: PlayArea) {
        let mut budget = if elapsed_ms.is_finite() {
            elapsed_ms.max(0.0)
        } else {
            0.0
        };

        while self.state.is_playing() {
            let step = match (
                self.position_timer.remaining_ms(),
                self.spawn_timer.remaining_ms(),
            ) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) | (None, Some(a)) => a,
                (None, None) => break,
            };

            if step > budget {
                self.position_timer.elapse(budget);
                self.spawn_timer.elapse(budget);
                break;
            }

            budget -= step;
            self.position_timer.elapse(step);
            self.spawn_timer.elapse(step);

            if self.position_timer.take_due() {
                self.tick(self.settings.fall_per_tick, area);
            }
            if self.spawn_timer.take_due() {
                self.spawn_problem(area);
            }
        }
    }

    /// Spawn one asteroid above the play area. Returns its id.
    pub fn spawn_problem(&mut self, area: PlayArea) -> Option<u32> {
        if !self.state.is_playing() {
            return None;
        }

        let max_left = area.width_or(self.settings.default_width) - self.settings.object_size;
        let spawn_y = -self.settings.object_size;
        let id = self.state.next_entity_id();
        let problem = Problem::random(id, self.state.rng(), max_left, spawn_y);

        log::debug!(
            "Spawned #{} {} = {} at x={}",
            id,
            problem.label(),
            problem.expected_answer,
            problem.pos.x
        );
        self.events.push(GameEvent::Spawned {
            id,
            pos: problem.pos,
            label: problem.label(),
            operator: problem.operator,
        });
        self.state.problems.push(problem);
        Some(id)
    }

    /// Advance every asteroid by `advance` and crash the ones past the bottom.
    ///
    /// The whole frame is settled before any notification goes out. Each
    /// crash costs its own damage, so several can land in one tick.
    pub fn tick(&mut self, advance: f32, area: PlayArea) {
        if !self.state.is_playing() {
            return;
        }

        let advance = if advance.is_finite() && advance > 0.0 {
            advance
        } else {
            self.settings.fall_per_tick
        };

        self.state.time_ticks += 1;
        for problem in &mut self.state.problems {
            problem.pos.y += advance;
        }

        // Without a height there is no bottom to hit this frame
        let crashed: Vec<Problem> = match area.height() {
            Some(height) => {
                let limit = height - self.settings.bottom_margin;
                let (crashed, surviving) = std::mem::take(&mut self.state.problems)
                    .into_iter()
                    .partition(|p| p.pos.y > limit);
                self.state.problems = surviving;
                crashed
            }
            None => Vec::new(),
        };

        for problem in &self.state.problems {
            self.events.push(GameEvent::Moved {
                id: problem.id,
                pos: problem.pos,
            });
        }
        for problem in &crashed {
            log::debug!("#{} crashed ({})", problem.id, problem.label());
            self.events.push(GameEvent::Destroyed {
                id: problem.id,
                pos: problem.pos,
                effect: DestroyEffect::NoReward,
            });
        }
        for _ in &crashed {
            self.apply_damage(self.settings.damage_per_miss);
        }
    }

    /// Submit raw text from the answer field.
    ///
    /// The leading integer counts (`"13.5"` and `"13e0"` read as 13). Input
    /// without leading digits is ignored.
    pub fn submit_answer(&mut self, raw: &str) -> Option<u32> {
        match leading_integer(raw) {
            Some(value) => self.submit_value(value),
            None => {
                if !raw.trim().is_empty() {
                    log::debug!("Ignoring non-numeric answer {:?}", raw);
                }
                None
            }
        }
    }

    /// Shoot down the oldest asteroid answered by `value`. Returns its id.
    pub fn submit_value(&mut self, value: i64) -> Option<u32> {
        if !self.state.is_playing() {
            return None;
        }

        let Some(index) = self.state.first_match(value) else {
            self.events.push(GameEvent::InputRejected);
            return None;
        };

        let problem = self.state.problems.remove(index);
        self.events.push(GameEvent::Destroyed {
            id: problem.id,
            pos: problem.pos,
            effect: DestroyEffect::Reward,
        });
        self.state.score += self.settings.score_award;
        log::debug!(
            "#{} destroyed ({} = {}), score {}",
            problem.id,
            problem.label(),
            value,
            self.state.score
        );

        self.ramp_difficulty();
        Some(problem.id)
    }

    /// Lower shields. Reaching zero ends the session.
    pub fn apply_damage(&mut self, amount: u32) {
        if !self.state.is_playing() {
            return;
        }

        self.state.health = self.state.health.saturating_sub(amount);
        self.events.push(GameEvent::DamageFlash {
            health: self.state.health,
        });

        if self.state.health == 0 {
            self.game_over();
        }
    }

    /// Shorten the spawn interval when score lands on a ramp threshold.
    /// The spawn activity is replaced immediately, not after the pending spawn.
    fn ramp_difficulty(&mut self) {
        let interval = self.state.spawn_interval_ms;
        if self.state.score % self.settings.ramp_score_threshold != 0
            || interval <= self.settings.min_spawn_interval_ms
        {
            return;
        }

        let faster = interval
            .saturating_sub(self.settings.spawn_interval_step_ms)
            .max(1);
        self.state.spawn_interval_ms = faster;
        self.spawn_timer.schedule(faster);
        log::info!(
            "Score {}: spawn interval {} -> {} ms",
            self.state.score,
            interval,
            faster
        );
    }

    fn game_over(&mut self) {
        self.stop_activities();
        self.state.phase = GamePhase::GameOver;
        self.state.final_score = Some(self.state.score);
        self.events.push(GameEvent::GameOver {
            final_score: self.state.score,
        });
        log::info!(
            "Game over: score {} after {} ticks (seed {})",
            self.state.score,
            self.state.time_ticks,
            self.state.seed
        );
    }

    /// Returns true if anything was still running
    fn stop_activities(&mut self) -> bool {
        let position = self.position_timer.cancel();
        let spawn = self.spawn_timer.cancel();
        position || spawn
    }
}

/// Optional sign then digits up to the first non-digit, `None` without digits
fn leading_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim_start();
    let (negative, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return None;
    }
    // Anything past i64 can't match an asteroid anyway
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::sim::problem::Operator;
    use glam::Vec2;

    /// Started engine with a single asteroid whose answer is `a + b`
    fn with_sum(a: u32, b: u32) -> (Engine, u32) {
        let mut engine = Engine::new(5, Settings::default());
        engine.start();
        let id = engine.state.next_entity_id();
        let problem = Problem::new(id, Operator::Add, [a, b], Vec2::ZERO).unwrap();
        engine.state.problems.push(problem);
        engine.drain_events();
        (engine, id)
    }

    fn area() -> PlayArea {
        PlayArea::new(600.0, 800.0)
    }

    #[test]
    fn test_start_to_playing() {
        let mut engine = Engine::new(12345, Settings::default());
        assert_eq!(engine.phase(), GamePhase::Idle);

        engine.start();
        assert_eq!(engine.phase(), GamePhase::Playing);
        assert!(engine.position_timer().is_active());
        assert!(engine.spawn_timer().is_active());
        assert_eq!(engine.position_timer().period_ms(), 16.0);
        assert_eq!(engine.spawn_timer().period_ms(), 2500.0);
        assert_eq!(engine.drain_events(), vec![GameEvent::SessionStarted]);
    }

    #[test]
    fn test_idle_ignores_everything() {
        let mut engine = Engine::new(1, Settings::default());
        assert_eq!(engine.spawn_problem(area()), None);
        engine.tick(FALL_PER_TICK, area());
        assert_eq!(engine.submit_answer("4"), None);
        engine.apply_damage(50);
        engine.advance(10_000.0, area());

        assert_eq!(engine.health(), 100);
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_advance_interleaves_activities() {
        let mut engine = Engine::new(7, Settings::default());
        engine.start();
        engine.advance(2500.0, area());

        // 156 position ticks land at 16..=2496 ms, the spawn at 2500 ms
        assert_eq!(engine.state().time_ticks, 156);
        assert_eq!(engine.problems().len(), 1);
        assert_eq!(engine.problems()[0].pos.y, -OBJECT_SIZE);
    }

    #[test]
    fn test_advance_split_frames_match_single_frame() {
        let mut whole = Engine::new(99, Settings::default());
        let mut split = Engine::new(99, Settings::default());
        whole.start();
        split.start();

        whole.advance(6000.0, area());
        for _ in 0..375 {
            split.advance(16.0, area());
        }

        assert_eq!(whole.state().time_ticks, split.state().time_ticks);
        assert_eq!(whole.problems(), split.problems());
    }

    #[test]
    fn test_determinism() {
        // Same seed, same inputs, same sky
        let mut a = Engine::new(4242, Settings::default());
        let mut b = Engine::new(4242, Settings::default());
        for engine in [&mut a, &mut b] {
            engine.start();
            engine.advance(8000.0, area());
            engine.submit_value(6);
            engine.advance(3000.0, area());
        }

        assert_eq!(a.problems(), b.problems());
        assert_eq!(a.score(), b.score());
        assert_eq!(a.drain_events(), b.drain_events());
    }

    #[test]
    fn test_tick_advances_by_fixed_amount() {
        let mut engine = Engine::new(3, Settings::default());
        engine.start();
        engine.spawn_problem(area());
        engine.spawn_problem(area());
        let before: Vec<f32> = engine.problems().iter().map(|p| p.pos.y).collect();

        engine.tick(1.2, area());
        for (p, y) in engine.problems().iter().zip(before) {
            assert_eq!(p.pos.y, y + 1.2);
        }
    }

    #[test]
    fn test_tick_without_height_never_crashes() {
        let mut engine = Engine::new(3, Settings::default());
        engine.start();
        engine.spawn_problem(PlayArea::unknown());
        for _ in 0..2000 {
            engine.tick(1.2, PlayArea::unknown());
        }
        assert_eq!(engine.problems().len(), 1);
        assert_eq!(engine.health(), 100);
    }

    #[test]
    fn test_spawn_uses_default_width() {
        let mut engine = Engine::new(11, Settings::default());
        engine.start();
        for _ in 0..200 {
            engine.spawn_problem(PlayArea::unknown());
        }
        let max_left = DEFAULT_WIDTH - OBJECT_SIZE;
        assert!(engine.problems().iter().all(|p| p.pos.x < max_left));
    }

    #[test]
    fn test_wrong_answer_only_rejects() {
        let mut engine = Engine::new(5, Settings::default());
        engine.start();
        engine.spawn_problem(area());
        engine.drain_events();

        // No generated problem has an answer above 30
        assert_eq!(engine.submit_value(999), None);
        assert_eq!(engine.drain_events(), vec![GameEvent::InputRejected]);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.health(), 100);
        assert_eq!(engine.problems().len(), 1);
    }

    #[test]
    fn test_unparseable_answer_is_silent() {
        let mut engine = Engine::new(5, Settings::default());
        engine.start();
        engine.drain_events();

        assert_eq!(engine.submit_answer(""), None);
        assert_eq!(engine.submit_answer("   "), None);
        assert_eq!(engine.submit_answer("twelve"), None);
        assert!(engine.events().is_empty());
    }

    #[test]
    fn test_answer_reads_leading_integer() {
        for raw in ["13", " 13 ", "13.0", "13.5", "13e0", "+13"] {
            let (mut engine, id) = with_sum(6, 7);
            assert_eq!(engine.submit_answer(raw), Some(id), "{raw:?}");
            assert_eq!(engine.score(), 10);
            assert!(engine.problems().is_empty());
        }

        let (mut engine, id) = with_sum(5, 7);
        assert_eq!(engine.submit_answer("12abc"), Some(id));
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(leading_integer("-3.9"), Some(-3));
        assert_eq!(leading_integer("007"), Some(7));
        assert_eq!(leading_integer(".5"), None);
        assert_eq!(leading_integer("-"), None);
        assert_eq!(leading_integer("e5"), None);
        assert_eq!(leading_integer("99999999999999999999"), Some(i64::MAX));
    }

    #[test]
    fn test_unmatched_leading_integer_rejects() {
        let (mut engine, _) = with_sum(6, 7);
        assert_eq!(engine.submit_answer("14.0"), None);
        assert_eq!(engine.drain_events(), vec![GameEvent::InputRejected]);
        assert_eq!(engine.problems().len(), 1);
    }

    #[test]
    fn test_zero_award_does_not_ramp_every_answer() {
        let settings = Settings {
            score_award: 0,
            ..Settings::default()
        };
        let mut engine = Engine::new(5, settings);
        engine.start();
        for operands in [[1, 2], [2, 2]] {
            let id = engine.state.next_entity_id();
            let problem = Problem::new(id, Operator::Add, operands, Vec2::ZERO).unwrap();
            let answer = i64::from(problem.expected_answer);
            engine.state.problems.push(problem);
            assert_eq!(engine.submit_value(answer), Some(id));
        }
        assert_eq!(engine.score(), 2);
        assert_eq!(engine.spawn_interval_ms(), 2500);
    }

    #[test]
    fn test_resume_after_shutdown() {
        let mut engine = Engine::new(5, Settings::default());
        engine.start();
        engine.apply_damage(40);
        engine.shutdown();
        engine.advance(10_000.0, area());
        assert!(engine.problems().is_empty());

        assert!(engine.resume());
        assert!(!engine.resume());
        assert_eq!(engine.spawn_timer().remaining_ms(), Some(2500.0));
        assert_eq!(engine.health(), 60);

        engine.advance(2500.0, area());
        assert_eq!(engine.problems().len(), 1);
        assert_eq!(engine.phase(), GamePhase::Playing);
    }

    #[test]
    fn test_resume_needs_a_live_session() {
        let mut idle = Engine::new(5, Settings::default());
        assert!(!idle.resume());
        assert!(!idle.spawn_timer().is_active());

        let mut over = Engine::new(5, Settings::default());
        over.start();
        over.apply_damage(100);
        over.shutdown();
        assert!(!over.resume());
        assert!(!over.position_timer().is_active());
    }

    #[test]
    fn test_damage_clamps_and_ends_once() {
        let mut engine = Engine::new(5, Settings::default());
        engine.start();
        engine.apply_damage(70);
        engine.apply_damage(70);
        engine.apply_damage(70);

        assert_eq!(engine.health(), 0);
        assert_eq!(engine.phase(), GamePhase::GameOver);
        let game_overs = engine
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(game_overs, 1);
    }

    #[test]
    fn test_start_while_playing_resets() {
        let mut engine = Engine::new(5, Settings::default());
        engine.start();
        engine.spawn_problem(area());
        engine.apply_damage(40);

        engine.start();
        assert_eq!(engine.health(), 100);
        assert!(engine.problems().is_empty());
        assert_eq!(engine.spawn_timer().remaining_ms(), Some(2500.0));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let mut engine = Engine::new(5, Settings::default());
        engine.start();
        engine.shutdown();
        engine.shutdown();
        assert!(!engine.position_timer().is_active());
        assert!(!engine.spawn_timer().is_active());

        engine.advance(10_000.0, area());
        assert!(engine.problems().is_empty());
    }
}
