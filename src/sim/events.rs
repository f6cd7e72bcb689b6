//! Engine notifications and the rendering sink that consumes them

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::problem::Operator;

/// Visual treatment of a destroyed asteroid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DestroyEffect {
    /// Shot down by a correct answer
    Reward,
    /// Crashed into the bottom of the play area
    NoReward,
}

/// Side effect emitted by the engine, queued until the host drains it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new session began; any leftover objects should be cleared
    SessionStarted,
    Spawned {
        id: u32,
        pos: Vec2,
        label: String,
        operator: Operator,
    },
    Moved {
        id: u32,
        pos: Vec2,
    },
    Destroyed {
        id: u32,
        pos: Vec2,
        effect: DestroyEffect,
    },
    DamageFlash {
        health: u32,
    },
    /// Submitted answer matched nothing
    InputRejected,
    GameOver {
        final_score: u32,
    },
}

/// Rendering layer the engine's notifications are delivered to
pub trait RenderSink {
    /// Remove every object from the surface
    fn clear_objects(&mut self) {}
    fn create_object(&mut self, id: u32, pos: Vec2, label: &str, category: &str);
    fn move_object(&mut self, id: u32, pos: Vec2);
    fn destroy_object(&mut self, id: u32, pos: Vec2, effect: DestroyEffect);
    fn flash_damage(&mut self, health: u32);
    fn reject_input(&mut self);
    fn show_game_over(&mut self, final_score: u32);
}

impl GameEvent {
    /// Deliver this event to a sink
    pub fn dispatch<S: RenderSink + ?Sized>(&self, sink: &mut S) {
        match self {
            GameEvent::SessionStarted => sink.clear_objects(),
            GameEvent::Spawned {
                id,
                pos,
                label,
                operator,
            } => sink.create_object(*id, *pos, label, operator.category()),
            GameEvent::Moved { id, pos } => sink.move_object(*id, *pos),
            GameEvent::Destroyed { id, pos, effect } => sink.destroy_object(*id, *pos, *effect),
            GameEvent::DamageFlash { health } => sink.flash_damage(*health),
            GameEvent::InputRejected => sink.reject_input(),
            GameEvent::GameOver { final_score } => sink.show_game_over(*final_score),
        }
    }
}
