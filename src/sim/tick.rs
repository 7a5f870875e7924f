//! Per-tick update
//!
//! Fixed order: scheduled work, controllable physics, spawn, free physics,
//! collisions. Nothing runs outside `Playing`.

use serde::{Deserialize, Serialize};

use super::collision::resolve;
use super::physics::{step_controllable, step_free};
use super::spawn::spawn;
use super::state::{Direction, GameState};
use crate::clamp_dt;

/// Resolved horizontal intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Movement {
    #[default]
    None,
    Left,
    Right,
}

impl Movement {
    pub fn direction(self) -> Option<Direction> {
        match self {
            Movement::None => None,
            Movement::Left => Some(Direction::Left),
            Movement::Right => Some(Direction::Right),
        }
    }

    pub fn sign(self) -> f32 {
        self.direction().map_or(0.0, Direction::sign)
    }
}

impl From<Direction> for Movement {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Left => Movement::Left,
            Direction::Right => Movement::Right,
        }
    }
}

/// Canonical input for a single tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlIntent {
    pub movement: Movement,
    /// One pulse per discrete press (shoot, hit)
    pub action_pulse: bool,
    /// One bit per lane struck this tick
    pub lane_pulses: u16,
}

/// Advance the game state by one frame of `dt` seconds
pub fn tick(state: &mut GameState, intent: &ControlIntent, dt: f32) {
    state.events.clear();
    if !state.is_playing() {
        return;
    }

    let dt = clamp_dt(dt);
    state.consume_scheduled();
    state.time_ticks += 1;
    state.clock_ms += dt as f64 * 1000.0;

    step_controllable(state, intent, dt);
    spawn(state, intent);
    step_free(state, dt);
    resolve(state, intent, dt);

    state.normalize_order();
}
