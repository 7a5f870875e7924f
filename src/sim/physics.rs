//! Physics integration
//!
//! The controllable is stepped first, straight from intent. Free entities are
//! stepped after spawning so a fresh spawn moves on its first tick.

use glam::Vec2;

use super::rules::{EdgePolicy, MovementPolicy};
use super::state::{EntityKind, GameState};
use super::tick::ControlIntent;
use crate::consts::REFERENCE_DT;

/// Apply intent, gravity and edge policy to the controllable, then run the camera
pub fn step_controllable(state: &mut GameState, intent: &ControlIntent, dt: f32) {
    let Some(rules) = state.rules.player else {
        return;
    };
    let board = state.rules.board;
    let Some(player) = state.player_mut() else {
        return;
    };
    let before = (player.pos, player.vel);

    match rules.movement {
        MovementPolicy::Direct { speed } => {
            player.vel.x = intent.movement.sign() * speed;
        }
        MovementPolicy::Friction { speed, decay } => match intent.movement.direction() {
            Some(dir) => player.vel.x = dir.sign() * speed,
            // Decay is per reference frame
            None => player.vel.x *= decay.powf(dt / REFERENCE_DT),
        },
        MovementPolicy::Turn => {
            if let Some(dir) = intent.movement.direction() {
                player.attrs.heading = Some(dir);
            }
            player.vel = Vec2::ZERO;
        }
    }

    player.vel.y += rules.gravity * dt;
    player.pos += player.vel * dt;

    match rules.edges {
        EdgePolicy::Clamp => {
            player.pos.x = player.pos.x.clamp(0.0, (board.x - player.size.x).max(0.0));
        }
        EdgePolicy::Wrap => {
            if player.pos.x > board.x {
                player.pos.x = -player.size.x;
            } else if player.pos.x < -player.size.x {
                player.pos.x = board.x;
            }
        }
    }

    if !player.is_finite() {
        log::warn!("Controllable left finite space, restoring previous step");
        (player.pos, player.vel) = before;
    }

    scroll_camera(state);
}

/// Keep the controllable at or below the camera anchor. Climbing past it moves
/// everything else down and counts as distance.
fn scroll_camera(state: &mut GameState) {
    let Some(camera) = state.rules.camera else {
        return;
    };
    let Some(player) = state.player_mut() else {
        return;
    };
    if player.pos.y >= camera.anchor {
        return;
    }
    let offset = camera.anchor - player.pos.y;
    player.pos.y = camera.anchor;

    for entity in state
        .entities
        .iter_mut()
        .filter(|e| e.kind != EntityKind::Controllable)
    {
        entity.pos.y += offset;
    }

    state.session.distance += offset;
    let reached = (state.session.distance / camera.distance_per_point).floor() as u64;
    if reached > state.session.score {
        state.add_score(reached - state.session.score);
    }
}

/// Integrate every non-controllable entity and count down lifetimes
pub fn step_free(state: &mut GameState, dt: f32) {
    let gravity = state.rules.gravity;
    let width = state.rules.board.x;
    let dt_ms = dt * 1000.0;
    let patrol_speed = state.session.tuning.entity_speed;

    for entity in state
        .entities
        .iter_mut()
        .filter(|e| e.kind != EntityKind::Controllable)
    {
        // Patrollers follow the current tuning, not the one they spawned with
        if entity.attrs.patrol {
            entity.vel.x = entity.vel.x.signum() * patrol_speed;
        }
        entity.vel.y += gravity * dt;
        entity.pos += entity.vel * dt;

        if entity.attrs.patrol {
            if entity.pos.x <= 0.0 {
                entity.pos.x = 0.0;
                entity.vel.x = entity.vel.x.abs();
            } else if entity.pos.x + entity.size.x >= width {
                entity.pos.x = (width - entity.size.x).max(0.0);
                entity.vel.x = -entity.vel.x.abs();
            }
        }

        if let Some(ttl) = entity.attrs.ttl_ms.as_mut() {
            *ttl -= dt_ms;
        }
    }

    state.entities.retain(|e| {
        let ok = e.is_finite();
        if !ok {
            log::warn!("Dropping entity {:?} with non-finite state", e.id);
        }
        ok
    });
}
