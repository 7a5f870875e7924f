//! Demo autopilot
//!
//! Reads the simulation state and presses controls through the synthetic
//! input source, the same way a player would. Not meant to play well.

use crate::sim::{
    Aim, Direction, Entity, EntityKind, GameState, Movement, Response, SessionStatus,
};

use super::input::{Control, InputAggregator, Source};

/// Press whatever the autopilot wants for the coming tick
pub fn drive(state: &GameState, input: &mut InputAggregator) {
    if state.session.status != SessionStatus::Playing {
        input.release_source(Source::Synthetic);
        return;
    }

    let mut fire = false;
    let want = match (state.player(), state.rules.fire) {
        (Some(player), Some(rules)) => {
            let (want, aligned) = aim(state, player, rules.aim);
            fire = aligned;
            want
        }
        (Some(player), None) if bounces(state) => climb(state, player),
        (Some(player), None) => dodge(state, player),
        (None, _) => Movement::None,
    };

    steer(input, want);
    if fire {
        tap(input, Control::Action);
    }
    strike(state, input);
}

fn steer(input: &mut InputAggregator, want: Movement) {
    for dir in [Direction::Left, Direction::Right] {
        let control = Control::Move(dir);
        if want.direction() == Some(dir) {
            input.press(Source::Synthetic, control);
        } else {
            input.release(Source::Synthetic, control);
        }
    }
}

fn tap(input: &mut InputAggregator, control: Control) {
    input.press(Source::Synthetic, control);
    input.release(Source::Synthetic, control);
}

fn toward(from: f32, to: f32, slack: f32) -> Movement {
    if to < from - slack {
        Movement::Left
    } else if to > from + slack {
        Movement::Right
    } else {
        Movement::None
    }
}

fn targets(state: &GameState) -> impl Iterator<Item = &Entity> {
    state
        .entities
        .iter()
        .filter(|e| e.kind == EntityKind::Target)
}

/// Steer toward a target; reports whether a shot would be lined up
fn aim(state: &GameState, player: &Entity, aim: Aim) -> (Movement, bool) {
    let center = player.center();
    match aim {
        Aim::Up => {
            let lowest = targets(state).max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));
            let want = lowest.map_or(Movement::None, |t| toward(center.x, t.center().x, 4.0));
            (want, false)
        }
        Aim::Facing => {
            let nearest = targets(state).min_by(|a, b| {
                (a.center().x - center.x)
                    .abs()
                    .total_cmp(&(b.center().x - center.x).abs())
            });
            let Some(target) = nearest else {
                return (Movement::None, false);
            };
            let side = if target.center().x < center.x {
                Direction::Left
            } else {
                Direction::Right
            };
            (Movement::from(side), player.attrs.heading == Some(side))
        }
    }
}

fn bounces(state: &GameState) -> bool {
    state
        .rules
        .pairs
        .iter()
        .any(|p| matches!(p.response, Response::Bounce { .. }))
}

/// Head for the nearest platform below while falling, above while rising
fn climb(state: &GameState, player: &Entity) -> Movement {
    let center = player.center();
    let falling = player.vel.y > 0.0;
    let platform = state
        .entities
        .iter()
        .filter(|e| e.kind == EntityKind::Platform)
        .filter(|e| (e.pos.y >= player.bottom()) == falling)
        .min_by(|a, b| {
            (a.pos.y - player.bottom())
                .abs()
                .total_cmp(&(b.pos.y - player.bottom()).abs())
        });
    platform.map_or(Movement::None, |p| toward(center.x, p.center().x, 6.0))
}

/// Sidestep the closest harmful entity falling into the player's column
fn dodge(state: &GameState, player: &Entity) -> Movement {
    let harmful: Vec<EntityKind> = state
        .rules
        .pairs
        .iter()
        .filter(|p| p.response == Response::Harm && p.first == EntityKind::Controllable)
        .map(|p| p.second)
        .collect();
    let margin = player.size.x * 0.5;
    let threat = state
        .entities
        .iter()
        .filter(|e| harmful.contains(&e.kind) && e.bottom() <= player.bottom())
        .filter(|e| {
            e.pos.x < player.pos.x + player.size.x + margin
                && e.pos.x + e.size.x > player.pos.x - margin
        })
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

    let Some(threat) = threat else {
        return Movement::None;
    };
    let room_left = threat.pos.x;
    let room_right = state.rules.board.x - (threat.pos.x + threat.size.x);
    if room_left > room_right {
        Movement::Left
    } else {
        Movement::Right
    }
}

/// Strike the lowest reachable non-variant entity in each lane
fn strike(state: &GameState, input: &mut InputAggregator) {
    let Some(rules) = state.rules.strike else {
        return;
    };
    let ready_line = state.rules.board.y * 0.4;
    for e in state.entities.iter().filter(|e| e.kind == rules.kind) {
        let Some(lane) = e.attrs.lane else {
            continue;
        };
        let reachable = rules.reach.is_none_or(|reach| e.pos.y >= reach);
        let worthwhile = rules.reach.is_none() || e.pos.y >= ready_line;
        if reachable && worthwhile && !e.attrs.variant {
            tap(input, Control::Lane(lane));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::VariantKind;
    use crate::sim::{Attributes, ControlIntent, Rules, tick};
    use glam::Vec2;

    fn playing(kind: VariantKind) -> GameState {
        let mut state = GameState::new(Rules::for_variant(kind), 17);
        state.start();
        state
    }

    #[test]
    fn test_dodges_falling_hazard() {
        let mut state = playing(VariantKind::Dodge);
        let player = state.player().unwrap().pos;
        state.insert(
            EntityKind::Hazard,
            Vec2::new(player.x + 10.0, 100.0),
            Vec2::splat(45.0),
            Vec2::new(0.0, 360.0),
            Attributes::default(),
        );
        let mut input = InputAggregator::new();
        drive(&state, &mut input);
        assert_ne!(input.intent().movement, Movement::None);
    }

    #[test]
    fn test_turret_faces_then_fires() {
        let mut state = playing(VariantKind::Turret);
        state.insert(
            EntityKind::Target,
            Vec2::new(0.0, 240.0),
            Vec2::splat(40.0),
            Vec2::new(66.0, 0.0),
            Attributes::default(),
        );
        let mut input = InputAggregator::new();
        drive(&state, &mut input);
        let intent = input.intent();
        assert_eq!(intent.movement, Movement::Left);
        assert!(!intent.action_pulse);

        tick(&mut state, &intent, 1.0 / 60.0);
        drive(&state, &mut input);
        assert!(input.intent().action_pulse);
    }

    #[test]
    fn test_whack_skips_bad_targets() {
        let mut state = playing(VariantKind::Whack);
        for (cell, variant) in [(2u8, false), (5u8, true)] {
            state.insert(
                EntityKind::Target,
                Vec2::ZERO,
                Vec2::splat(80.0),
                Vec2::ZERO,
                Attributes {
                    lane: Some(cell),
                    variant,
                    ..Attributes::default()
                },
            );
        }
        let mut input = InputAggregator::new();
        drive(&state, &mut input);
        assert_eq!(input.intent().lane_pulses, 1 << 2);
    }

    #[test]
    fn test_releases_after_game_over() {
        let mut state = playing(VariantKind::Dodge);
        let mut input = InputAggregator::new();
        input.press(Source::Synthetic, Control::Move(Direction::Left));
        state.set_status(SessionStatus::GameOver);
        drive(&state, &mut input);
        assert_eq!(input.intent(), ControlIntent::default());
    }

    #[test]
    fn test_autopilot_survives_a_while() {
        for kind in VariantKind::ALL {
            let mut state = playing(kind);
            let mut input = InputAggregator::new();
            for _ in 0..600 {
                drive(&state, &mut input);
                let intent = input.intent();
                tick(&mut state, &intent, 1.0 / 60.0);
            }
            assert!(state.entities.iter().all(|e| e.is_finite()), "{kind:?}");
        }
    }
}
