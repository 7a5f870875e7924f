//! Spawner
//!
//! Materializes entities on the tuned cadence and fires projectiles. Every
//! random choice goes through the session RNG, and every index it draws is
//! taken from a range built from the current lane or cell count.

use glam::Vec2;
use rand::Rng;

use super::rules::{Aim, FireTrigger, Placement, SpawnRules, SpawnSchedule, VariantRules};
use super::state::{Attributes, Direction, EntityKind, GameState};
use super::tick::ControlIntent;

/// Spawn check for this tick. Does nothing unless the session is playing.
pub fn spawn(state: &mut GameState, intent: &ControlIntent) {
    if !state.is_playing() {
        return;
    }

    let rules = state.rules.spawn;
    match rules.schedule {
        SpawnSchedule::Timed => {
            let cadence = state.session.tuning.spawn_cadence_ms as f64;
            if state.clock_ms - state.session.last_spawn_ms > cadence {
                spawn_timed(state, &rules);
                state.session.last_spawn_ms = state.clock_ms;
            }
        }
        SpawnSchedule::Stack { count, floor } => fill_stack(state, &rules, count, floor),
    }

    fire(state, intent);
}

/// Roll whether the next spawn is the variant
fn roll_variant(state: &mut GameState, variant: Option<VariantRules>) -> Option<VariantRules> {
    let v = variant?;
    if state.session.score < v.min_score {
        return None;
    }
    if v.never_consecutive && state.session.last_variant {
        return None;
    }
    let chance = state.session.tuning.variant_chance as f64;
    state.rng.random_bool(chance).then_some(v)
}

fn spawn_timed(state: &mut GameState, rules: &SpawnRules) {
    let tuning = state.session.tuning;
    let board = state.rules.board;
    let variant = roll_variant(state, rules.variant);
    let scale = variant.map_or(1.0, |v| v.scale);
    let width = tuning.entity_size * scale;
    let size = Vec2::new(width, rules.height.unwrap_or(width) * scale);
    let speed = tuning.entity_speed;

    let mut attrs = Attributes {
        hit_points: variant.map_or(rules.hit_points, |v| v.hit_points),
        variant: variant.is_some(),
        ttl_ms: state.rules.expiry.map(|_| tuning.entity_lifetime_ms),
        ..Attributes::default()
    };

    let (pos, mut vel) = match rules.placement {
        Placement::Lanes { count } => {
            let count = count.max(1);
            let lane = state.rng.random_range(0..count);
            let lane_w = board.x / count as f32;
            let x = lane as f32 * lane_w + (lane_w - size.x) / 2.0;
            attrs.lane = Some(lane);
            (
                Vec2::new(x.clamp(0.0, (board.x - size.x).max(0.0)), -size.y),
                Vec2::new(0.0, speed),
            )
        }
        Placement::Scatter => {
            let x = state.rng.random_range(0.0..=(board.x - size.x).max(0.0));
            (Vec2::new(x, -size.y), Vec2::new(0.0, speed))
        }
        Placement::Sides => {
            let heading = if state.rng.random_bool(0.5) {
                Direction::Right
            } else {
                Direction::Left
            };
            let x = match heading {
                Direction::Right => 0.0,
                Direction::Left => board.x - size.x,
            };
            attrs.heading = Some(heading);
            (
                Vec2::new(x, (board.y - size.y) / 2.0),
                Vec2::new(heading.sign() * speed, 0.0),
            )
        }
        Placement::Grid { columns, rows } => {
            let columns = columns.max(1);
            let cells = columns as u16 * rows.max(1) as u16;
            let cell = state.rng.random_range(0..cells);
            let (col, row) = (cell % columns as u16, cell / columns as u16);
            let cell_size = Vec2::new(board.x / columns as f32, board.y / rows.max(1) as f32);
            let origin = Vec2::new(col as f32, row as f32) * cell_size;
            attrs.lane = Some(cell as u8);
            (origin + (cell_size - size) / 2.0, Vec2::ZERO)
        }
    };

    if variant.is_some_and(|v| v.patrol) {
        vel.x = patrol_velocity(state, speed);
        attrs.patrol = true;
    }

    if rules.single {
        state.entities.retain(|e| e.kind != rules.kind);
    }
    state.session.last_variant = variant.is_some();
    state.insert(rules.kind, pos, size, vel, attrs);
}

fn patrol_velocity(state: &mut GameState, speed: f32) -> f32 {
    if state.rng.random_bool(0.5) { speed } else { -speed }
}

/// Keep `count` entities stacked upward from `floor`
fn fill_stack(state: &mut GameState, rules: &SpawnRules, count: usize, floor: Vec2) {
    let board = state.rules.board;
    loop {
        let tuning = state.session.tuning;
        let (live, top) = state
            .entities
            .iter()
            .filter(|e| e.kind == rules.kind)
            .fold((0usize, f32::INFINITY), |(n, top), e| (n + 1, top.min(e.pos.y)));
        if live >= count {
            break;
        }

        let width = tuning.entity_size;
        let size = Vec2::new(width, rules.height.unwrap_or(width));
        if live == 0 {
            state.session.last_variant = false;
            state.insert(rules.kind, floor, size, Vec2::ZERO, Attributes::default());
            continue;
        }

        let variant = roll_variant(state, rules.variant);
        let x = state.rng.random_range(0.0..=(board.x - size.x).max(0.0));
        let mut vel = Vec2::ZERO;
        let mut attrs = Attributes {
            hit_points: variant.map_or(rules.hit_points, |v| v.hit_points),
            variant: variant.is_some(),
            ..Attributes::default()
        };
        if variant.is_some_and(|v| v.patrol) {
            vel.x = patrol_velocity(state, tuning.entity_speed);
            attrs.patrol = true;
        }
        state.session.last_variant = variant.is_some();
        let y = top - tuning.spawn_spacing;
        state.insert(rules.kind, Vec2::new(x, y), size, vel, attrs);
    }
}

/// Fire a projectile from the controllable if the trigger allows it
fn fire(state: &mut GameState, intent: &ControlIntent) {
    let Some(fire) = state.rules.fire else {
        return;
    };
    let now = state.clock_ms;
    let ready = match fire.trigger {
        FireTrigger::Auto { every_ms } => {
            now - state.session.last_fire_ms.unwrap_or(0.0) >= every_ms
        }
        FireTrigger::Pulse { cooldown_ms } => {
            intent.action_pulse
                && state
                    .session
                    .last_fire_ms
                    .is_none_or(|last| now - last >= cooldown_ms)
        }
    };
    if !ready {
        return;
    }
    let Some(player) = state.player() else {
        return;
    };

    let center = player.center();
    let (pos, vel, heading) = match fire.aim {
        Aim::Up => (
            Vec2::new(center.x - fire.size.x / 2.0, player.pos.y - fire.size.y),
            Vec2::new(0.0, -fire.speed),
            None,
        ),
        Aim::Facing => {
            let dir = player.attrs.heading.unwrap_or(Direction::Right);
            (
                center - fire.size / 2.0,
                Vec2::new(dir.sign() * fire.speed, 0.0),
                Some(dir),
            )
        }
    };
    let attrs = Attributes {
        heading,
        ..Attributes::default()
    };
    state.insert(EntityKind::Projectile, pos, fire.size, vel, attrs);
    state.session.last_fire_ms = Some(now);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::VariantKind;
    use crate::sim::rules::Rules;

    fn playing(kind: VariantKind, seed: u64) -> GameState {
        let mut state = GameState::new(Rules::for_variant(kind), seed);
        state.start();
        state
    }

    fn count(state: &GameState, kind: EntityKind) -> usize {
        state.entities.iter().filter(|e| e.kind == kind).count()
    }

    #[test]
    fn test_never_spawns_unless_playing() {
        let mut state = GameState::new(Rules::for_variant(VariantKind::Dodge), 3);
        state.clock_ms = 10_000.0;
        spawn(&mut state, &ControlIntent::default());
        assert_eq!(count(&state, EntityKind::Hazard), 0);

        state.start();
        state.set_status(crate::sim::state::SessionStatus::GameOver);
        spawn(&mut state, &ControlIntent::default());
        assert_eq!(count(&state, EntityKind::Hazard), 0);
    }

    #[test]
    fn test_timed_spawn_respects_cadence() {
        let mut state = playing(VariantKind::Dodge, 3);
        state.clock_ms = 999.0;
        spawn(&mut state, &ControlIntent::default());
        assert_eq!(count(&state, EntityKind::Hazard), 0);

        state.clock_ms = 1001.0;
        spawn(&mut state, &ControlIntent::default());
        assert_eq!(count(&state, EntityKind::Hazard), 1);
        assert_eq!(state.session.last_spawn_ms, 1001.0);

        // Exactly one per elapsed cadence
        spawn(&mut state, &ControlIntent::default());
        assert_eq!(count(&state, EntityKind::Hazard), 1);
    }

    #[test]
    fn test_lane_spawns_stay_in_lanes() {
        let mut state = playing(VariantKind::Dodge, 11);
        for i in 1..=200 {
            state.clock_ms = i as f64 * 1001.0;
            spawn(&mut state, &ControlIntent::default());
        }
        let mut seen = [false; 6];
        for hazard in state.entities.iter().filter(|e| e.kind == EntityKind::Hazard) {
            let lane = hazard.attrs.lane.unwrap() as usize;
            assert!(lane < 6);
            seen[lane] = true;
            assert!(hazard.pos.x >= 0.0 && hazard.pos.x + hazard.size.x <= 340.0);
            assert!(hazard.bottom() <= 0.0);
        }
        assert!(seen.iter().all(|s| *s), "uniform lanes should all appear");
    }

    #[test]
    fn test_variant_share_in_band() {
        let mut state = playing(VariantKind::Turret, 5);
        let mut variants = 0;
        let n = 2000;
        for i in 1..=n {
            state.clock_ms = i as f64 * 2000.0;
            spawn(&mut state, &ControlIntent::default());
            let last = state.entities.last().unwrap();
            if last.attrs.variant {
                variants += 1;
                assert_eq!(last.attrs.hit_points, 2);
                assert!(last.size.x > 40.0);
            }
        }
        let share = variants as f64 / n as f64;
        assert!((0.28..=0.42).contains(&share), "variant share {share}");
    }

    #[test]
    fn test_single_replaces_previous() {
        let mut state = playing(VariantKind::Whack, 9);
        for i in 1..=5 {
            state.clock_ms = i as f64 * 1300.0;
            spawn(&mut state, &ControlIntent::default());
        }
        assert_eq!(count(&state, EntityKind::Target), 1);
        let mole = &state.entities[0];
        assert!(mole.attrs.lane.unwrap() < 9);
        assert_eq!(mole.attrs.ttl_ms, Some(900.0));
        assert_eq!(mole.vel, Vec2::ZERO);
    }

    #[test]
    fn test_stack_fills_upward_from_floor() {
        let mut state = playing(VariantKind::Jumper, 4);
        spawn(&mut state, &ControlIntent::default());
        let platforms: Vec<_> = state
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Platform)
            .collect();
        assert_eq!(platforms.len(), 7);
        assert_eq!(platforms[0].pos, Vec2::new(135.0, 440.0));
        for pair in platforms.windows(2) {
            assert!((pair[0].pos.y - pair[1].pos.y - 90.0).abs() < 1e-3);
        }
        // No moving platforms before score 101
        assert!(platforms.iter().all(|p| !p.attrs.patrol));
    }

    #[test]
    fn test_moving_platforms_never_consecutive() {
        let mut state = playing(VariantKind::Jumper, 8);
        state.session.score = 400;
        state.session.tuning = state.rules.curve.tuning(400);
        for _ in 0..50 {
            spawn(&mut state, &ControlIntent::default());
            // Drop the lowest platform so the stack refills
            let lowest = state
                .entities
                .iter()
                .filter(|e| e.kind == EntityKind::Platform)
                .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
                .map(|e| e.id)
                .unwrap();
            state.entities.retain(|e| e.id != lowest);
        }
        let platforms: Vec<_> = state
            .entities
            .iter()
            .filter(|e| e.kind == EntityKind::Platform)
            .collect();
        for pair in platforms.windows(2) {
            assert!(!(pair[0].attrs.patrol && pair[1].attrs.patrol));
        }
        assert!(platforms.iter().any(|p| p.attrs.patrol));
    }

    #[test]
    fn test_auto_fire_interval() {
        let mut state = playing(VariantKind::Blaster, 1);
        state.session.last_spawn_ms = f64::MAX;
        state.clock_ms = 500.0;
        spawn(&mut state, &ControlIntent::default());
        assert_eq!(count(&state, EntityKind::Projectile), 0);
        state.clock_ms = 600.0;
        spawn(&mut state, &ControlIntent::default());
        assert_eq!(count(&state, EntityKind::Projectile), 1);
        let shot = state.entities.last().unwrap();
        assert!(shot.vel.y < 0.0);
        assert_eq!(shot.bottom(), state.player().unwrap().pos.y);
    }

    #[test]
    fn test_pulse_fire_cooldown_and_facing() {
        let mut state = playing(VariantKind::Turret, 1);
        state.session.last_spawn_ms = f64::MAX;
        let pulse = ControlIntent {
            action_pulse: true,
            ..ControlIntent::default()
        };

        spawn(&mut state, &ControlIntent::default());
        assert_eq!(count(&state, EntityKind::Projectile), 0);

        spawn(&mut state, &pulse);
        assert_eq!(count(&state, EntityKind::Projectile), 1);

        state.clock_ms = 100.0;
        spawn(&mut state, &pulse);
        assert_eq!(count(&state, EntityKind::Projectile), 1);

        state.clock_ms = 250.0;
        state.player_mut().unwrap().attrs.heading = Some(Direction::Left);
        spawn(&mut state, &pulse);
        assert_eq!(count(&state, EntityKind::Projectile), 2);
        assert!(state.entities.last().unwrap().vel.x < 0.0);
    }
}
