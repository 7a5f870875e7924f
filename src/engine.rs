//! Engine orchestrator
//!
//! Owns the game state and the input aggregator. Each frame it reads intent,
//! runs one tick and publishes a fresh [`Snapshot`]. Presentation only ever
//! sees snapshots.

use crate::platform::{InputAggregator, autopilot};
use crate::settings::{ConfigError, Settings};
use crate::sim::{ControlIntent, GameState, Rules, SessionStatus, Snapshot, tick};

pub struct Engine {
    state: GameState,
    input: InputAggregator,
    last: Snapshot,
}

impl Engine {
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        let rules = settings.rules()?;
        log::info!(
            "Engine for {} (seed {:#x})",
            settings.variant.as_str(),
            settings.seed()
        );
        let mut engine = Self::from_rules(rules, settings.seed());
        if settings.autostart {
            engine.start();
        }
        Ok(engine)
    }

    /// Engine for an already validated policy table, waiting in `Idle`
    pub fn from_rules(rules: Rules, seed: u64) -> Self {
        let state = GameState::new(rules, seed);
        let last = Snapshot::capture(&state);
        Self {
            state,
            input: InputAggregator::new(),
            last,
        }
    }

    pub fn input_mut(&mut self) -> &mut InputAggregator {
        &mut self.input
    }

    pub fn start(&mut self) {
        self.state.start();
        self.last = Snapshot::capture(&self.state);
    }

    /// Back to a fresh `Playing` session; held input is forgotten
    pub fn reset(&mut self) {
        self.input.clear();
        self.state.reset();
        self.last = Snapshot::capture(&self.state);
    }

    /// One frame: drain input, tick, publish
    pub fn frame(&mut self, dt: f32) -> &Snapshot {
        let intent = self.input.intent();
        self.step(&intent, dt)
    }

    /// One tick with an explicit intent
    pub fn step(&mut self, intent: &ControlIntent, dt: f32) -> &Snapshot {
        tick(&mut self.state, intent, dt);
        self.last = Snapshot::capture(&self.state);
        &self.last
    }

    /// Let the autopilot press controls for the next frame
    pub fn drive_autopilot(&mut self) {
        autopilot::drive(&self.state, &mut self.input);
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.last
    }

    pub fn status(&self) -> SessionStatus {
        self.state.session.status
    }

    pub fn score(&self) -> u64 {
        self.state.session.score
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::REFERENCE_DT;
    use crate::settings::VariantKind;
    use crate::sim::{EntityKind, Movement};

    #[test]
    fn test_autostart_and_idle() {
        let engine = Engine::new(&Settings::for_variant(VariantKind::Whack)).unwrap();
        assert_eq!(engine.status(), SessionStatus::Playing);

        let settings = Settings {
            autostart: false,
            ..Settings::for_variant(VariantKind::Whack)
        };
        let mut engine = Engine::new(&settings).unwrap();
        assert_eq!(engine.status(), SessionStatus::Idle);
        engine.frame(REFERENCE_DT);
        assert_eq!(engine.snapshot().tick, 0);
        engine.start();
        engine.frame(REFERENCE_DT);
        assert_eq!(engine.snapshot().tick, 1);
    }

    #[test]
    fn test_frame_reads_aggregated_input() {
        let mut engine = Engine::new(&Settings::for_variant(VariantKind::Dodge)).unwrap();
        let x0 = engine.state().player().unwrap().pos.x;
        engine.input_mut().key_down("ArrowRight", false);
        engine.frame(REFERENCE_DT);
        assert!(engine.state().player().unwrap().pos.x > x0);
    }

    #[test]
    fn test_same_seed_same_snapshots() {
        let settings = Settings {
            seed: Some(1234),
            ..Settings::for_variant(VariantKind::Blaster)
        };
        let mut a = Engine::new(&settings).unwrap();
        let mut b = Engine::new(&settings).unwrap();
        for i in 0..1200u32 {
            let intent = ControlIntent {
                movement: if (i / 90) % 2 == 0 {
                    Movement::Left
                } else {
                    Movement::Right
                },
                ..ControlIntent::default()
            };
            let sa = a.step(&intent, REFERENCE_DT).clone();
            let sb = b.step(&intent, REFERENCE_DT);
            assert_eq!(&sa, sb);
        }
    }

    #[test]
    fn test_reset_clears_input_and_session() {
        let mut engine = Engine::new(&Settings::for_variant(VariantKind::Turret)).unwrap();
        engine.input_mut().key_down("ArrowLeft", false);
        for _ in 0..30 {
            engine.frame(REFERENCE_DT);
        }
        engine.reset();
        let snap = engine.snapshot();
        assert_eq!(snap.status, SessionStatus::Playing);
        assert_eq!(snap.score, 0);
        assert_eq!(snap.lives, Some(3));
        assert_eq!(snap.tick, 0);
        assert_eq!(snap.entities.len(), 1);
        assert_eq!(snap.entities[0].kind, EntityKind::Controllable);

        engine.frame(REFERENCE_DT);
        // The held key was dropped with the old session
        assert_eq!(engine.state().player().unwrap().attrs.heading, Some(crate::sim::Direction::Right));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let mut settings = Settings::for_variant(VariantKind::Dodge);
        let mut curve = crate::sim::Rules::for_variant(VariantKind::Dodge).curve;
        curve.spawn_cadence_ms.limit = -5.0;
        settings.difficulty = Some(curve);
        assert!(Engine::new(&settings).is_err());
    }
}
