//! Data-driven difficulty curves
//!
//! `tuning(curve, score)` is a pure function of score. Every output field is a
//! [`Ramp`] clamped at its limit and again at an engine-wide floor/ceiling, so
//! no score can produce a zero or negative spawn cadence.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::ConfigError;

/// A linear ramp over difficulty level that stops at `limit`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ramp {
    pub base: f32,
    pub per_level: f32,
    pub limit: f32,
}

impl Ramp {
    pub const fn new(base: f32, per_level: f32, limit: f32) -> Self {
        Self {
            base,
            per_level,
            limit,
        }
    }

    /// Flat ramp
    pub const fn constant(value: f32) -> Self {
        Self::new(value, 0.0, value)
    }

    /// Value at `level`; flat once the limit is reached
    pub fn at(&self, level: f32) -> f32 {
        let raw = self.base + self.per_level * level;
        if self.per_level < 0.0 {
            raw.max(self.limit)
        } else {
            raw.min(self.limit)
        }
    }

    fn check(&self, field: &'static str) -> Result<(), ConfigError> {
        let finite = self.base.is_finite() && self.per_level.is_finite() && self.limit.is_finite();
        if !finite {
            return Err(ConfigError::invalid(field, "ramp values must be finite"));
        }
        let heads_to_limit = if self.per_level < 0.0 {
            self.limit <= self.base
        } else if self.per_level > 0.0 {
            self.limit >= self.base
        } else {
            true
        };
        if !heads_to_limit {
            return Err(ConfigError::invalid(
                field,
                format!(
                    "limit {} is behind base {} for slope {}",
                    self.limit, self.base, self.per_level
                ),
            ));
        }
        Ok(())
    }
}

/// How score maps to difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Escalation {
    /// Level equals score
    Linear,
    /// Level rises by one every `every` points
    Stepped { every: u64 },
}

/// Per-variant difficulty curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyCurve {
    pub escalation: Escalation,
    /// Level cap, applied before the ramps
    #[serde(default)]
    pub max_level: Option<u32>,
    pub spawn_cadence_ms: Ramp,
    /// Vertical gap for stacked spawners
    #[serde(default)]
    pub spawn_spacing: Ramp,
    pub entity_speed: Ramp,
    pub entity_size: Ramp,
    #[serde(default)]
    pub entity_lifetime_ms: Ramp,
    /// Probability that a spawn is the variant (armoured, bad, moving...)
    #[serde(default)]
    pub variant_chance: Ramp,
}

/// Tuning parameters in effect for a given score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tuning {
    pub level: f32,
    pub spawn_cadence_ms: f32,
    pub spawn_spacing: f32,
    pub entity_speed: f32,
    pub entity_size: f32,
    pub entity_lifetime_ms: f32,
    pub variant_chance: f32,
}

impl DifficultyCurve {
    /// Difficulty level reached at `score`
    pub fn level(&self, score: u64) -> f32 {
        let level = match self.escalation {
            Escalation::Linear => score as f32,
            Escalation::Stepped { every } => (score / every.max(1)) as f32,
        };
        match self.max_level {
            Some(cap) => level.min(cap as f32),
            None => level,
        }
    }

    pub fn tuning(&self, score: u64) -> Tuning {
        let level = self.level(score);
        Tuning {
            level,
            spawn_cadence_ms: self.spawn_cadence_ms.at(level).max(MIN_SPAWN_CADENCE_MS),
            spawn_spacing: self.spawn_spacing.at(level).max(0.0),
            entity_speed: self.entity_speed.at(level).clamp(0.0, MAX_ENTITY_SPEED),
            entity_size: self.entity_size.at(level).max(MIN_ENTITY_SIZE),
            entity_lifetime_ms: self.entity_lifetime_ms.at(level).max(MIN_ENTITY_LIFETIME_MS),
            variant_chance: self.variant_chance.at(level).clamp(0.0, 1.0),
        }
    }

    /// Reject curves that escalate the wrong way or carry degenerate limits
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Escalation::Stepped { every: 0 } = self.escalation {
            return Err(ConfigError::invalid("escalation.every", "must be at least 1"));
        }
        self.spawn_cadence_ms.check("spawn_cadence_ms")?;
        self.spawn_spacing.check("spawn_spacing")?;
        self.entity_speed.check("entity_speed")?;
        self.entity_size.check("entity_size")?;
        self.entity_lifetime_ms.check("entity_lifetime_ms")?;
        self.variant_chance.check("variant_chance")?;

        if self.spawn_cadence_ms.per_level > 0.0 {
            return Err(ConfigError::invalid(
                "spawn_cadence_ms",
                "cadence may only shrink as score grows",
            ));
        }
        if self.spawn_cadence_ms.limit <= 0.0 || self.spawn_cadence_ms.base <= 0.0 {
            return Err(ConfigError::invalid(
                "spawn_cadence_ms",
                "cadence base and floor must be positive",
            ));
        }
        if self.entity_lifetime_ms.per_level > 0.0 {
            return Err(ConfigError::invalid(
                "entity_lifetime_ms",
                "lifetime may only shrink as score grows",
            ));
        }
        Ok(())
    }
}

/// Tuning for `score` under `curve`
pub fn tuning(curve: &DifficultyCurve, score: u64) -> Tuning {
    curve.tuning(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dodge_curve() -> DifficultyCurve {
        DifficultyCurve {
            escalation: Escalation::Linear,
            max_level: None,
            spawn_cadence_ms: Ramp::new(1000.0, -50.0, 300.0),
            spawn_spacing: Ramp::default(),
            entity_speed: Ramp::constant(360.0),
            entity_size: Ramp::constant(45.0),
            entity_lifetime_ms: Ramp::default(),
            variant_chance: Ramp::default(),
        }
    }

    #[test]
    fn test_linear_cadence_reaches_floor() {
        let curve = dodge_curve();
        assert_eq!(tuning(&curve, 0).spawn_cadence_ms, 1000.0);
        assert_eq!(tuning(&curve, 10).spawn_cadence_ms, 500.0);
        assert_eq!(tuning(&curve, 20).spawn_cadence_ms, 300.0);
        assert_eq!(tuning(&curve, 1_000_000).spawn_cadence_ms, 300.0);
    }

    #[test]
    fn test_stepped_escalation() {
        let curve = DifficultyCurve {
            escalation: Escalation::Stepped { every: 50 },
            spawn_cadence_ms: Ramp::new(1500.0, -200.0, 500.0),
            entity_speed: Ramp::new(4.0, 1.0, 10.0),
            ..dodge_curve()
        };
        assert_eq!(curve.tuning(40).spawn_cadence_ms, 1500.0);
        assert_eq!(curve.tuning(50).spawn_cadence_ms, 1300.0);
        assert_eq!(curve.tuning(50).entity_speed, 5.0);
        assert_eq!(curve.tuning(5000).spawn_cadence_ms, 500.0);
        assert_eq!(curve.tuning(5000).entity_speed, 10.0);
    }

    #[test]
    fn test_level_cap() {
        let curve = DifficultyCurve {
            escalation: Escalation::Stepped { every: 3 },
            max_level: Some(10),
            spawn_cadence_ms: Ramp::new(1200.0, -60.0, 500.0),
            entity_lifetime_ms: Ramp::new(900.0, -40.0, 350.0),
            ..dodge_curve()
        };
        // Level 10 is reached at score 30 and never passed
        assert_eq!(curve.tuning(30).spawn_cadence_ms, 600.0);
        assert_eq!(curve.tuning(300).spawn_cadence_ms, 600.0);
        assert_eq!(curve.tuning(300).entity_lifetime_ms, 500.0);
    }

    #[test]
    fn test_engine_floor_beats_curve() {
        let curve = DifficultyCurve {
            spawn_cadence_ms: Ramp::new(1000.0, -50.0, 1.0),
            entity_speed: Ramp::new(100.0, 1000.0, 1.0e9),
            ..dodge_curve()
        };
        let t = curve.tuning(u64::MAX);
        assert_eq!(t.spawn_cadence_ms, MIN_SPAWN_CADENCE_MS);
        assert_eq!(t.entity_speed, MAX_ENTITY_SPEED);
    }

    #[test]
    fn test_validate_rejects_growing_cadence() {
        let curve = DifficultyCurve {
            spawn_cadence_ms: Ramp::new(300.0, 50.0, 1000.0),
            ..dodge_curve()
        };
        assert!(curve.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_step() {
        let curve = DifficultyCurve {
            escalation: Escalation::Stepped { every: 0 },
            ..dodge_curve()
        };
        assert!(curve.validate().is_err());
        assert!(dodge_curve().validate().is_ok());
    }

    proptest! {
        #[test]
        fn prop_cadence_monotonic_and_floored(s1 in 0u64..100_000, delta in 0u64..100_000) {
            let curve = dodge_curve();
            let s2 = s1 + delta;
            let a = curve.tuning(s1);
            let b = curve.tuning(s2);
            prop_assert!(b.spawn_cadence_ms <= a.spawn_cadence_ms);
            prop_assert!(b.spawn_cadence_ms >= 300.0);
            prop_assert!(a.spawn_cadence_ms >= MIN_SPAWN_CADENCE_MS);
        }

        #[test]
        fn prop_fields_clamped(
            base in 1.0f32..5000.0,
            slope in -500.0f32..0.0,
            floor in 1.0f32..1000.0,
            score in 0u64..1_000_000,
        ) {
            let curve = DifficultyCurve {
                spawn_cadence_ms: Ramp::new(base, slope, floor.min(base)),
                variant_chance: Ramp::new(0.2, 0.01, 5.0),
                ..dodge_curve()
            };
            let t = curve.tuning(score);
            prop_assert!(t.spawn_cadence_ms >= MIN_SPAWN_CADENCE_MS);
            prop_assert!(t.spawn_cadence_ms.is_finite());
            prop_assert!((0.0..=1.0).contains(&t.variant_chance));
        }
    }
}
