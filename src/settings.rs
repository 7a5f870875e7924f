//! Variant selection and configuration
//!
//! Read once at startup from a JSON file (native) or a `data-arcade` attribute
//! (web). Nothing is persisted; every session starts from the same constants.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::DEFAULT_SEED;
use crate::sim::Rules;
use crate::tuning::DifficultyCurve;

/// Configuration failures. The simulation itself never errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown game variant `{0}`")]
    UnknownVariant(String),

    #[error("malformed settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Which game the engine runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    /// Lanes of falling hazards
    #[default]
    Dodge,
    /// Vertical auto-firing shooter
    Blaster,
    /// Stationary turret shooting left and right
    Turret,
    /// Endless platform climber
    Jumper,
    /// Falling-tile rhythm game
    Tiles,
    /// Whack-a-mole grid
    Whack,
}

impl VariantKind {
    pub const ALL: [VariantKind; 6] = [
        VariantKind::Dodge,
        VariantKind::Blaster,
        VariantKind::Turret,
        VariantKind::Jumper,
        VariantKind::Tiles,
        VariantKind::Whack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariantKind::Dodge => "dodge",
            VariantKind::Blaster => "blaster",
            VariantKind::Turret => "turret",
            VariantKind::Jumper => "jumper",
            VariantKind::Tiles => "tiles",
            VariantKind::Whack => "whack",
        }
    }
}

impl FromStr for VariantKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dodge" => Ok(VariantKind::Dodge),
            "blaster" | "shoot" | "shooter" => Ok(VariantKind::Blaster),
            "turret" => Ok(VariantKind::Turret),
            "jumper" | "jump" => Ok(VariantKind::Jumper),
            "tiles" | "piano" => Ok(VariantKind::Tiles),
            "whack" | "mole" => Ok(VariantKind::Whack),
            _ => Err(ConfigError::UnknownVariant(s.to_string())),
        }
    }
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub variant: VariantKind,
    /// RNG seed; [`DEFAULT_SEED`] when unset
    pub seed: Option<u64>,
    /// Start in `Playing` instead of waiting in `Idle`
    pub autostart: bool,
    /// Replaces the variant's built-in difficulty curve
    pub difficulty: Option<DifficultyCurve>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            variant: VariantKind::default(),
            seed: None,
            autostart: true,
            difficulty: None,
        }
    }
}

impl Settings {
    pub fn for_variant(variant: VariantKind) -> Self {
        Self {
            variant,
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.rules()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Read settings from the `data-arcade` attribute of the board element
    #[cfg(target_arch = "wasm32")]
    pub fn from_document(board_id: &str) -> Result<Self, ConfigError> {
        let attr = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(board_id))
            .and_then(|el| el.get_attribute("data-arcade"));

        match attr {
            Some(json) => {
                let settings = Self::from_json(&json)?;
                log::info!("Loaded settings for {}", settings.variant.as_str());
                Ok(settings)
            }
            None => {
                log::info!("Using default settings");
                Ok(Self::default())
            }
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed.unwrap_or(DEFAULT_SEED)
    }

    /// Build and validate the policy table for this configuration
    pub fn rules(&self) -> Result<Rules, ConfigError> {
        let mut rules = Rules::for_variant(self.variant);
        if let Some(curve) = &self.difficulty {
            rules.curve = curve.clone();
        }
        rules.validate()?;
        Ok(rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_from_str() {
        assert_eq!("Dodge".parse::<VariantKind>().ok(), Some(VariantKind::Dodge));
        assert_eq!("piano".parse::<VariantKind>().ok(), Some(VariantKind::Tiles));
        assert!(matches!(
            "chess".parse::<VariantKind>(),
            Err(ConfigError::UnknownVariant(_))
        ));
        for kind in VariantKind::ALL {
            assert_eq!(kind.as_str().parse::<VariantKind>().ok(), Some(kind));
        }
    }

    #[test]
    fn test_defaults_from_empty_json() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert!(settings.autostart);
        assert_eq!(settings.seed(), DEFAULT_SEED);
    }

    #[test]
    fn test_from_json_overrides() {
        let settings =
            Settings::from_json(r#"{"variant":"whack","seed":7,"autostart":false}"#).unwrap();
        assert_eq!(settings.variant, VariantKind::Whack);
        assert_eq!(settings.seed(), 7);
        assert!(!settings.autostart);
    }

    #[test]
    fn test_difficulty_override_is_validated() {
        let json = r#"{
            "variant": "dodge",
            "difficulty": {
                "escalation": {"mode": "linear"},
                "spawn_cadence_ms": {"base": 800.0, "per_level": -20.0, "limit": 0.0},
                "entity_speed": {"base": 300.0, "per_level": 0.0, "limit": 300.0},
                "entity_size": {"base": 40.0, "per_level": 0.0, "limit": 40.0}
            }
        }"#;
        assert!(matches!(
            Settings::from_json(json),
            Err(ConfigError::Invalid { field: "spawn_cadence_ms", .. })
        ));

        let ok = json.replace(r#""limit": 0.0"#, r#""limit": 250.0"#);
        let settings = Settings::from_json(&ok).unwrap();
        let rules = settings.rules().unwrap();
        assert_eq!(rules.curve.tuning(0).spawn_cadence_ms, 800.0);
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            Settings::from_json("{variant"),
            Err(ConfigError::Json(_))
        ));
        assert!(matches!(
            Settings::from_json(r#"{"variant":"chess"}"#),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load(std::path::Path::new("/nonexistent/arcade.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
