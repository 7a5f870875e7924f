//! Neon Arcade - real-time arcade simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, physics, collisions, session state)
//! - `tuning`: Data-driven difficulty curves
//! - `platform`: Host boundary (frame clock, input aggregation, demo autopilot)
//! - `settings`: Variant selection and configuration
//! - `engine`: Orchestrator that publishes render snapshots

pub mod engine;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use engine::Engine;
pub use settings::{ConfigError, Settings, VariantKind};

/// Engine-wide constants
pub mod consts {
    /// Frame length the per-frame feel of the games was authored against (60 Hz)
    pub const REFERENCE_DT: f32 = 1.0 / 60.0;
    /// Largest timestep a single tick integrates (tab switches, hitches)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Spawn cadence never drops below this, whatever a curve asks for
    pub const MIN_SPAWN_CADENCE_MS: f32 = 50.0;
    /// Entity speed ceiling (board units per second)
    pub const MAX_ENTITY_SPEED: f32 = 2000.0;
    /// Smallest spawned entity edge
    pub const MIN_ENTITY_SIZE: f32 = 4.0;
    /// Shortest lifetime for expiring entities
    pub const MIN_ENTITY_LIFETIME_MS: f32 = 100.0;

    /// Lives for variants that have them
    pub const INITIAL_LIVES: u8 = 3;
    /// Lane pulses travel in a u16 bitmask
    pub const MAX_LANES: usize = 16;

    /// Seed used when settings do not provide one
    pub const DEFAULT_SEED: u64 = 0x5EED_A2CA_DE00;
}

/// Sanitize a host-supplied frame delta (seconds)
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, consts::MAX_FRAME_DT)
    } else {
        0.0
    }
}
