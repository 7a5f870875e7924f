//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Simulated time only (sum of clamped tick deltas)
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod physics;
pub mod rules;
pub mod snapshot;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{Aabb, overlaps, resolve};
pub use rules::{
    Aim, CameraRules, EdgePolicy, Effect, ExitLine, ExitRule, ExpiryRules, FireRules,
    FireTrigger, MovementPolicy, PairRule, Placement, PlayerRules, Response, Rules, SpawnRules,
    SpawnSchedule, StrikeRules, VariantRules,
};
pub use snapshot::{EntityView, Snapshot};
pub use state::{
    Attributes, Direction, Entity, EntityId, EntityKind, GameEvent, GameState, Scheduled,
    SessionState, SessionStatus,
};
pub use tick::{ControlIntent, Movement, tick};
