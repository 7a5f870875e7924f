//! Per-variant policy tables
//!
//! A [`Rules`] value is the only thing the shared simulation reads to decide
//! how a game behaves: movement policy, spawn schedule, collision-pair table,
//! exit and scoring rules. The variant tag is consulted once, here.

use glam::Vec2;

use super::state::{Direction, EntityKind};
use crate::consts::*;
use crate::settings::{ConfigError, VariantKind};
use crate::tuning::{DifficultyCurve, Escalation, Ramp};

/// How intent drives the controllable entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementPolicy {
    /// Horizontal velocity is set straight from intent
    Direct { speed: f32 },
    /// Intent sets velocity; without intent it decays by `decay` per reference frame
    Friction { speed: f32, decay: f32 },
    /// Entity stays put; intent only turns it
    Turn,
}

/// What happens at the side edges of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePolicy {
    Clamp,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerRules {
    pub start: Vec2,
    pub size: Vec2,
    pub movement: MovementPolicy,
    pub edges: EdgePolicy,
    /// Downward acceleration (units/s²)
    pub gravity: f32,
    pub facing: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnSchedule {
    /// One entity whenever the cadence elapses
    Timed,
    /// Keep `count` entities stacked upward from `floor`, spaced by the tuned gap
    Stack { count: usize, floor: Vec2 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Centered in one of `count` equal columns, entering from the top
    Lanes { count: u8 },
    /// Anywhere across the board width
    Scatter,
    /// From the left or right edge, heading for the middle
    Sides,
    /// In one cell of a grid, stationary
    Grid { columns: u8, rows: u8 },
}

impl Placement {
    /// Number of strikeable lanes this placement produces
    pub fn lane_count(&self) -> usize {
        match *self {
            Placement::Lanes { count } => count as usize,
            Placement::Grid { columns, rows } => columns as usize * rows as usize,
            Placement::Scatter | Placement::Sides => 0,
        }
    }
}

/// The skewed "other" spawn: armoured, bad or moving
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariantRules {
    pub hit_points: u8,
    pub scale: f32,
    /// Variant spawns only start at this score
    pub min_score: u64,
    /// Never two variants in a row
    pub never_consecutive: bool,
    /// Variant patrols side to side at the tuned speed
    pub patrol: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnRules {
    pub kind: EntityKind,
    pub schedule: SpawnSchedule,
    pub placement: Placement,
    /// Fixed height; square when unset
    pub height: Option<f32>,
    pub hit_points: u8,
    pub variant: Option<VariantRules>,
    /// A new spawn replaces whatever of this kind is still alive
    pub single: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireTrigger {
    Auto { every_ms: f64 },
    Pulse { cooldown_ms: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aim {
    Up,
    Facing,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireRules {
    pub trigger: FireTrigger,
    pub size: Vec2,
    pub speed: f32,
    pub aim: Aim,
}

/// Resolution for one pair of entity kinds
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Response {
    /// Second entity is destroyed and the session loses a life
    Harm,
    /// First entity is destroyed, second loses a hit point and scores when destroyed
    Damage { points: u64 },
    /// First entity bounces off the top of the second while falling.
    /// `inset` trims that fraction of the first entity's width from each
    /// side, so only its middle band counts as landing.
    Bounce {
        impulse: f32,
        tolerance: f32,
        inset: f32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairRule {
    pub first: EntityKind,
    pub second: EntityKind,
    pub response: Response,
}

/// Session-level consequence of an exit, strike or expiry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Despawn,
    Score(u64),
    LoseLife,
    EndSession,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitLine {
    /// Top edge below this y
    TopBelow(f32),
    /// Bottom edge below this y
    BottomBelow(f32),
    /// Entirely outside the board rectangle
    OutsideBoard,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitRule {
    pub kind: EntityKind,
    pub line: ExitLine,
    pub effect: Effect,
}

/// Lane pulses strike the lowest live entity of `kind` in that lane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeRules {
    pub kind: EntityKind,
    /// Entities whose top is above this y can't be struck yet
    pub reach: Option<f32>,
    pub normal: Effect,
    pub variant: Effect,
}

/// Entities spawned with a lifetime resolve this way when it runs out
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpiryRules {
    pub normal: Effect,
    pub variant: Effect,
}

/// Scrolling camera pinned near a line; climbing past it is distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRules {
    pub anchor: f32,
    pub distance_per_point: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rules {
    pub board: Vec2,
    /// `None` for single-life variants
    pub lives: Option<u8>,
    pub player: Option<PlayerRules>,
    /// Downward acceleration for free entities
    pub gravity: f32,
    pub spawn: SpawnRules,
    pub fire: Option<FireRules>,
    pub pairs: Vec<PairRule>,
    pub exits: Vec<ExitRule>,
    pub strike: Option<StrikeRules>,
    pub expiry: Option<ExpiryRules>,
    pub camera: Option<CameraRules>,
    pub curve: DifficultyCurve,
}

impl Rules {
    pub fn for_variant(kind: VariantKind) -> Self {
        match kind {
            VariantKind::Dodge => dodge(),
            VariantKind::Blaster => blaster(),
            VariantKind::Turret => turret(),
            VariantKind::Jumper => jumper(),
            VariantKind::Tiles => tiles(),
            VariantKind::Whack => whack(),
        }
    }

    /// Number of lanes lane pulses can address
    pub fn lane_count(&self) -> usize {
        self.spawn.placement.lane_count()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.board.is_finite() && self.board.x > 0.0 && self.board.y > 0.0) {
            return Err(ConfigError::invalid("board", "must be finite and positive"));
        }
        if self.lives == Some(0) {
            return Err(ConfigError::invalid("lives", "must start above zero"));
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::invalid("gravity", "must be finite"));
        }
        let lanes = self.spawn.placement.lane_count();
        let lane_based = matches!(
            self.spawn.placement,
            Placement::Lanes { .. } | Placement::Grid { .. }
        );
        if lane_based && !(1..=MAX_LANES).contains(&lanes) {
            return Err(ConfigError::invalid(
                "spawn.placement",
                format!("lane count {lanes} outside 1..={MAX_LANES}"),
            ));
        }
        if let SpawnSchedule::Stack { count, floor } = self.spawn.schedule {
            if count == 0 || !floor.is_finite() {
                return Err(ConfigError::invalid(
                    "spawn.schedule",
                    "stack needs a finite floor and a positive count",
                ));
            }
        }
        if let Some(fire) = &self.fire {
            let interval = match fire.trigger {
                FireTrigger::Auto { every_ms } => every_ms,
                FireTrigger::Pulse { cooldown_ms } => cooldown_ms,
            };
            if !(interval.is_finite() && interval > 0.0) {
                return Err(ConfigError::invalid("fire.trigger", "interval must be positive"));
            }
        }
        if let Some(camera) = &self.camera {
            if !(camera.distance_per_point.is_finite() && camera.distance_per_point > 0.0) {
                return Err(ConfigError::invalid(
                    "camera.distance_per_point",
                    "must be positive",
                ));
            }
        }
        self.curve.validate()
    }
}

fn dodge() -> Rules {
    let board = Vec2::new(340.0, 500.0);
    Rules {
        board,
        lives: None,
        player: Some(PlayerRules {
            start: Vec2::new(board.x / 2.0 - 25.0, board.y - 60.0),
            size: Vec2::new(50.0, 40.0),
            movement: MovementPolicy::Direct { speed: 420.0 },
            edges: EdgePolicy::Clamp,
            gravity: 0.0,
            facing: Direction::Right,
        }),
        gravity: 0.0,
        spawn: SpawnRules {
            kind: EntityKind::Hazard,
            schedule: SpawnSchedule::Timed,
            placement: Placement::Lanes { count: 6 },
            height: None,
            hit_points: 1,
            variant: None,
            single: false,
        },
        fire: None,
        pairs: vec![PairRule {
            first: EntityKind::Controllable,
            second: EntityKind::Hazard,
            response: Response::Harm,
        }],
        exits: vec![ExitRule {
            kind: EntityKind::Hazard,
            line: ExitLine::TopBelow(board.y),
            effect: Effect::Score(1),
        }],
        strike: None,
        expiry: None,
        camera: None,
        curve: DifficultyCurve {
            escalation: Escalation::Linear,
            max_level: None,
            spawn_cadence_ms: Ramp::new(1000.0, -50.0, 300.0),
            spawn_spacing: Ramp::default(),
            entity_speed: Ramp::constant(360.0),
            entity_size: Ramp::constant(45.0),
            entity_lifetime_ms: Ramp::default(),
            variant_chance: Ramp::default(),
        },
    }
}

fn blaster() -> Rules {
    let board = Vec2::new(340.0, 500.0);
    let player_size = Vec2::new(50.0, 40.0);
    Rules {
        board,
        lives: None,
        player: Some(PlayerRules {
            start: Vec2::new(board.x / 2.0 - 25.0, board.y - player_size.y - 20.0),
            size: player_size,
            movement: MovementPolicy::Direct { speed: 360.0 },
            edges: EdgePolicy::Clamp,
            gravity: 0.0,
            facing: Direction::Right,
        }),
        gravity: 0.0,
        spawn: SpawnRules {
            kind: EntityKind::Target,
            schedule: SpawnSchedule::Timed,
            placement: Placement::Scatter,
            height: None,
            hit_points: 1,
            variant: None,
            single: false,
        },
        fire: Some(FireRules {
            trigger: FireTrigger::Auto { every_ms: 600.0 },
            size: Vec2::new(6.0, 14.0),
            speed: 180.0,
            aim: Aim::Up,
        }),
        pairs: vec![PairRule {
            first: EntityKind::Projectile,
            second: EntityKind::Target,
            response: Response::Damage { points: 1 },
        }],
        exits: vec![
            ExitRule {
                kind: EntityKind::Target,
                line: ExitLine::BottomBelow(board.y - player_size.y),
                effect: Effect::EndSession,
            },
            ExitRule {
                kind: EntityKind::Projectile,
                line: ExitLine::OutsideBoard,
                effect: Effect::Despawn,
            },
        ],
        strike: None,
        expiry: None,
        camera: None,
        curve: DifficultyCurve {
            escalation: Escalation::Linear,
            max_level: None,
            spawn_cadence_ms: Ramp::new(900.0, -15.0, 450.0),
            spawn_spacing: Ramp::default(),
            entity_speed: Ramp::new(120.0, 3.0, 240.0),
            entity_size: Ramp::constant(40.0),
            entity_lifetime_ms: Ramp::default(),
            variant_chance: Ramp::default(),
        },
    }
}

fn turret() -> Rules {
    let board = Vec2::new(520.0, 520.0);
    let player_size = Vec2::splat(56.0);
    Rules {
        board,
        lives: Some(INITIAL_LIVES),
        player: Some(PlayerRules {
            start: (board - player_size) / 2.0,
            size: player_size,
            movement: MovementPolicy::Turn,
            edges: EdgePolicy::Clamp,
            gravity: 0.0,
            facing: Direction::Right,
        }),
        gravity: 0.0,
        spawn: SpawnRules {
            kind: EntityKind::Target,
            schedule: SpawnSchedule::Timed,
            placement: Placement::Sides,
            height: None,
            hit_points: 1,
            variant: Some(VariantRules {
                hit_points: 2,
                scale: 1.2,
                min_score: 0,
                never_consecutive: false,
                patrol: false,
            }),
            single: false,
        },
        fire: Some(FireRules {
            trigger: FireTrigger::Pulse { cooldown_ms: 250.0 },
            size: Vec2::splat(12.0),
            speed: 300.0,
            aim: Aim::Facing,
        }),
        pairs: vec![
            PairRule {
                first: EntityKind::Projectile,
                second: EntityKind::Target,
                response: Response::Damage { points: 10 },
            },
            PairRule {
                first: EntityKind::Controllable,
                second: EntityKind::Target,
                response: Response::Harm,
            },
        ],
        exits: vec![ExitRule {
            kind: EntityKind::Projectile,
            line: ExitLine::OutsideBoard,
            effect: Effect::Despawn,
        }],
        strike: None,
        expiry: None,
        camera: None,
        curve: DifficultyCurve {
            // Kills are worth 10, so the 25-point checkpoints land every 50
            escalation: Escalation::Stepped { every: 50 },
            max_level: None,
            spawn_cadence_ms: Ramp::new(1500.0, -200.0, 500.0),
            spawn_spacing: Ramp::default(),
            entity_speed: Ramp::new(66.0, 16.5, 165.0),
            entity_size: Ramp::constant(40.0),
            entity_lifetime_ms: Ramp::default(),
            variant_chance: Ramp::constant(0.35),
        },
    }
}

fn jumper() -> Rules {
    let board = Vec2::new(340.0, 500.0);
    let player_size = Vec2::splat(40.0);
    Rules {
        board,
        lives: None,
        player: Some(PlayerRules {
            start: Vec2::new(board.x / 2.0 - player_size.x / 2.0, board.y - 150.0),
            size: player_size,
            movement: MovementPolicy::Friction {
                speed: 360.0,
                decay: 0.8,
            },
            edges: EdgePolicy::Wrap,
            gravity: 1800.0,
            facing: Direction::Right,
        }),
        gravity: 0.0,
        spawn: SpawnRules {
            kind: EntityKind::Platform,
            schedule: SpawnSchedule::Stack {
                count: 7,
                floor: Vec2::new(board.x / 2.0 - 35.0, board.y - 60.0),
            },
            placement: Placement::Scatter,
            height: Some(14.0),
            hit_points: 1,
            variant: Some(VariantRules {
                hit_points: 1,
                scale: 1.0,
                min_score: 101,
                never_consecutive: true,
                patrol: true,
            }),
            single: false,
        },
        fire: None,
        pairs: vec![PairRule {
            first: EntityKind::Controllable,
            second: EntityKind::Platform,
            response: Response::Bounce {
                impulse: -720.0,
                tolerance: 16.0,
                inset: 0.4,
            },
        }],
        exits: vec![
            ExitRule {
                kind: EntityKind::Platform,
                line: ExitLine::TopBelow(board.y),
                effect: Effect::Despawn,
            },
            ExitRule {
                kind: EntityKind::Controllable,
                line: ExitLine::TopBelow(board.y),
                effect: Effect::EndSession,
            },
        ],
        strike: None,
        expiry: None,
        camera: Some(CameraRules {
            anchor: board.y / 2.0,
            distance_per_point: 10.0,
        }),
        curve: DifficultyCurve {
            // Difficulty saturates at 500 points
            escalation: Escalation::Linear,
            max_level: Some(500),
            spawn_cadence_ms: Ramp::constant(1000.0),
            spawn_spacing: Ramp::new(90.0, 0.14, 130.0),
            entity_speed: Ramp::new(72.0, 0.216, 180.0),
            entity_size: Ramp::new(70.0, -0.05, 65.0),
            entity_lifetime_ms: Ramp::default(),
            variant_chance: Ramp::new(0.3, 0.0008, 0.7),
        },
    }
}

fn tiles() -> Rules {
    let board = Vec2::new(340.0, 600.0);
    Rules {
        board,
        lives: None,
        player: None,
        gravity: 0.0,
        spawn: SpawnRules {
            kind: EntityKind::Target,
            schedule: SpawnSchedule::Timed,
            placement: Placement::Lanes { count: 4 },
            height: Some(150.0),
            hit_points: 1,
            variant: None,
            single: false,
        },
        fire: None,
        pairs: Vec::new(),
        exits: vec![ExitRule {
            kind: EntityKind::Target,
            line: ExitLine::TopBelow(board.y - 50.0),
            effect: Effect::EndSession,
        }],
        strike: Some(StrikeRules {
            kind: EntityKind::Target,
            reach: Some(-100.0),
            normal: Effect::Score(1),
            variant: Effect::Score(1),
        }),
        expiry: None,
        camera: None,
        curve: DifficultyCurve {
            escalation: Escalation::Stepped { every: 10 },
            max_level: None,
            spawn_cadence_ms: Ramp::new(1200.0, -150.0, 400.0),
            spawn_spacing: Ramp::default(),
            entity_speed: Ramp::new(187.5, 37.5, 600.0),
            entity_size: Ramp::constant(board.x / 4.0),
            entity_lifetime_ms: Ramp::default(),
            variant_chance: Ramp::default(),
        },
    }
}

fn whack() -> Rules {
    let board = Vec2::new(300.0, 300.0);
    Rules {
        board,
        lives: Some(INITIAL_LIVES),
        player: None,
        gravity: 0.0,
        spawn: SpawnRules {
            kind: EntityKind::Target,
            schedule: SpawnSchedule::Timed,
            placement: Placement::Grid {
                columns: 3,
                rows: 3,
            },
            height: None,
            hit_points: 1,
            variant: Some(VariantRules {
                hit_points: 1,
                scale: 1.0,
                min_score: 0,
                never_consecutive: false,
                patrol: false,
            }),
            single: true,
        },
        fire: None,
        pairs: Vec::new(),
        exits: Vec::new(),
        strike: Some(StrikeRules {
            kind: EntityKind::Target,
            reach: None,
            normal: Effect::Score(1),
            variant: Effect::LoseLife,
        }),
        expiry: Some(ExpiryRules {
            normal: Effect::LoseLife,
            variant: Effect::Despawn,
        }),
        camera: None,
        curve: DifficultyCurve {
            escalation: Escalation::Stepped { every: 3 },
            max_level: Some(10),
            spawn_cadence_ms: Ramp::new(1200.0, -60.0, 500.0),
            spawn_spacing: Ramp::default(),
            entity_speed: Ramp::constant(0.0),
            entity_size: Ramp::constant(80.0),
            entity_lifetime_ms: Ramp::new(900.0, -40.0, 350.0),
            variant_chance: Ramp::constant(0.25),
        },
    }
}
