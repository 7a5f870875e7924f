//! Game state and core simulation types
//!
//! Everything a tick reads or writes lives in [`GameState`]. Entities are kept
//! sorted by id so every pass iterates in the same order.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::rules::Rules;
use crate::tuning::Tuning;

/// Stable identity of a live entity, allocated in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// The player-driven entity (at most one)
    Controllable,
    /// Falls toward the player; contact is harmful
    Hazard,
    /// Fired by the player
    Projectile,
    /// Something to land on
    Platform,
    /// Something to shoot or strike
    Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn sign(self) -> f32 {
        match self {
            Direction::Left => -1.0,
            Direction::Right => 1.0,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Direction::Left => 0,
            Direction::Right => 1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Kind-specific entity attributes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attributes {
    pub hit_points: u8,
    /// Lane or grid cell the entity was spawned into
    pub lane: Option<u8>,
    /// Facing for the controllable, travel direction for side spawns
    pub heading: Option<Direction>,
    /// Spawned as the skewed variant (armoured, bad, moving)
    pub variant: bool,
    /// Bounces between the side walls
    pub patrol: bool,
    /// Remaining lifetime for expiring entities
    pub ttl_ms: Option<f32>,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            hit_points: 1,
            lane: None,
            heading: None,
            variant: false,
            patrol: false,
            ttl_ms: None,
        }
    }
}

/// A simulated entity. `pos` is the top-left corner in board coordinates (y down).
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub attrs: Attributes,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind, pos: Vec2, size: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            vel: Vec2::ZERO,
            size,
            attrs: Attributes::default(),
        }
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.vel.is_finite() && self.size.is_finite()
    }
}

/// Session lifecycle: Idle → Playing → GameOver → (reset) → Playing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Before the first start
    Idle,
    Playing,
    /// Terminal until reset
    GameOver,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub status: SessionStatus,
    pub score: u64,
    /// `None` for single-life variants
    pub lives: Option<u8>,
    /// Camera travel for scrolling variants
    pub distance: f32,
    /// Simulated time of the last timed spawn
    pub last_spawn_ms: f64,
    pub last_fire_ms: Option<f64>,
    /// Whether the most recent spawn was the variant
    pub last_variant: bool,
    pub tuning: Tuning,
}

impl SessionState {
    fn initial(rules: &Rules, status: SessionStatus) -> Self {
        Self {
            status,
            score: 0,
            lives: rules.lives,
            distance: 0.0,
            last_spawn_ms: 0.0,
            last_fire_ms: None,
            last_variant: false,
            tuning: rules.curve.tuning(0),
        }
    }
}

/// Per-tick notifications for presentation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    Spawned { id: EntityId, kind: EntityKind },
    Scored { points: u64, total: u64 },
    LifeLost { remaining: u8 },
    Bounced { id: EntityId },
    StatusChanged { status: SessionStatus },
}

/// Work deferred to the start of the next tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheduled {
    /// Recompute difficulty tuning from the current score
    Retune,
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub rules: Rules,
    pub seed: u64,
    pub rng: Pcg32,
    pub session: SessionState,
    /// Live entities, sorted by id
    pub entities: Vec<Entity>,
    /// Simulated milliseconds since the session started
    pub clock_ms: f64,
    pub time_ticks: u64,
    /// Events produced by the most recent tick
    pub events: Vec<GameEvent>,
    pending: Vec<Scheduled>,
    next_id: u32,
}

impl GameState {
    /// New session waiting in `Idle`
    pub fn new(rules: Rules, seed: u64) -> Self {
        let session = SessionState::initial(&rules, SessionStatus::Idle);
        let mut state = Self {
            rules,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            session,
            entities: Vec::new(),
            clock_ms: 0.0,
            time_ticks: 0,
            events: Vec::new(),
            pending: Vec::new(),
            next_id: 1,
        };
        state.place_controllable();
        state
    }

    /// Leave `Idle`. Has no effect once a session has started.
    pub fn start(&mut self) {
        if self.session.status == SessionStatus::Idle {
            log::info!("Session started (seed {:#x})", self.seed);
            self.set_status(SessionStatus::Playing);
        }
    }

    /// Reinitialize the session and begin playing. The RNG stream continues.
    pub fn reset(&mut self) {
        self.session = SessionState::initial(&self.rules, SessionStatus::Playing);
        self.entities.clear();
        self.clock_ms = 0.0;
        self.time_ticks = 0;
        self.events.clear();
        self.pending.clear();
        self.next_id = 1;
        self.place_controllable();
        self.events.push(GameEvent::StatusChanged {
            status: SessionStatus::Playing,
        });
        log::info!("Session reset");
    }

    pub fn next_entity_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add an entity under a fresh id
    pub fn insert(
        &mut self,
        kind: EntityKind,
        pos: Vec2,
        size: Vec2,
        vel: Vec2,
        attrs: Attributes,
    ) -> EntityId {
        let id = self.next_entity_id();
        let mut entity = Entity::new(id, kind, pos, size);
        entity.vel = vel;
        entity.attrs = attrs;
        self.entities.push(entity);
        self.events.push(GameEvent::Spawned { id, kind });
        id
    }

    pub fn player(&self) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.kind == EntityKind::Controllable)
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.entities
            .iter_mut()
            .find(|e| e.kind == EntityKind::Controllable)
    }

    /// Restore id order after out-of-order mutation
    pub fn normalize_order(&mut self) {
        self.entities.sort_by_key(|e| e.id);
    }

    pub fn is_playing(&self) -> bool {
        self.session.status == SessionStatus::Playing
    }

    /// Move to `status`. A session enters `GameOver` at most once.
    pub fn set_status(&mut self, status: SessionStatus) {
        if self.session.status == status {
            return;
        }
        if status == SessionStatus::GameOver {
            log::info!(
                "Game over: score {} after {} ticks",
                self.session.score,
                self.time_ticks
            );
        }
        self.session.status = status;
        self.events.push(GameEvent::StatusChanged { status });
    }

    pub fn add_score(&mut self, points: u64) {
        if points == 0 {
            return;
        }
        self.session.score = self.session.score.saturating_add(points);
        self.events.push(GameEvent::Scored {
            points,
            total: self.session.score,
        });
        self.schedule(Scheduled::Retune);
    }

    /// Lose `count` lives; single-life variants end immediately
    pub fn lose_lives(&mut self, count: u8) {
        if count == 0 {
            return;
        }
        match self.session.lives {
            None => self.set_status(SessionStatus::GameOver),
            Some(lives) => {
                let remaining = lives.saturating_sub(count);
                self.session.lives = Some(remaining);
                self.events.push(GameEvent::LifeLost { remaining });
                if remaining == 0 {
                    self.set_status(SessionStatus::GameOver);
                }
            }
        }
    }

    pub fn schedule(&mut self, work: Scheduled) {
        if !self.pending.contains(&work) {
            self.pending.push(work);
        }
    }

    /// Run work scheduled by the previous tick
    pub fn consume_scheduled(&mut self) {
        for work in std::mem::take(&mut self.pending) {
            match work {
                Scheduled::Retune => {
                    let tuning = self.rules.curve.tuning(self.session.score);
                    if tuning.level != self.session.tuning.level {
                        log::debug!(
                            "Difficulty level {} (cadence {}ms, speed {})",
                            tuning.level,
                            tuning.spawn_cadence_ms,
                            tuning.entity_speed
                        );
                    }
                    self.session.tuning = tuning;
                }
            }
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn place_controllable(&mut self) {
        if let Some(player) = self.rules.player {
            let attrs = Attributes {
                heading: Some(player.facing),
                ..Attributes::default()
            };
            let id = self.next_entity_id();
            let mut entity = Entity::new(id, EntityKind::Controllable, player.start, player.size);
            entity.attrs = attrs;
            self.entities.push(entity);
        }
    }
}
