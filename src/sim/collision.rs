//! Collision detection and resolution
//!
//! Every test in a tick reads a frozen copy of the entity set taken when the
//! pass begins. Outcomes are collected into a [`Plan`] and applied only after
//! all pairs, strikes, exits and expiries have been evaluated, so an entity
//! involved in two simultaneous collisions is consumed exactly once.
//!
//! Consumption precedence within a tick: pair rules (in table order), then
//! lane strikes, then board exits, then lifetime expiry.

use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use super::rules::{Effect, ExitLine, PairRule, Response};
use super::state::{Entity, EntityId, EntityKind, GameEvent, GameState, SessionStatus};
use super::tick::ControlIntent;

/// Axis-aligned bounding box: top-left corner plus extent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Strict overlap; touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.min.x + other.size.x
            && self.min.x + self.size.x > other.min.x
            && self.min.y < other.min.y + other.size.y
            && self.min.y + self.size.y > other.min.y
    }

    /// Entirely outside the rectangle `[0, board]`
    pub fn outside(&self, board: Vec2) -> bool {
        let max = self.max();
        max.x <= 0.0 || max.y <= 0.0 || self.min.x >= board.x || self.min.y >= board.y
    }
}

pub fn overlaps(a: &Aabb, b: &Aabb) -> bool {
    a.overlaps(b)
}

/// Outcome of one resolution pass, applied atomically
#[derive(Debug, Default)]
struct Plan {
    destroyed: BTreeSet<EntityId>,
    damage: BTreeMap<EntityId, u8>,
    bounces: Vec<(EntityId, f32)>,
    points: u64,
    lives_lost: u8,
    end_session: bool,
}

impl Plan {
    fn consumed(&self, id: EntityId) -> bool {
        self.destroyed.contains(&id)
    }

    /// Destroy a non-controllable entity
    fn destroy(&mut self, entity: &Entity) {
        if entity.kind != EntityKind::Controllable {
            self.destroyed.insert(entity.id);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Despawn => {}
            Effect::Score(points) => self.points = self.points.saturating_add(points),
            Effect::LoseLife => self.lives_lost = self.lives_lost.saturating_add(1),
            Effect::EndSession => self.end_session = true,
        }
    }
}

/// Resolve every collision, strike, exit and expiry for this tick
pub fn resolve(state: &mut GameState, intent: &ControlIntent, dt: f32) {
    if !state.is_playing() {
        return;
    }

    let view = state.entities.clone();
    let mut plan = Plan::default();

    for rule in &state.rules.pairs {
        resolve_pair(&view, rule, dt, &mut plan);
    }
    resolve_strikes(state, &view, intent, &mut plan);
    resolve_exits(state, &view, &mut plan);
    resolve_expiry(state, &view, &mut plan);

    apply(state, plan);
}

fn of_kind(view: &[Entity], kind: EntityKind) -> impl Iterator<Item = &Entity> {
    view.iter().filter(move |e| e.kind == kind)
}

fn resolve_pair(view: &[Entity], rule: &PairRule, dt: f32, plan: &mut Plan) {
    match rule.response {
        Response::Harm => {
            for a in of_kind(view, rule.first) {
                if plan.consumed(a.id) {
                    continue;
                }
                for b in of_kind(view, rule.second) {
                    if !plan.consumed(b.id) && a.bounds().overlaps(&b.bounds()) {
                        plan.destroy(b);
                        plan.apply(Effect::LoseLife);
                    }
                }
            }
        }
        Response::Damage { points } => {
            for a in of_kind(view, rule.first) {
                if plan.consumed(a.id) {
                    continue;
                }
                // Each projectile lands on the first live target it overlaps
                let hit = of_kind(view, rule.second)
                    .find(|b| !plan.consumed(b.id) && a.bounds().overlaps(&b.bounds()));
                let Some(b) = hit else {
                    continue;
                };
                plan.destroy(a);
                let taken = plan.damage.entry(b.id).or_insert(0);
                *taken = taken.saturating_add(1);
                if *taken >= b.attrs.hit_points {
                    plan.destroy(b);
                    plan.apply(Effect::Score(points));
                }
            }
        }
        Response::Bounce {
            impulse,
            tolerance,
            inset,
        } => {
            for a in of_kind(view, rule.first) {
                if plan.consumed(a.id) || a.vel.y <= 0.0 {
                    continue;
                }
                let bottom = a.bottom();
                let reach = tolerance + a.vel.y * dt;
                let left = a.pos.x + a.size.x * inset;
                let right = a.pos.x + a.size.x * (1.0 - inset);
                let landed = of_kind(view, rule.second).any(|b| {
                    !plan.consumed(b.id)
                        && left < b.pos.x + b.size.x
                        && right > b.pos.x
                        && bottom > b.pos.y
                        && bottom < b.pos.y + reach
                });
                if landed {
                    plan.bounces.push((a.id, impulse));
                }
            }
        }
    }
}

fn resolve_strikes(state: &GameState, view: &[Entity], intent: &ControlIntent, plan: &mut Plan) {
    let Some(strike) = state.rules.strike else {
        return;
    };
    let lanes = state.rules.lane_count().min(u16::BITS as usize);
    for lane in 0..lanes {
        if intent.lane_pulses & (1 << lane) == 0 {
            continue;
        }
        let lowest = of_kind(view, strike.kind)
            .filter(|e| e.attrs.lane == Some(lane as u8) && !plan.consumed(e.id))
            .filter(|e| strike.reach.is_none_or(|reach| e.pos.y >= reach))
            .fold(None::<&Entity>, |best, e| match best {
                Some(b) if b.pos.y >= e.pos.y => Some(b),
                _ => Some(e),
            });
        if let Some(target) = lowest {
            plan.destroy(target);
            plan.apply(if target.attrs.variant {
                strike.variant
            } else {
                strike.normal
            });
        }
    }
}

fn resolve_exits(state: &GameState, view: &[Entity], plan: &mut Plan) {
    let board = state.rules.board;
    for rule in &state.rules.exits {
        for e in of_kind(view, rule.kind) {
            if plan.consumed(e.id) {
                continue;
            }
            let crossed = match rule.line {
                ExitLine::TopBelow(y) => e.pos.y > y,
                ExitLine::BottomBelow(y) => e.bottom() > y,
                ExitLine::OutsideBoard => e.bounds().outside(board),
            };
            if crossed {
                plan.destroy(e);
                plan.apply(rule.effect);
            }
        }
    }
}

fn resolve_expiry(state: &GameState, view: &[Entity], plan: &mut Plan) {
    let Some(expiry) = state.rules.expiry else {
        return;
    };
    for e in view {
        let expired = e.attrs.ttl_ms.is_some_and(|ttl| ttl <= 0.0);
        if !expired || plan.consumed(e.id) {
            continue;
        }
        plan.destroy(e);
        plan.apply(if e.attrs.variant {
            expiry.variant
        } else {
            expiry.normal
        });
    }
}

fn apply(state: &mut GameState, plan: Plan) {
    let Plan {
        destroyed,
        damage,
        bounces,
        points,
        lives_lost,
        end_session,
    } = plan;

    state.entities.retain(|e| !destroyed.contains(&e.id));
    for e in state.entities.iter_mut() {
        if let Some(taken) = damage.get(&e.id) {
            e.attrs.hit_points = e.attrs.hit_points.saturating_sub(*taken);
        }
    }
    for (id, impulse) in bounces {
        if let Some(e) = state.entities.iter_mut().find(|e| e.id == id) {
            e.vel.y = impulse;
            state.events.push(GameEvent::Bounced { id });
        }
    }

    state.add_score(points);
    state.lose_lives(lives_lost);
    if end_session {
        state.set_status(SessionStatus::GameOver);
    }
}
