//! Immutable render snapshot published after each tick

use glam::Vec2;
use serde::Serialize;

use super::state::{EntityId, EntityKind, GameEvent, GameState, SessionStatus};

/// What presentation needs to draw one entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EntityView {
    pub id: EntityId,
    pub kind: EntityKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub variant: bool,
    pub hit_points: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub status: SessionStatus,
    pub score: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lives: Option<u8>,
    pub board: Vec2,
    pub entities: Vec<EntityView>,
    pub events: Vec<GameEvent>,
}

impl Snapshot {
    pub fn capture(state: &GameState) -> Self {
        Self {
            tick: state.time_ticks,
            status: state.session.status,
            score: state.session.score,
            lives: state.session.lives,
            board: state.rules.board,
            entities: state
                .entities
                .iter()
                .map(|e| EntityView {
                    id: e.id,
                    kind: e.kind,
                    pos: e.pos,
                    size: e.size,
                    variant: e.attrs.variant,
                    hit_points: e.attrs.hit_points,
                })
                .collect(),
            events: state.events.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
