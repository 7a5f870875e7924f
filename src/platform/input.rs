//! Input aggregation
//!
//! Keyboard, pointer and synthetic (autopilot) sources press and release the
//! same logical controls. A control is asserted while any source holds it.
//!
//! Opposing directions resolve to the one asserted most recently. Both
//! asserted within the same tick window is a tie and resolves to no movement.
//! Discrete controls (action, lane strikes) queue one pulse per physical press
//! and hand out at most one pulse per control per tick.

use std::collections::HashSet;

use crate::consts::MAX_LANES;
use crate::sim::{ControlIntent, Direction, Movement};

/// Where an input event came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Keyboard,
    /// Mouse, pen or touch on an on-screen control
    Pointer,
    /// Autopilot
    Synthetic,
}

/// A logical control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Move(Direction),
    Action,
    Lane(u8),
}

impl Control {
    /// Map a `KeyboardEvent.key` value
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "Left" => return Some(Control::Move(Direction::Left)),
            "ArrowRight" | "Right" => return Some(Control::Move(Direction::Right)),
            " " | "Space" | "Spacebar" | "Enter" => return Some(Control::Action),
            _ => {}
        }
        let mut chars = key.chars();
        let (Some(c), None) = (chars.next(), chars.next()) else {
            return None;
        };
        match c.to_ascii_lowercase() {
            'a' => Some(Control::Lane(0)),
            's' => Some(Control::Lane(1)),
            'k' => Some(Control::Lane(2)),
            'l' => Some(Control::Lane(3)),
            d @ '1'..='9' => Some(Control::Lane(d as u8 - b'1')),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct InputAggregator {
    held: HashSet<(Source, Control)>,
    /// Tick window in which each direction last became asserted
    asserted_at: [Option<u64>; 2],
    window: u64,
    action_queue: u32,
    lane_queue: [u32; MAX_LANES],
}

impl InputAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any source holds `control`
    pub fn is_held(&self, control: Control) -> bool {
        self.held.iter().any(|(_, c)| *c == control)
    }

    pub fn press(&mut self, source: Source, control: Control) {
        let was_held = self.is_held(control);
        if !self.held.insert((source, control)) {
            // Auto-repeat or a duplicate down event
            return;
        }
        match control {
            Control::Move(dir) => {
                if !was_held {
                    self.asserted_at[dir.index()] = Some(self.window);
                }
            }
            Control::Action => self.action_queue = self.action_queue.saturating_add(1),
            Control::Lane(lane) => {
                if let Some(queued) = self.lane_queue.get_mut(lane as usize) {
                    *queued = queued.saturating_add(1);
                }
            }
        }
    }

    pub fn release(&mut self, source: Source, control: Control) {
        if self.held.remove(&(source, control)) {
            self.refresh(control);
        }
    }

    /// Drop everything `source` holds
    pub fn release_source(&mut self, source: Source) {
        let released: Vec<Control> = self
            .held
            .iter()
            .filter(|(s, _)| *s == source)
            .map(|(_, c)| *c)
            .collect();
        for control in released {
            self.release(source, control);
        }
    }

    fn refresh(&mut self, control: Control) {
        if let Control::Move(dir) = control {
            if !self.is_held(control) {
                self.asserted_at[dir.index()] = None;
            }
        }
    }

    /// Keyboard down. Returns whether the key is mapped.
    pub fn key_down(&mut self, key: &str, repeat: bool) -> bool {
        let Some(control) = Control::from_key(key) else {
            return false;
        };
        if !repeat {
            self.press(Source::Keyboard, control);
        }
        true
    }

    pub fn key_up(&mut self, key: &str) -> bool {
        let Some(control) = Control::from_key(key) else {
            return false;
        };
        self.release(Source::Keyboard, control);
        true
    }

    pub fn pointer_down(&mut self, control: Control) {
        self.press(Source::Pointer, control);
    }

    pub fn pointer_up(&mut self, control: Control) {
        self.release(Source::Pointer, control);
    }

    /// Pointer left the control surface; nothing it held stays held
    pub fn pointer_leave(&mut self) {
        self.release_source(Source::Pointer);
    }

    /// Current movement without consuming anything
    pub fn movement(&self) -> Movement {
        match self.asserted_at {
            [Some(left), Some(right)] if left > right => Movement::Left,
            [Some(left), Some(right)] if right > left => Movement::Right,
            [Some(_), None] => Movement::Left,
            [None, Some(_)] => Movement::Right,
            _ => Movement::None,
        }
    }

    /// Intent for the next tick. Consumes at most one pulse per control and
    /// closes the current tick window.
    pub fn intent(&mut self) -> ControlIntent {
        let movement = self.movement();

        let action_pulse = self.action_queue > 0;
        if action_pulse {
            self.action_queue -= 1;
        }

        let mut lane_pulses = 0u16;
        for (lane, queued) in self.lane_queue.iter_mut().enumerate() {
            if *queued > 0 {
                *queued -= 1;
                lane_pulses |= 1 << lane;
            }
        }

        self.window += 1;
        ControlIntent {
            movement,
            action_pulse,
            lane_pulses,
        }
    }

    /// Forget every held control and queued pulse
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEFT: Control = Control::Move(Direction::Left);
    const RIGHT: Control = Control::Move(Direction::Right);

    #[test]
    fn test_key_map() {
        assert_eq!(Control::from_key("ArrowLeft"), Some(LEFT));
        assert_eq!(Control::from_key(" "), Some(Control::Action));
        assert_eq!(Control::from_key("K"), Some(Control::Lane(2)));
        assert_eq!(Control::from_key("1"), Some(Control::Lane(0)));
        assert_eq!(Control::from_key("9"), Some(Control::Lane(8)));
        assert_eq!(Control::from_key("0"), None);
        assert_eq!(Control::from_key("Shift"), None);
    }

    #[test]
    fn test_most_recent_direction_wins() {
        let mut input = InputAggregator::new();
        input.key_down("ArrowLeft", false);
        assert_eq!(input.intent().movement, Movement::Left);

        input.key_down("ArrowRight", false);
        assert_eq!(input.intent().movement, Movement::Right);

        // Releasing the newer direction falls back to the one still held
        input.key_up("ArrowRight");
        assert_eq!(input.intent().movement, Movement::Left);
    }

    #[test]
    fn test_same_window_tie_is_none() {
        let mut input = InputAggregator::new();
        input.key_down("ArrowLeft", false);
        input.pointer_down(RIGHT);
        assert_eq!(input.intent().movement, Movement::None);

        // The tie persists until one side changes
        assert_eq!(input.intent().movement, Movement::None);
        input.pointer_up(RIGHT);
        assert_eq!(input.intent().movement, Movement::Left);
    }

    #[test]
    fn test_sources_are_ored() {
        let mut input = InputAggregator::new();
        input.key_down("ArrowLeft", false);
        input.pointer_down(LEFT);
        input.key_up("ArrowLeft");
        assert_eq!(input.intent().movement, Movement::Left);
        input.pointer_up(LEFT);
        assert_eq!(input.intent().movement, Movement::None);
    }

    #[test]
    fn test_second_source_does_not_reassert() {
        let mut input = InputAggregator::new();
        input.key_down("ArrowLeft", false);
        input.intent();
        input.key_down("ArrowRight", false);
        input.intent();
        // Left was already held, so the pointer joining it is not newer
        input.pointer_down(LEFT);
        assert_eq!(input.intent().movement, Movement::Right);
    }

    #[test]
    fn test_pointer_leave_releases_pointer_only() {
        let mut input = InputAggregator::new();
        input.pointer_down(RIGHT);
        input.key_down("ArrowLeft", false);
        input.intent();
        input.pointer_leave();
        assert!(!input.is_held(RIGHT));
        assert_eq!(input.intent().movement, Movement::Left);
    }

    #[test]
    fn test_action_pulse_suppresses_repeat() {
        let mut input = InputAggregator::new();
        input.key_down(" ", false);
        input.key_down(" ", true);
        input.key_down(" ", true);
        assert!(input.intent().action_pulse);
        assert!(!input.intent().action_pulse);

        // Held down is still only one press
        input.key_down(" ", false);
        assert!(!input.intent().action_pulse);

        input.key_up(" ");
        input.key_down(" ", false);
        assert!(input.intent().action_pulse);
    }

    #[test]
    fn test_presses_between_ticks_are_queued() {
        let mut input = InputAggregator::new();
        input.key_down("a", false);
        input.key_up("a");
        input.key_down("a", false);
        input.key_up("a");
        input.key_down("l", false);
        assert_eq!(input.intent().lane_pulses, 0b1001);
        assert_eq!(input.intent().lane_pulses, 0b0001);
        assert_eq!(input.intent().lane_pulses, 0);
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut input = InputAggregator::new();
        input.key_down("ArrowRight", false);
        input.key_down("Enter", false);
        input.pointer_down(Control::Lane(3));
        input.clear();
        let intent = input.intent();
        assert_eq!(intent, ControlIntent::default());
        assert!(!input.is_held(RIGHT));
    }
}
