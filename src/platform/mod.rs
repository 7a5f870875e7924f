//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame scheduling (requestAnimationFrame or a manual source)
//! - Input events (keyboard, pointer, autopilot)

pub mod autopilot;
pub mod input;
pub mod time;

pub use input::{Control, InputAggregator, Source};
#[cfg(target_arch = "wasm32")]
pub use time::AnimationFrames;
pub use time::{Clock, FrameRequest, FrameSource, ManualFrames};
