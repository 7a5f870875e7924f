//! Frame clock
//!
//! [`Clock`] owns the single outstanding frame request. It only re-arms while
//! the session is `Playing`, ignores callbacks for requests it no longer
//! holds, and cancels whatever is pending when stopped or dropped.

use crate::consts::REFERENCE_DT;
use crate::engine::Engine;
use crate::sim::SessionStatus;

/// Handle for one scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRequest(pub u64);

/// Host frame-scheduling primitive
pub trait FrameSource {
    /// Schedule one callback. `None` if the host refused.
    fn request_frame(&mut self) -> Option<FrameRequest>;
    fn cancel_frame(&mut self, request: FrameRequest);
}

impl<T: FrameSource + ?Sized> FrameSource for &mut T {
    fn request_frame(&mut self) -> Option<FrameRequest> {
        (**self).request_frame()
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        (**self).cancel_frame(request)
    }
}

/// Frame source driven by hand (native runs and tests)
#[derive(Debug, Default)]
pub struct ManualFrames {
    next_id: u64,
    queued: Vec<FrameRequest>,
    cancelled: Vec<FrameRequest>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest request still waiting to be delivered
    pub fn take_next(&mut self) -> Option<FrameRequest> {
        if self.queued.is_empty() {
            None
        } else {
            Some(self.queued.remove(0))
        }
    }

    pub fn outstanding(&self) -> usize {
        self.queued.len()
    }

    pub fn cancelled(&self) -> &[FrameRequest] {
        &self.cancelled
    }
}

impl FrameSource for ManualFrames {
    fn request_frame(&mut self) -> Option<FrameRequest> {
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        self.queued.push(request);
        Some(request)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.queued.retain(|r| *r != request);
        self.cancelled.push(request);
    }
}

/// `requestAnimationFrame` on the browser window
#[cfg(target_arch = "wasm32")]
pub struct AnimationFrames {
    window: web_sys::Window,
    callback: Option<wasm_bindgen::closure::Closure<dyn FnMut(f64)>>,
}

#[cfg(target_arch = "wasm32")]
impl AnimationFrames {
    pub fn new(window: web_sys::Window) -> Self {
        Self {
            window,
            callback: None,
        }
    }

    /// Callback invoked with the frame timestamp (ms)
    pub fn set_callback(&mut self, callback: wasm_bindgen::closure::Closure<dyn FnMut(f64)>) {
        self.callback = Some(callback);
    }
}

#[cfg(target_arch = "wasm32")]
impl FrameSource for AnimationFrames {
    fn request_frame(&mut self) -> Option<FrameRequest> {
        use wasm_bindgen::JsCast;

        let callback = self.callback.as_ref()?;
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(id) => Some(FrameRequest(id as u64)),
            Err(err) => {
                log::warn!("requestAnimationFrame failed: {:?}", err);
                None
            }
        }
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if let Err(err) = self.window.cancel_animation_frame(request.0 as i32) {
            log::warn!("cancelAnimationFrame failed: {:?}", err);
        }
    }
}

pub struct Clock<F: FrameSource> {
    source: F,
    pending: Option<FrameRequest>,
    last_time_ms: Option<f64>,
}

impl<F: FrameSource> Clock<F> {
    pub fn new(source: F) -> Self {
        Self {
            source,
            pending: None,
            last_time_ms: None,
        }
    }

    pub fn pending(&self) -> Option<FrameRequest> {
        self.pending
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    pub fn source(&self) -> &F {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut F {
        &mut self.source
    }

    /// Schedule the next frame if the session is playing and none is pending
    pub fn arm(&mut self, status: SessionStatus) -> bool {
        if status != SessionStatus::Playing {
            return false;
        }
        if self.pending.is_none() {
            self.pending = self.source.request_frame();
        }
        self.pending.is_some()
    }

    /// Deliver a frame callback. Returns false for stale requests.
    pub fn fire(&mut self, request: FrameRequest, time_ms: f64, engine: &mut Engine) -> bool {
        if self.pending != Some(request) {
            log::debug!("Ignoring stale frame {:?}", request);
            return false;
        }
        self.pending = None;

        let dt = match self.last_time_ms {
            Some(last) => ((time_ms - last) / 1000.0) as f32,
            None => REFERENCE_DT,
        };
        self.last_time_ms = Some(time_ms);

        engine.frame(dt);
        if !self.arm(engine.status()) {
            self.last_time_ms = None;
        }
        true
    }

    /// Deliver a callback that carries no request handle (browser frames)
    pub fn fire_pending(&mut self, time_ms: f64, engine: &mut Engine) -> bool {
        match self.pending {
            Some(request) => self.fire(request, time_ms, engine),
            None => false,
        }
    }

    /// Cancel the pending frame, if any
    pub fn stop(&mut self) {
        if let Some(request) = self.pending.take() {
            self.source.cancel_frame(request);
        }
        self.last_time_ms = None;
    }

    /// Leave `Idle` and begin ticking
    pub fn start(&mut self, engine: &mut Engine) -> bool {
        engine.start();
        self.arm(engine.status())
    }

    /// Cancel pending work before the session is reinitialized, then re-arm
    pub fn restart(&mut self, engine: &mut Engine) -> bool {
        self.stop();
        engine.reset();
        self.arm(engine.status())
    }
}

impl<F: FrameSource> Drop for Clock<F> {
    fn drop(&mut self) {
        self.stop();
    }
}
