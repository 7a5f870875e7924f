//! Neon Arcade entry point
//!
//! On the web the engine is driven by requestAnimationFrame and DOM events.
//! Natively it runs a headless autopilot demo and prints the final snapshot.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod web_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use web_sys::{Event, EventTarget, KeyboardEvent};

    use neon_arcade::platform::{AnimationFrames, Clock, Control};
    use neon_arcade::sim::{Direction, Snapshot};
    use neon_arcade::{Engine, Settings};

    /// Element carrying the `data-arcade` settings attribute
    const BOARD_ID: &str = "arcade-board";
    /// Lane buttons are `lane-0`, `lane-1`, ...
    const LANE_BUTTONS: u8 = 9;

    #[wasm_bindgen(inline_js = "
        export function publish_snapshot(json) {
            window.dispatchEvent(new CustomEvent('arcade-snapshot', { detail: json }));
        }
    ")]
    extern "C" {
        fn publish_snapshot(json: &str);
    }

    struct WebGame {
        engine: Engine,
        clock: Clock<AnimationFrames>,
    }

    impl WebGame {
        /// Serialize now, dispatch once the game is no longer borrowed
        fn snapshot_json(&self) -> Option<String> {
            to_json(self.engine.snapshot())
        }
    }

    fn to_json(snapshot: &Snapshot) -> Option<String> {
        snapshot
            .to_json()
            .map_err(|err| log::warn!("Snapshot serialization failed: {err}"))
            .ok()
    }

    /// Page listeners may call back into the game, so never hold a borrow here
    fn publish(json: Option<String>) {
        if let Some(json) = json {
            publish_snapshot(&json);
        }
    }

    fn listen(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) {
        let closure = Closure::<dyn FnMut(_)>::new(handler);
        let _ = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Neon Arcade starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        let mut settings = Settings::from_document(BOARD_ID).unwrap_or_else(|err| {
            log::error!("{err}; falling back to defaults");
            Settings::default()
        });
        if settings.seed.is_none() {
            settings.seed = Some(js_sys::Date::now() as u64);
        }
        let engine = match Engine::new(&settings) {
            Ok(engine) => engine,
            Err(err) => {
                log::error!("{err}");
                return;
            }
        };

        let game = Rc::new(RefCell::new(WebGame {
            engine,
            clock: Clock::new(AnimationFrames::new(window.clone())),
        }));

        // Weak so the game owns its frame callback without a cycle
        let weak = Rc::downgrade(&game);
        let on_frame = Closure::<dyn FnMut(f64)>::new(move |time: f64| {
            let Some(game) = weak.upgrade() else {
                return;
            };
            let json = {
                let mut g = game.borrow_mut();
                let WebGame { engine, clock } = &mut *g;
                if !clock.fire_pending(time, engine) {
                    return;
                }
                g.snapshot_json()
            };
            publish(json);
        });

        let json = {
            let mut g = game.borrow_mut();
            let WebGame { engine, clock } = &mut *g;
            clock.source_mut().set_callback(on_frame);
            clock.arm(engine.status());
            g.snapshot_json()
        };
        publish(json);

        setup_keyboard(&window, game.clone());
        setup_pointer_controls(&document, game.clone());
        setup_session_buttons(&document, game.clone());
        setup_teardown(&window, game);

        log::info!("Neon Arcade running!");
    }

    fn setup_keyboard(window: &web_sys::Window, game: Rc<RefCell<WebGame>>) {
        {
            let game = game.clone();
            listen(window, "keydown", move |event| {
                let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                    return;
                };
                let mut g = game.borrow_mut();
                if g.engine.input_mut().key_down(&event.key(), event.repeat()) {
                    event.prevent_default();
                }
            });
        }
        listen(window, "keyup", move |event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            game.borrow_mut().engine.input_mut().key_up(&event.key());
        });
    }

    fn setup_pointer_controls(document: &web_sys::Document, game: Rc<RefCell<WebGame>>) {
        let mut controls = vec![
            ("btn-left".to_string(), Control::Move(Direction::Left)),
            ("btn-right".to_string(), Control::Move(Direction::Right)),
            ("btn-fire".to_string(), Control::Action),
        ];
        controls.extend((0..LANE_BUTTONS).map(|lane| (format!("lane-{lane}"), Control::Lane(lane))));

        for (id, control) in controls {
            let Some(button) = document.get_element_by_id(&id) else {
                continue;
            };
            {
                let game = game.clone();
                listen(&button, "pointerdown", move |event| {
                    event.prevent_default();
                    game.borrow_mut().engine.input_mut().pointer_down(control);
                });
            }
            {
                let game = game.clone();
                listen(&button, "pointerup", move |_| {
                    game.borrow_mut().engine.input_mut().pointer_up(control);
                });
            }
            for leave in ["pointerleave", "pointercancel"] {
                let game = game.clone();
                listen(&button, leave, move |_| {
                    game.borrow_mut().engine.input_mut().pointer_leave();
                });
            }
        }
    }

    fn setup_session_buttons(document: &web_sys::Document, game: Rc<RefCell<WebGame>>) {
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let game = game.clone();
            listen(&btn, "click", move |_| {
                let json = {
                    let mut g = game.borrow_mut();
                    let WebGame { engine, clock } = &mut *g;
                    clock.start(engine);
                    g.snapshot_json()
                };
                publish(json);
            });
        }
        if let Some(btn) = document.get_element_by_id("restart-btn") {
            listen(&btn, "click", move |_| {
                let json = {
                    let mut g = game.borrow_mut();
                    let WebGame { engine, clock } = &mut *g;
                    clock.restart(engine);
                    g.snapshot_json()
                };
                log::info!("Session restarted");
                publish(json);
            });
        }
    }

    /// Cancel the pending frame when the page goes away
    fn setup_teardown(window: &web_sys::Window, game: Rc<RefCell<WebGame>>) {
        listen(window, "pagehide", move |_| {
            game.borrow_mut().clock.stop();
            log::info!("Frame clock stopped");
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    web_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::Path;

    use neon_arcade::platform::{Clock, ManualFrames};
    use neon_arcade::{ConfigError, Engine, Settings};

    const DEFAULT_TICKS: u64 = 60 * 60;
    const FRAME_MS: f64 = 1000.0 / 60.0;

    /// `neon-arcade [variant | settings.json] [ticks]`
    pub fn run() -> Result<(), ConfigError> {
        let mut args = std::env::args().skip(1);
        let settings = match args.next() {
            Some(arg) if arg.ends_with(".json") => Settings::load(Path::new(&arg))?,
            Some(arg) => Settings::for_variant(arg.parse()?),
            None => Settings::default(),
        };
        let ticks = match args.next() {
            Some(arg) => arg
                .parse::<u64>()
                .map_err(|err| ConfigError::invalid("ticks", err.to_string()))?,
            None => DEFAULT_TICKS,
        };

        let mut engine = Engine::new(&settings)?;
        let mut clock = Clock::new(ManualFrames::new());
        clock.start(&mut engine);

        let mut time = 0.0;
        let mut delivered = 0;
        while delivered < ticks {
            let Some(request) = clock.source_mut().take_next() else {
                break;
            };
            engine.drive_autopilot();
            clock.fire(request, time, &mut engine);
            time += FRAME_MS;
            delivered += 1;
        }
        clock.stop();

        let snapshot = engine.snapshot();
        log::info!(
            "{} finished: {:?} after {} ticks, score {}",
            settings.variant.as_str(),
            snapshot.status,
            snapshot.tick,
            snapshot.score
        );
        println!("{}", snapshot.to_json()?);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Neon Arcade (native) starting...");

    if let Err(err) = native::run() {
        log::error!("{err}");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
