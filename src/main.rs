//! Bounce Arena entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use bounce_arena::platform::WebTransport;
    use bounce_arena::{DemoScene, Settings, Transport};

    type Scene = DemoScene<WebTransport>;

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");
        log::info!("Bounce Arena starting...");

        let settings = Settings::load();
        let transport = WebTransport::new();
        if !transport.is_present() {
            log::warn!("FarcadeSDK not found, host events will not arrive");
        }

        let scene = Rc::new(RefCell::new(DemoScene::new(&settings, transport)));
        if let Err(e) = scene.borrow_mut().start() {
            log::error!("Failed to start scene: {}", e);
        }

        setup_pointer(scene.clone());
        start_frame_loop(scene);
        log::info!("Bounce Arena running!");
    }

    fn setup_pointer(scene: Rc<RefCell<Scene>>) {
        let Some(window) = web_sys::window() else {
            log::error!("No window");
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::PointerEvent| {
            if let Err(e) = scene.borrow_mut().pointer_down() {
                log::warn!("Click not delivered: {}", e);
            }
        });
        let _ = window
            .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(f: &Closure<dyn FnMut(f64)>) {
        if let Some(window) = web_sys::window() {
            let _ = window.request_animation_frame(f.as_ref().unchecked_ref());
        }
    }

    fn start_frame_loop(scene: Rc<RefCell<Scene>>) {
        let f: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
        let g = f.clone();
        let mut last_time: Option<f64> = None;

        *g.borrow_mut() = Some(Closure::new(move |time: f64| {
            let dt = last_time.map(|last| ((time - last) / 1000.0) as f32).unwrap_or(0.0);
            last_time = Some(time);

            {
                let mut scene = scene.borrow_mut();
                for event in scene.transport_mut().poll_events() {
                    if let Err(e) = scene.handle_event(event) {
                        log::warn!("Event handling failed: {}", e);
                    }
                }
                if let Err(e) = scene.update(dt) {
                    log::warn!("Scheduled broadcast failed: {}", e);
                }
            }

            if let Some(cb) = f.borrow().as_ref() {
                request_animation_frame(cb);
            }
        }));

        if let Some(cb) = g.borrow().as_ref() {
            request_animation_frame(cb);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    let settings = bounce_arena::Settings::load();
    let level = if settings.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    log::info!("Bounce Arena (native) starting...");
    log::info!("Native mode runs a headless two-peer session over the loopback transport");

    if let Err(e) = headless::run(settings) {
        log::error!("Headless session failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use bounce_arena::platform::{LoopbackNetwork, LoopbackPeer};
    use bounce_arena::{DemoScene, GamePhase, Settings, TransportError};

    const FRAME_DT: f32 = 1.0 / 60.0;

    /// Two peers racing to the click threshold over a lossy-ordered network,
    /// then a rematch.
    pub fn run(mut settings: Settings) -> Result<(), TransportError> {
        settings.multiplayer = Some(true);
        let seed = settings.resolve_seed();
        settings.seed = Some(seed);

        let network = LoopbackNetwork::with_chaos(seed, 0.3, true);
        let mut scenes = [
            DemoScene::new(&settings, network.join("p1", "Alice")),
            DemoScene::new(&settings, network.join("p2", "Bob")),
        ];
        for scene in scenes.iter_mut() {
            scene.start()?;
        }
        network.announce_roster();
        run_frames(&mut scenes, 30)?;

        for round in 1..=2 {
            // Bob clicks once, Alice races to the threshold
            scenes[1].pointer_down()?;
            run_frames(&mut scenes, 10)?;
            for _ in 0..settings.click_threshold {
                scenes[0].pointer_down()?;
                run_frames(&mut scenes, 10)?;
            }
            report(round, &scenes);

            network.play_again();
            run_frames(&mut scenes, 10)?;
        }

        let ok = scenes
            .iter()
            .all(|s| s.controller().phase() == GamePhase::Playing);
        log::info!("Rematch ready on both peers: {}", ok);
        Ok(())
    }

    fn run_frames(
        scenes: &mut [DemoScene<LoopbackPeer>],
        frames: u32,
    ) -> Result<(), TransportError> {
        for _ in 0..frames {
            for scene in scenes.iter_mut() {
                scene.pump_events()?;
                scene.update(FRAME_DT)?;
            }
        }
        Ok(())
    }

    fn report(round: u32, scenes: &[DemoScene<LoopbackPeer>]) {
        for scene in scenes {
            let peer = scene.transport();
            let energy = scene.world().total_kinetic_energy();
            let physics = scene.step_totals();
            log::info!(
                "Round {} [{}] phase {:?}, {}, outcome {:?}, arena energy {:.0}, \
                 {} wall hits, {} contacts",
                round,
                peer.id(),
                scene.controller().phase(),
                scene.controller().score_text(),
                peer.outcomes().last(),
                energy,
                physics.wall_hits,
                physics.contacts
            );
        }
    }
}
