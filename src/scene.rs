//! Demo scene: the arena plus the click race
//!
//! Owns the physics world, the game controller and the transport, and
//! advances them from the host's frame callback.

use crate::consts::*;
use crate::error::TransportError;
use crate::game::{GameController, Mode, Transport, TransportEvent};
use crate::settings::Settings;
use crate::sim::{PhysicsWorld, StepReport};

/// Scene instance holding all state
pub struct DemoScene<T: Transport> {
    world: PhysicsWorld,
    controller: GameController,
    transport: T,
    accumulator: f32,
    /// Physics events since the scene was created
    totals: StepReport,
    /// Controller generation the arena was last reset for
    arena_generation: u32,
}

impl<T: Transport> DemoScene<T> {
    pub fn new(settings: &Settings, transport: T) -> Self {
        let mode = Mode::resolve(Mode::build_flag(), settings.multiplayer, || {
            transport.supports_multiplayer()
        });
        let seed = settings.resolve_seed();
        let controller = GameController::new(mode, settings.click_threshold);

        Self {
            world: PhysicsWorld::new(settings, seed),
            arena_generation: controller.generation(),
            controller,
            transport,
            accumulator: 0.0,
            totals: StepReport::default(),
        }
    }

    pub fn world(&self) -> &PhysicsWorld {
        &self.world
    }

    pub fn controller(&self) -> &GameController {
        &self.controller
    }

    pub fn step_totals(&self) -> StepReport {
        self.totals
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Register listeners and signal the host that the scene is interactive
    pub fn start(&mut self) -> Result<(), TransportError> {
        self.controller.start(&mut self.transport)
    }

    /// Pointer pressed anywhere in the scene
    pub fn pointer_down(&mut self) -> Result<(), TransportError> {
        self.controller.click(&mut self.transport)
    }

    /// Apply one host event
    pub fn handle_event(&mut self, event: TransportEvent) -> Result<(), TransportError> {
        let result = self.controller.handle_event(event, &mut self.transport);
        self.sync_arena();
        result
    }

    /// Drain and apply every pending host event, stopping at the first error
    pub fn pump_events(&mut self) -> Result<(), TransportError> {
        for event in self.transport.poll_events() {
            self.handle_event(event)?;
        }
        Ok(())
    }

    /// Run fixed simulation steps for a frame of `frame_dt` seconds.
    /// Returns the number of physics substeps taken.
    pub fn update(&mut self, frame_dt: f32) -> Result<u32, TransportError> {
        let dt = frame_dt.clamp(0.0, MAX_FRAME_DT);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.totals += self.world.step(SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        // Drop backlog we could not simulate this frame
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        let result = self.controller.advance(dt, &mut self.transport);
        self.sync_arena();
        result.map(|_| substeps)
    }

    /// Scatter the bodies whenever the controller has started a new session
    fn sync_arena(&mut self) {
        let generation = self.controller.generation();
        if generation != self.arena_generation {
            self.world.respawn();
            self.arena_generation = generation;
        }
    }
}
