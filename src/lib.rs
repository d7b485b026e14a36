//! Bounce Arena - bouncing bodies with a two-peer click race
//!
//! Core modules:
//! - `sim`: Physics simulation (bodies, wall reflection, elastic collisions)
//! - `sync`: Shared state exchanged between peers and its convergent merge
//! - `game`: Session state machine driving the host transport
//! - `scene`: Fixed-timestep loop tying the simulation to the controller
//! - `platform`: Transport implementations (in-process loopback, browser SDK)
//! - `settings`: Data-driven arena and game configuration

pub mod error;
pub mod game;
pub mod platform;
pub mod scene;
pub mod settings;
pub mod sim;
pub mod sync;

pub use error::{SettingsError, SyncError, TransportError};
pub use game::{GameController, GamePhase, Mode, Session, Transport, TransportEvent};
pub use scene::DemoScene;
pub use settings::Settings;
pub use sim::{Body, PhysicsWorld};
pub use sync::{IncomingState, SyncState, merge};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz for smooth physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta accepted from the host loop (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 720.0;
    pub const ARENA_HEIGHT: f32 = 1080.0;

    /// Body defaults
    pub const BODY_COUNT: usize = 15;
    pub const BODY_MIN_RADIUS: u32 = 25;
    pub const BODY_MAX_RADIUS: u32 = 60;
    /// Per-axis speed bound for spawned bodies (pixels/s)
    pub const BODY_MAX_SPEED: i32 = 300;

    /// Clicks needed to declare the game over
    pub const CLICK_THRESHOLD: u32 = 3;

    /// Delay between `ready()` and the first multiplayer broadcast (seconds)
    pub const INITIAL_BROADCAST_DELAY: f32 = 0.1;
    /// Delay between a restart and re-broadcasting the fresh state (seconds)
    pub const RESTART_BROADCAST_DELAY: f32 = 0.01;
}
