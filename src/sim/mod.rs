//! Physics simulation module
//!
//! Bodies bouncing in a rectangular arena. This module must stay free of
//! game and platform logic:
//! - Fixed timestep supplied by the caller
//! - Seeded RNG only
//! - Stable iteration order (by body index)

pub mod body;
pub mod collision;
pub mod world;

pub use body::Body;
pub use collision::{COINCIDENT_EPSILON, Contact, reflect_off_walls, resolve_pair};
pub use world::{PhysicsWorld, StepReport, step_bodies};
