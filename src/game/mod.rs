//! Game session logic
//!
//! The click race layered over the arena: per-peer counters, the phase state
//! machine, delayed broadcasts, and the contract with the host transport.

pub mod controller;
pub mod schedule;
pub mod session;
pub mod transport;

pub use controller::{GameController, GamePhase};
pub use schedule::{Scheduler, TaskHandle};
pub use session::Session;
pub use transport::{EventKind, Mode, Transport, TransportEvent};
