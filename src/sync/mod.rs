//! Peer synchronization
//!
//! The wire-level snapshot (`SyncState`), its classification at the transport
//! boundary (`IncomingState`), and the pure convergent `merge`.

pub mod merge;
pub mod state;

pub use merge::merge;
pub use state::{
    GameOutcome, IncomingState, PlayerId, PlayerInfo, PlayerScore, StateUpdate, SyncState,
};
