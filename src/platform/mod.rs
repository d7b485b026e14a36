//! Platform abstraction layer
//!
//! Transport implementations for the host messaging SDK:
//! - `loopback`: in-process peers (native demo, tests)
//! - `web`: `window.FarcadeSDK` in the browser

pub mod loopback;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use loopback::{LoopbackNetwork, LoopbackPeer};
#[cfg(target_arch = "wasm32")]
pub use web::WebTransport;
