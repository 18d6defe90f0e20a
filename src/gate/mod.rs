//! Client-side gating protocol.

pub mod loader;
