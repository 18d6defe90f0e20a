//! License verification layer.

pub mod service;
