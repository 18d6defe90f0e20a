//! Domain pattern matching.

pub mod matcher;
