//! Wire and storage models.

pub mod models;
