//! Domain models shared across the store backends and the HTTP layer.

pub mod auth;
pub mod order;
