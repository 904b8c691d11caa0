//! Business services orchestrating the store and the cache.

pub mod auth;
pub mod items;
pub mod orders;
