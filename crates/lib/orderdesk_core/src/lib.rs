//! # orderdesk_core
//!
//! Core domain logic for Orderdesk: authentication primitives (JWT access
//! tokens, bcrypt passwords, refresh-token lifecycle), the query cache, and
//! the data-store abstraction with in-memory and PostgreSQL backends.

pub mod auth;
pub mod cache;
pub mod migrate;
pub mod models;
pub mod store;
