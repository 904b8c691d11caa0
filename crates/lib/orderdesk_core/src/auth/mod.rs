//! Authentication and session-lifecycle logic.
//!
//! Provides password hashing, JWT access-token issuance/verification, and
//! the refresh-token state machine shared by the HTTP layer.

pub mod jwt;
pub mod password;
pub mod refresh;

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors.
///
/// The HTTP layer maps all of these to generic 401 responses; the variants
/// exist so the distinct cause can be logged server-side.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Refresh token not found")]
    TokenNotFound,

    #[error("Refresh token expired")]
    TokenExpired,

    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
