//! Authentication domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A subject identity: the user an access token is issued for.
///
/// Immutable once resolved for a request; mutated only through the store.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    /// Role labels (e.g. `["ADMIN"]`).
    pub roles: Vec<String>,
    /// Inactive users cannot log in or pass the authentication gate.
    pub active: bool,
}

/// JWT claims embedded in access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — username (standard JWT `sub` claim).
    pub sub: String,
    /// Role labels carried for downstream authorization decisions.
    pub roles: Vec<String>,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
}

/// Refresh token record as persisted by the store.
///
/// The token itself is never stored; only its SHA-256 digest. The owning
/// subject is referenced by username — the user row may be deleted
/// independently of outstanding refresh tokens.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}
