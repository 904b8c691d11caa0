//! Authentication gate — Bearer token extraction and JWT verification.
//!
//! Runs once per request on the protected router, strictly before any
//! handler or store access. Failures reject with a generic 401; the specific
//! check that failed is only ever logged.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use orderdesk_core::auth::jwt::verify_access_token;
use orderdesk_core::models::auth::User;

use crate::error::AppError;
use crate::AppState;

/// The resolved subject, stored in request extensions for handlers and any
/// downstream authorization decisions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the
/// JWT, resolves the full subject record, and injects [`AuthenticatedUser`]
/// into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            debug!("missing authorization header");
            AppError::Unauthorized("Authentication required")
        })?;

    let token = header.strip_prefix("Bearer ").ok_or_else(|| {
        debug!("authorization header is not a bearer token");
        AppError::Unauthorized("Authentication required")
    })?;

    let claims = verify_access_token(token, state.config.jwt_secret.as_bytes()).ok_or_else(
        || {
            debug!("access token failed verification");
            AppError::Unauthorized("Authentication required")
        },
    )?;

    // The token proves identity; the subject record supplies roles and the
    // active flag for the rest of the request.
    let user = state
        .store
        .find_user_by_username(&claims.sub)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| {
            debug!(subject = %claims.sub, "token subject unknown or inactive");
            AppError::Unauthorized("Authentication required")
        })?;

    request.extensions_mut().insert(AuthenticatedUser(user));

    Ok(next.run(request).await)
}
