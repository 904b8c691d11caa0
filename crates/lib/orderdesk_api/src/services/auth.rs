//! Authentication service — login and refresh flows.

use tracing::{info, warn};

use orderdesk_core::auth::jwt::{issue_access_token, ACCESS_TOKEN_TTL_SECS};
use orderdesk_core::auth::{password, refresh, AuthError};

use crate::error::{AppError, AppResult};
use crate::models::TokenResponse;
use crate::AppState;

fn token_response(access_token: String, refresh_token: String) -> TokenResponse {
    TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: ACCESS_TOKEN_TTL_SECS,
    }
}

/// Authenticate with username + password.
///
/// Unknown user, inactive user and wrong password are indistinguishable to
/// the caller; only the logs say which it was.
pub async fn login(state: &AppState, username: &str, password_in: &str) -> AppResult<TokenResponse> {
    let user = match state.store.find_user_by_username(username).await? {
        Some(u) => u,
        None => {
            warn!(username, "login attempt for unknown user");
            return Err(AppError::Unauthorized("Invalid credentials"));
        }
    };

    if !user.active {
        warn!(username, "login attempt for inactive user");
        return Err(AppError::Unauthorized("Invalid credentials"));
    }

    if !password::verify_password(password_in, &user.password_hash)? {
        warn!(username, "login attempt with wrong password");
        return Err(AppError::Unauthorized("Invalid credentials"));
    }

    let access = issue_access_token(&user.username, &user.roles, state.config.jwt_secret.as_bytes())?;
    let (refresh_token, _) = refresh::create(state.store.as_ref(), &user.username).await?;

    info!(username, "login succeeded");
    Ok(token_response(access, refresh_token))
}

/// Exchange a refresh token for a new access token.
///
/// The refresh token itself is returned unchanged — no rotation on use. An
/// expired record is deleted by the expiry check before this fails.
pub async fn refresh_token(state: &AppState, token: &str) -> AppResult<TokenResponse> {
    let store = state.store.as_ref();

    let record = refresh::find_by_token(store, token)
        .await?
        .ok_or(AuthError::TokenNotFound)?;
    let record = refresh::verify_not_expired(store, record).await?;

    // The subject may have been deleted or deactivated since login.
    let user = state
        .store
        .find_user_by_username(&record.username)
        .await?
        .filter(|u| u.active)
        .ok_or_else(|| {
            warn!(username = %record.username, "refresh for unknown or inactive subject");
            AppError::Unauthorized("Invalid refresh token")
        })?;

    let access = issue_access_token(&user.username, &user.roles, state.config.jwt_secret.as_bytes())?;
    Ok(token_response(access, token.to_string()))
}
