//! Authentication request handlers.

use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::models::{LoginRequest, RefreshRequest, TokenResponse};
use crate::services::auth;
use crate::AppState;

/// `POST /api/auth/login` — authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::login(&state, &body.username, &body.password).await?;
    Ok(Json(resp))
}

/// `POST /api/auth/refresh` — exchange a refresh token for a new access token.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    let resp = auth::refresh_token(&state, &body.refresh_token).await?;
    Ok(Json(resp))
}
