//! Item request handlers.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::models::{ItemRequest, ItemResponse};
use crate::services::items;
use crate::AppState;

/// `POST /api/items/order/{order_id}` — add an item to an order; 201.
pub async fn create_item_handler(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(body): Json<ItemRequest>,
) -> AppResult<impl IntoResponse> {
    let resp = items::create(&state, order_id, body).await?;
    let location = format!("/api/items/{}", resp.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(resp),
    ))
}

/// `PUT /api/items/{id}` — replace an item's fields.
pub async fn update_item_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ItemRequest>,
) -> AppResult<Json<ItemResponse>> {
    let resp = items::update(&state, id, body).await?;
    Ok(Json(resp))
}

/// `DELETE /api/items/{id}` — delete an item; 204 on success.
pub async fn delete_item_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    items::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
