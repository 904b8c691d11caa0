//! Order request handlers.

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use orderdesk_core::models::order::{Page, SortDir};

use crate::error::AppResult;
use crate::models::{OrderRequest, OrderResponse, PagedResponse};
use crate::services::orders;
use crate::AppState;

/// Largest page a single request may ask for.
const MAX_PAGE_SIZE: u32 = 100;

/// Query parameters for `GET /api/orders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl ListParams {
    fn into_page(self) -> Page {
        let sort_dir = match self.sort_dir.as_deref() {
            Some(d) if d.eq_ignore_ascii_case("asc") => SortDir::Asc,
            _ => SortDir::Desc,
        };
        // Clients sort by response field names; the store speaks columns.
        let sort_by = match self.sort_by.as_deref() {
            Some("orderNumber") => "order_number",
            Some("customerName") => "customer_name",
            Some("totalAmount") => "total_amount",
            Some("id") => "id",
            _ => "created_at",
        };
        Page {
            page: self.page.unwrap_or(0),
            size: self.size.unwrap_or(10).clamp(1, MAX_PAGE_SIZE),
            sort_by: sort_by.to_string(),
            sort_dir,
        }
    }
}

/// `GET /api/orders` — paginated order listing.
pub async fn list_orders_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> AppResult<Json<PagedResponse<OrderResponse>>> {
    let resp = orders::find_all(&state, params.into_page()).await?;
    Ok(Json(resp))
}

/// `GET /api/orders/{id}` — fetch one order.
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderResponse>> {
    let resp = orders::find_by_id(&state, id).await?;
    Ok(Json(resp))
}

/// `POST /api/orders` — create an order; 201 with a Location header.
pub async fn create_order_handler(
    State(state): State<AppState>,
    Json(body): Json<OrderRequest>,
) -> AppResult<impl IntoResponse> {
    let resp = orders::create(&state, body).await?;
    let location = format!("/api/orders/{}", resp.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(resp),
    ))
}

/// `PUT /api/orders/{id}` — replace an order's fields and items.
pub async fn update_order_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<OrderRequest>,
) -> AppResult<Json<OrderResponse>> {
    let resp = orders::update(&state, id, body).await?;
    Ok(Json(resp))
}

/// `DELETE /api/orders/{id}` — delete an order; 204 on success.
pub async fn delete_order_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    orders::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
