//! Order service — CRUD orchestration with read-through caching.
//!
//! Reads consult the cache first and populate it on miss. Every mutation
//! invalidates after the store reports the change committed, never before,
//! so a failed mutation leaves the cache untouched and a successful one is
//! never observable alongside stale entries.

use std::collections::HashMap;

use tracing::info;

use orderdesk_core::cache::QueryCache;
use orderdesk_core::models::order::{NewOrder, Page};

use crate::error::{AppError, AppResult};
use crate::models::{OrderRequest, OrderResponse, PagedResponse};
use crate::services::items::validate_item_fields;
use crate::AppState;

fn validate(request: &OrderRequest) -> AppResult<()> {
    let mut errors = HashMap::new();
    if request.order_number.trim().is_empty() {
        errors.insert("orderNumber".to_string(), "Order number is required".to_string());
    }
    if request.customer_name.trim().is_empty() {
        errors.insert("customerName".to_string(), "Customer name is required".to_string());
    }
    if request.items.is_empty() {
        errors.insert(
            "items".to_string(),
            "Order must have at least one item".to_string(),
        );
    }
    for (idx, item) in request.items.iter().enumerate() {
        validate_item_fields(&format!("items[{idx}]."), item, &mut errors);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn decode_cached<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> AppResult<T> {
    serde_json::from_value(value).map_err(|e| AppError::Internal(format!("cache decode: {e}")))
}

/// List orders with pagination, read-through cached per parameter set.
pub async fn find_all(state: &AppState, page: Page) -> AppResult<PagedResponse<OrderResponse>> {
    let key = QueryCache::collection_key(&page);
    if let Some(cached) = state.cache.read().await.get(&key) {
        return decode_cached(cached);
    }

    let (orders, total) = state.store.list_orders(&page).await?;
    let response = PagedResponse {
        content: orders.into_iter().map(OrderResponse::from).collect(),
        page: page.page,
        size: page.size,
        total_elements: total,
        total_pages: total.div_ceil(u64::from(page.size.max(1))),
    };

    let value = serde_json::to_value(&response)
        .map_err(|e| AppError::Internal(format!("cache encode: {e}")))?;
    state.cache.write().await.insert(key, value);
    Ok(response)
}

/// Fetch a single order, read-through cached by id.
pub async fn find_by_id(state: &AppState, id: i64) -> AppResult<OrderResponse> {
    let key = QueryCache::order_key(id);
    if let Some(cached) = state.cache.read().await.get(&key) {
        return decode_cached(cached);
    }

    let order = state
        .store
        .get_order(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Order not found with id: {id}")))?;
    let response = OrderResponse::from(order);

    let value = serde_json::to_value(&response)
        .map_err(|e| AppError::Internal(format!("cache encode: {e}")))?;
    state.cache.write().await.insert(key, value);
    Ok(response)
}

/// Create an order with its items.
pub async fn create(state: &AppState, request: OrderRequest) -> AppResult<OrderResponse> {
    validate(&request)?;

    if state
        .store
        .order_number_exists(&request.order_number, None)
        .await?
    {
        return Err(AppError::Conflict(format!(
            "Order number already exists: {}",
            request.order_number
        )));
    }

    let order = state.store.insert_order(&NewOrder::from(&request)).await?;
    let response = OrderResponse::from(order);

    state.cache.write().await.invalidate_order(response.id);
    info!(order_id = response.id, order_number = %response.order_number, "order created");
    Ok(response)
}

/// Replace an order's client-writable fields and item set.
pub async fn update(state: &AppState, id: i64, request: OrderRequest) -> AppResult<OrderResponse> {
    validate(&request)?;

    if state.store.get_order(id).await?.is_none() {
        return Err(AppError::NotFound(format!("Order not found with id: {id}")));
    }
    // An unchanged number only matches the order itself, which is excluded.
    if state
        .store
        .order_number_exists(&request.order_number, Some(id))
        .await?
    {
        return Err(AppError::Conflict(format!(
            "Order number already exists: {}",
            request.order_number
        )));
    }

    let order = state
        .store
        .update_order(id, &NewOrder::from(&request))
        .await?;
    let response = OrderResponse::from(order);

    state.cache.write().await.invalidate_order(id);
    info!(order_id = id, "order updated");
    Ok(response)
}

/// Delete an order and its items.
pub async fn delete(state: &AppState, id: i64) -> AppResult<()> {
    state.store.delete_order(id).await?;
    state.cache.write().await.invalidate_order(id);
    info!(order_id = id, "order deleted");
    Ok(())
}
