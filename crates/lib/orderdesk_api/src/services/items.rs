//! Item service — mutations on items within an order.
//!
//! Item mutations change the owning order's item set and derived total, so
//! each one invalidates that order's cache entry plus the collection
//! namespace.

use std::collections::HashMap;

use tracing::info;

use orderdesk_core::models::order::NewItem;

use crate::error::{AppError, AppResult};
use crate::models::{ItemRequest, ItemResponse};
use crate::AppState;

/// Field checks shared with nested order validation; `prefix` scopes the
/// error keys (e.g. `items[0].sku`).
pub(crate) fn validate_item_fields(
    prefix: &str,
    item: &ItemRequest,
    errors: &mut HashMap<String, String>,
) {
    if item.sku.trim().is_empty() {
        errors.insert(format!("{prefix}sku"), "SKU is required".to_string());
    }
    if item.name.trim().is_empty() {
        errors.insert(format!("{prefix}name"), "Item name is required".to_string());
    }
    if item.quantity < 1 {
        errors.insert(
            format!("{prefix}quantity"),
            "Quantity must be at least 1".to_string(),
        );
    }
    if item.unit_price <= 0.0 {
        errors.insert(
            format!("{prefix}unitPrice"),
            "Unit price must be positive".to_string(),
        );
    }
}

fn validate(request: &ItemRequest) -> AppResult<()> {
    let mut errors = HashMap::new();
    validate_item_fields("", request, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Add an item to an existing order.
pub async fn create(state: &AppState, order_id: i64, request: ItemRequest) -> AppResult<ItemResponse> {
    validate(&request)?;

    let item = state
        .store
        .insert_item(order_id, &NewItem::from(&request))
        .await?;

    state.cache.write().await.invalidate_order(order_id);
    info!(item_id = item.id, order_id, "item created");
    Ok(ItemResponse::from(item))
}

/// Replace an item's fields.
pub async fn update(state: &AppState, id: i64, request: ItemRequest) -> AppResult<ItemResponse> {
    validate(&request)?;

    let (item, order_id) = state.store.update_item(id, &NewItem::from(&request)).await?;

    state.cache.write().await.invalidate_order(order_id);
    info!(item_id = id, order_id, "item updated");
    Ok(ItemResponse::from(item))
}

/// Delete an item from its order.
pub async fn delete(state: &AppState, id: i64) -> AppResult<()> {
    let order_id = state.store.delete_item(id).await?;

    state.cache.write().await.invalidate_order(order_id);
    info!(item_id = id, order_id, "item deleted");
    Ok(())
}
