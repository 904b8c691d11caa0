//! Request and response DTOs (camelCase on the wire).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::models::order::{
    Item, NewItem, NewOrder, Order, OrderStatus, PaymentStatus,
};

/// `POST /api/auth/login` body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `POST /api/auth/refresh` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access-token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRequest {
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub image_url: Option<String>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub order_number: String,
    pub customer_name: String,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub image_url: Option<String>,
    pub weight: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i64,
    pub order_number: String,
    pub customer_name: String,
    pub created_at: DateTime<Utc>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_address: Option<String>,
    pub billing_address: Option<String>,
    pub tracking_number: Option<String>,
    pub items: Vec<ItemResponse>,
}

/// A page of results plus pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResponse<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

/// Error body shared by all failure responses.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<HashMap<String, String>>,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            sku: item.sku,
            name: item.name,
            quantity: item.quantity,
            unit_price: item.unit_price,
            image_url: item.image_url,
            weight: item.weight,
        }
    }
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number,
            customer_name: order.customer_name,
            created_at: order.created_at,
            total_amount: order.total_amount,
            status: order.status,
            payment_status: order.payment_status,
            shipping_address: order.shipping_address,
            billing_address: order.billing_address,
            tracking_number: order.tracking_number,
            items: order.items.into_iter().map(ItemResponse::from).collect(),
        }
    }
}

impl From<&ItemRequest> for NewItem {
    fn from(req: &ItemRequest) -> Self {
        Self {
            sku: req.sku.clone(),
            name: req.name.clone(),
            quantity: req.quantity,
            unit_price: req.unit_price,
            image_url: req.image_url.clone(),
            weight: req.weight,
        }
    }
}

impl From<&OrderRequest> for NewOrder {
    fn from(req: &OrderRequest) -> Self {
        Self {
            order_number: req.order_number.clone(),
            customer_name: req.customer_name.clone(),
            shipping_address: req.shipping_address.clone(),
            billing_address: req.billing_address.clone(),
            items: req.items.iter().map(NewItem::from).collect(),
        }
    }
}
