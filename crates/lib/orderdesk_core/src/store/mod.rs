//! Data-store abstraction.
//!
//! The service layer talks to storage only through the [`Store`] trait:
//! narrow CRUD operations on users, refresh tokens, orders and items. Two
//! backends implement it — [`memory::MemoryStore`] for tests and local runs,
//! [`postgres::PgStore`] for production. Each trait method is atomic: a
//! mutation either applies all of its row changes or none.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::auth::{RefreshTokenRecord, User};
use crate::models::order::{Item, NewItem, NewOrder, Order, Page};

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Order not found with id: {0}")]
    OrderNotFound(i64),

    #[error("Item not found with id: {0}")]
    ItemNotFound(i64),

    #[error("Order number already exists: {0}")]
    DuplicateOrderNumber(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Internal store error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Boxed store handle shared across request handlers.
pub type DynStore = Arc<dyn Store>;

/// The data-store contract. Implementations must be safe under concurrent
/// invocation from request-parallel handlers.
#[async_trait]
pub trait Store: Send + Sync {
    // ==================== Users ====================

    /// Look up a subject by username.
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Create a user (used by startup seeding).
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        roles: &[String],
    ) -> StoreResult<User>;

    /// Set a user's active flag. An inactive user cannot log in and fails
    /// the authentication gate even with a still-valid token. Unknown
    /// usernames are a no-op.
    async fn set_user_active(&self, username: &str, active: bool) -> StoreResult<()>;

    // ==================== Refresh tokens ====================

    /// Persist a refresh-token record. Existing records for the same subject
    /// are left untouched.
    async fn insert_refresh_token(&self, record: &RefreshTokenRecord) -> StoreResult<()>;

    /// Exact-match lookup by token digest; returns expired records too.
    async fn find_refresh_token(&self, token_hash: &str)
        -> StoreResult<Option<RefreshTokenRecord>>;

    /// Delete a refresh-token record. Deleting an absent record is a no-op.
    async fn delete_refresh_token(&self, token_hash: &str) -> StoreResult<()>;

    // ==================== Orders ====================

    /// Insert an order together with its items as one atomic operation.
    async fn insert_order(&self, new: &NewOrder) -> StoreResult<Order>;

    /// Read an order (items included) by id.
    async fn get_order(&self, id: i64) -> StoreResult<Option<Order>>;

    /// List orders with pagination and sorting; returns the page of orders
    /// plus the total count across all pages.
    async fn list_orders(&self, page: &Page) -> StoreResult<(Vec<Order>, u64)>;

    /// Replace an order's client-writable fields and its whole item set
    /// atomically. Fails with [`StoreError::OrderNotFound`] if absent.
    async fn update_order(&self, id: i64, new: &NewOrder) -> StoreResult<Order>;

    /// Delete an order and its items. Fails with
    /// [`StoreError::OrderNotFound`] if absent.
    async fn delete_order(&self, id: i64) -> StoreResult<()>;

    /// Uniqueness probe for order numbers; `exclude` skips one order id so
    /// updates can keep their own number.
    async fn order_number_exists(&self, number: &str, exclude: Option<i64>) -> StoreResult<bool>;

    // ==================== Items ====================

    /// Add an item to an order, recomputing the order total. Fails with
    /// [`StoreError::OrderNotFound`] if the order is absent.
    async fn insert_item(&self, order_id: i64, item: &NewItem) -> StoreResult<Item>;

    /// Replace an item's fields, recomputing the owning order's total.
    /// Returns the item and the owning order id.
    async fn update_item(&self, id: i64, item: &NewItem) -> StoreResult<(Item, i64)>;

    /// Delete an item, recomputing the owning order's total. Returns the
    /// owning order id. Fails with [`StoreError::ItemNotFound`] if absent.
    async fn delete_item(&self, id: i64) -> StoreResult<i64>;
}
