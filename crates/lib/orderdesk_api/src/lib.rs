//! # orderdesk_api
//!
//! HTTP API library for Orderdesk: router, authentication middleware,
//! handlers and services over an [`orderdesk_core::store::Store`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use orderdesk_core::cache::QueryCache;
use orderdesk_core::store::DynStore;

use crate::config::ApiConfig;
use crate::handlers::{auth, health, items, orders};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Data store backend.
    pub store: DynStore,
    /// Read-result cache; mutations take the write lock to invalidate.
    pub cache: Arc<RwLock<QueryCache>>,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(store: DynStore, config: ApiConfig) -> Self {
        Self {
            store,
            cache: Arc::new(RwLock::new(QueryCache::new())),
            config,
        }
    }
}

/// Builds the Axum router with all routes and shared state.
///
/// Route protection is data, not annotation: the public router below is the
/// complete bypass list; everything on the protected router passes through
/// the authentication gate before any handler runs.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/refresh", post(auth::refresh_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route("/api/orders", get(orders::list_orders_handler))
        .route("/api/orders", post(orders::create_order_handler))
        .route("/api/orders/{id}", get(orders::get_order_handler))
        .route("/api/orders/{id}", put(orders::update_order_handler))
        .route("/api/orders/{id}", delete(orders::delete_order_handler))
        .route(
            "/api/items/order/{order_id}",
            post(items::create_item_handler),
        )
        .route("/api/items/{id}", put(items::update_item_handler))
        .route("/api/items/{id}", delete(items::delete_item_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
