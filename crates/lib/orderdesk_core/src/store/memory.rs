//! In-memory store backend.
//!
//! Tables are plain maps behind one `RwLock`; every mutation runs inside a
//! single write-lock scope, which gives the per-call atomicity the trait
//! requires without a transaction log.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::auth::{RefreshTokenRecord, User};
use crate::models::order::{Item, NewItem, NewOrder, Order, Page, SortDir};

use super::{Store, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Inner {
    users: BTreeMap<i64, User>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
    orders: BTreeMap<i64, Order>,
    next_user_id: i64,
    next_order_id: i64,
    next_item_id: i64,
}

/// In-memory [`Store`] implementation for tests and database-less runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn build_items(inner: &mut Inner, new_items: &[NewItem]) -> Vec<Item> {
    new_items
        .iter()
        .map(|item| {
            inner.next_item_id += 1;
            Item {
                id: inner.next_item_id,
                sku: item.sku.clone(),
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                image_url: item.image_url.clone(),
                weight: item.weight,
            }
        })
        .collect()
}

fn recompute_total(order: &mut Order) {
    order.total_amount = order
        .items
        .iter()
        .map(|i| f64::from(i.quantity) * i.unit_price)
        .sum();
}

/// Uniqueness check mirroring the database constraint; must run inside the
/// same write-lock scope as the mutation it guards.
fn order_number_taken(inner: &Inner, number: &str, exclude: Option<i64>) -> bool {
    inner
        .orders
        .values()
        .any(|o| o.order_number == number && Some(o.id) != exclude)
}

fn compare_orders(a: &Order, b: &Order, sort_by: &str) -> std::cmp::Ordering {
    match sort_by {
        "order_number" => a.order_number.cmp(&b.order_number),
        "customer_name" => a.customer_name.cmp(&b.customer_name),
        "total_amount" => a
            .total_amount
            .partial_cmp(&b.total_amount)
            .unwrap_or(std::cmp::Ordering::Equal),
        "id" => a.id.cmp(&b.id),
        // Unknown fields fall back to creation time.
        _ => a.created_at.cmp(&b.created_at),
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        roles: &[String],
    ) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        inner.next_user_id += 1;
        let user = User {
            id: inner.next_user_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            email: email.map(|e| e.to_string()),
            roles: roles.to_vec(),
            active: true,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_user_active(&self, username: &str, active: bool) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.values_mut().find(|u| u.username == username) {
            user.active = active;
        }
        Ok(())
    }

    async fn insert_refresh_token(&self, record: &RefreshTokenRecord) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .refresh_tokens
            .insert(record.token_hash.clone(), record.clone());
        Ok(())
    }

    async fn find_refresh_token(
        &self,
        token_hash: &str,
    ) -> StoreResult<Option<RefreshTokenRecord>> {
        let inner = self.inner.read().await;
        Ok(inner.refresh_tokens.get(token_hash).cloned())
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.refresh_tokens.remove(token_hash);
        Ok(())
    }

    async fn insert_order(&self, new: &NewOrder) -> StoreResult<Order> {
        let mut inner = self.inner.write().await;
        if order_number_taken(&inner, &new.order_number, None) {
            return Err(StoreError::DuplicateOrderNumber(new.order_number.clone()));
        }
        inner.next_order_id += 1;
        let id = inner.next_order_id;
        let items = build_items(&mut inner, &new.items);
        let mut order = Order {
            id,
            order_number: new.order_number.clone(),
            customer_name: new.customer_name.clone(),
            created_at: Utc::now(),
            total_amount: 0.0,
            status: Default::default(),
            payment_status: Default::default(),
            shipping_address: new.shipping_address.clone(),
            billing_address: new.billing_address.clone(),
            tracking_number: None,
            items,
        };
        recompute_total(&mut order);
        inner.orders.insert(id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&id).cloned())
    }

    async fn list_orders(&self, page: &Page) -> StoreResult<(Vec<Order>, u64)> {
        let inner = self.inner.read().await;
        let total = inner.orders.len() as u64;
        let mut orders: Vec<Order> = inner.orders.values().cloned().collect();
        orders.sort_by(|a, b| {
            let ord = compare_orders(a, b, &page.sort_by);
            match page.sort_dir {
                SortDir::Asc => ord,
                SortDir::Desc => ord.reverse(),
            }
        });
        let start = (page.page as usize).saturating_mul(page.size as usize);
        let slice = orders
            .into_iter()
            .skip(start)
            .take(page.size as usize)
            .collect();
        Ok((slice, total))
    }

    async fn update_order(&self, id: i64, new: &NewOrder) -> StoreResult<Order> {
        let mut inner = self.inner.write().await;
        if !inner.orders.contains_key(&id) {
            return Err(StoreError::OrderNotFound(id));
        }
        if order_number_taken(&inner, &new.order_number, Some(id)) {
            return Err(StoreError::DuplicateOrderNumber(new.order_number.clone()));
        }
        let items = build_items(&mut inner, &new.items);
        let order = inner
            .orders
            .get_mut(&id)
            .ok_or(StoreError::OrderNotFound(id))?;
        order.order_number = new.order_number.clone();
        order.customer_name = new.customer_name.clone();
        order.shipping_address = new.shipping_address.clone();
        order.billing_address = new.billing_address.clone();
        order.items = items;
        recompute_total(order);
        Ok(order.clone())
    }

    async fn delete_order(&self, id: i64) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .orders
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::OrderNotFound(id))
    }

    async fn order_number_exists(&self, number: &str, exclude: Option<i64>) -> StoreResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .values()
            .any(|o| o.order_number == number && Some(o.id) != exclude))
    }

    async fn insert_item(&self, order_id: i64, item: &NewItem) -> StoreResult<Item> {
        let mut inner = self.inner.write().await;
        if !inner.orders.contains_key(&order_id) {
            return Err(StoreError::OrderNotFound(order_id));
        }
        inner.next_item_id += 1;
        let stored = Item {
            id: inner.next_item_id,
            sku: item.sku.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            image_url: item.image_url.clone(),
            weight: item.weight,
        };
        let order = inner
            .orders
            .get_mut(&order_id)
            .ok_or(StoreError::OrderNotFound(order_id))?;
        order.items.push(stored.clone());
        recompute_total(order);
        Ok(stored)
    }

    async fn update_item(&self, id: i64, item: &NewItem) -> StoreResult<(Item, i64)> {
        let mut inner = self.inner.write().await;
        for order in inner.orders.values_mut() {
            if let Some(existing) = order.items.iter_mut().find(|i| i.id == id) {
                existing.sku = item.sku.clone();
                existing.name = item.name.clone();
                existing.quantity = item.quantity;
                existing.unit_price = item.unit_price;
                existing.image_url = item.image_url.clone();
                existing.weight = item.weight;
                let updated = existing.clone();
                let order_id = order.id;
                recompute_total(order);
                return Ok((updated, order_id));
            }
        }
        Err(StoreError::ItemNotFound(id))
    }

    async fn delete_item(&self, id: i64) -> StoreResult<i64> {
        let mut inner = self.inner.write().await;
        for order in inner.orders.values_mut() {
            if let Some(pos) = order.items.iter().position(|i| i.id == id) {
                order.items.remove(pos);
                let order_id = order.id;
                recompute_total(order);
                return Ok(order_id);
            }
        }
        Err(StoreError::ItemNotFound(id))
    }
}
