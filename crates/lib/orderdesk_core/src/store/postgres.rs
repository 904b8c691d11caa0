//! PostgreSQL store backend.
//!
//! Plain `query_as` tuple queries over a `PgPool`; mutations that touch more
//! than one row run inside a transaction so the trait's atomicity contract
//! holds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::auth::{RefreshTokenRecord, User};
use crate::models::order::{
    Item, NewItem, NewOrder, Order, OrderStatus, Page, PaymentStatus, SortDir,
};

use super::{Store, StoreError, StoreResult};

/// Columns a listing may sort by; anything else falls back to creation time.
fn sort_column(sort_by: &str) -> &'static str {
    match sort_by {
        "order_number" => "order_number",
        "customer_name" => "customer_name",
        "total_amount" => "total_amount",
        "id" => "id",
        _ => "created_at",
    }
}

/// Map a unique-constraint violation on the order number to its domain error.
fn map_order_insert_err(e: sqlx::Error, number: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &e
        && db.code().as_deref() == Some("23505")
    {
        return StoreError::DuplicateOrderNumber(number.to_string());
    }
    StoreError::Db(e)
}

type OrderRow = (
    i64,
    String,
    String,
    DateTime<Utc>,
    f64,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

type ItemRow = (i64, i64, String, String, i32, f64, Option<String>, Option<f64>);

fn order_from_row(row: OrderRow, items: Vec<Item>) -> StoreResult<Order> {
    let status = OrderStatus::parse(&row.5)
        .ok_or_else(|| StoreError::Internal(format!("unknown order status: {}", row.5)))?;
    let payment_status = PaymentStatus::parse(&row.6)
        .ok_or_else(|| StoreError::Internal(format!("unknown payment status: {}", row.6)))?;
    Ok(Order {
        id: row.0,
        order_number: row.1,
        customer_name: row.2,
        created_at: row.3,
        total_amount: row.4,
        status,
        payment_status,
        shipping_address: row.7,
        billing_address: row.8,
        tracking_number: row.9,
        items,
    })
}

fn item_from_row(row: ItemRow) -> (Item, i64) {
    (
        Item {
            id: row.0,
            sku: row.2,
            name: row.3,
            quantity: row.4,
            unit_price: row.5,
            image_url: row.6,
            weight: row.7,
        },
        row.1,
    )
}

/// PostgreSQL-backed [`Store`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_item_rows(
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
        items: &[NewItem],
    ) -> StoreResult<()> {
        for item in items {
            sqlx::query(
                "INSERT INTO items (order_id, sku, name, quantity, unit_price, image_url, weight) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(order_id)
            .bind(&item.sku)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(&item.image_url)
            .bind(item.weight)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    async fn recompute_total(
        tx: &mut Transaction<'_, Postgres>,
        order_id: i64,
    ) -> StoreResult<()> {
        sqlx::query(
            "UPDATE orders SET total_amount = COALESCE( \
                 (SELECT SUM(quantity * unit_price) FROM items WHERE order_id = $1), 0) \
             WHERE id = $1",
        )
        .bind(order_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    async fn fetch_items(&self, order_ids: &[i64]) -> StoreResult<Vec<(Item, i64)>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            "SELECT id, order_id, sku, name, quantity, unit_price, image_url, weight \
             FROM items WHERE order_id = ANY($1) ORDER BY id",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(item_from_row).collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query_as::<_, (i64, String, String, Option<String>, Vec<String>, bool)>(
            "SELECT id, username, password_hash, email, roles, active \
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, username, password_hash, email, roles, active)| User {
            id,
            username,
            password_hash,
            email,
            roles,
            active,
        }))
    }

    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        email: Option<&str>,
        roles: &[String],
    ) -> StoreResult<User> {
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO users (username, password_hash, email, roles, active) \
             VALUES ($1, $2, $3, $4, TRUE) RETURNING id",
        )
        .bind(username)
        .bind(password_hash)
        .bind(email)
        .bind(roles)
        .fetch_one(&self.pool)
        .await?;
        Ok(User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            email: email.map(|e| e.to_string()),
            roles: roles.to_vec(),
            active: true,
        })
    }

    async fn set_user_active(&self, username: &str, active: bool) -> StoreResult<()> {
        sqlx::query("UPDATE users SET active = $2 WHERE username = $1")
            .bind(username)
            .bind(active)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_refresh_token(&self, record: &RefreshTokenRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (token_hash, username, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(&record.token_hash)
        .bind(&record.username)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_refresh_token(
        &self,
        token_hash: &str,
    ) -> StoreResult<Option<RefreshTokenRecord>> {
        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            "SELECT token_hash, username, expires_at FROM refresh_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(token_hash, username, expires_at)| RefreshTokenRecord {
            token_hash,
            username,
            expires_at,
        }))
    }

    async fn delete_refresh_token(&self, token_hash: &str) -> StoreResult<()> {
        // Deleting an already-absent record is a no-op.
        sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_order(&self, new: &NewOrder) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO orders \
                 (order_number, customer_name, total_amount, status, payment_status, \
                  shipping_address, billing_address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(&new.order_number)
        .bind(&new.customer_name)
        .bind(new.total_amount())
        .bind(OrderStatus::default().as_str())
        .bind(PaymentStatus::default().as_str())
        .bind(&new.shipping_address)
        .bind(&new.billing_address)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_order_insert_err(e, &new.order_number))?;

        Self::insert_item_rows(&mut tx, id, &new.items).await?;
        tx.commit().await?;

        self.get_order(id)
            .await?
            .ok_or_else(|| StoreError::Internal(format!("order {id} vanished after insert")))
    }

    async fn get_order(&self, id: i64) -> StoreResult<Option<Order>> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT id, order_number, customer_name, created_at, total_amount, status, \
                    payment_status, shipping_address, billing_address, tracking_number \
             FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(None),
            Some(row) => {
                let items = self
                    .fetch_items(&[id])
                    .await?
                    .into_iter()
                    .map(|(item, _)| item)
                    .collect();
                Ok(Some(order_from_row(row, items)?))
            }
        }
    }

    async fn list_orders(&self, page: &Page) -> StoreResult<(Vec<Order>, u64)> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        let dir = match page.sort_dir {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        };
        // Sort column is whitelisted, never interpolated from raw input.
        let sql = format!(
            "SELECT id, order_number, customer_name, created_at, total_amount, status, \
                    payment_status, shipping_address, billing_address, tracking_number \
             FROM orders ORDER BY {} {} LIMIT $1 OFFSET $2",
            sort_column(&page.sort_by),
            dir,
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(i64::from(page.size))
            .bind(i64::from(page.page) * i64::from(page.size))
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.0).collect();
        let mut items_by_order: std::collections::HashMap<i64, Vec<Item>> =
            std::collections::HashMap::new();
        for (item, order_id) in self.fetch_items(&ids).await? {
            items_by_order.entry(order_id).or_default().push(item);
        }

        let orders = rows
            .into_iter()
            .map(|row| {
                let items = items_by_order.remove(&row.0).unwrap_or_default();
                order_from_row(row, items)
            })
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((orders, total as u64))
    }

    async fn update_order(&self, id: i64, new: &NewOrder) -> StoreResult<Order> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query(
            "UPDATE orders SET order_number = $2, customer_name = $3, \
                 shipping_address = $4, billing_address = $5 \
             WHERE id = $1",
        )
        .bind(id)
        .bind(&new.order_number)
        .bind(&new.customer_name)
        .bind(&new.shipping_address)
        .bind(&new.billing_address)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_order_insert_err(e, &new.order_number))?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(id));
        }

        sqlx::query("DELETE FROM items WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::insert_item_rows(&mut tx, id, &new.items).await?;
        Self::recompute_total(&mut tx, id).await?;
        tx.commit().await?;

        self.get_order(id)
            .await?
            .ok_or(StoreError::OrderNotFound(id))
    }

    async fn delete_order(&self, id: i64) -> StoreResult<()> {
        let deleted = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(StoreError::OrderNotFound(id));
        }
        Ok(())
    }

    async fn order_number_exists(&self, number: &str, exclude: Option<i64>) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM orders \
             WHERE order_number = $1 AND ($2::bigint IS NULL OR id <> $2))",
        )
        .bind(number)
        .bind(exclude)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_item(&self, order_id: i64, item: &NewItem) -> StoreResult<Item> {
        let mut tx = self.pool.begin().await?;
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM orders WHERE id = $1)")
            .bind(order_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Err(StoreError::OrderNotFound(order_id));
        }

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO items (order_id, sku, name, quantity, unit_price, image_url, weight) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
        )
        .bind(order_id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(&item.image_url)
        .bind(item.weight)
        .fetch_one(&mut *tx)
        .await?;
        Self::recompute_total(&mut tx, order_id).await?;
        tx.commit().await?;

        Ok(Item {
            id,
            sku: item.sku.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            image_url: item.image_url.clone(),
            weight: item.weight,
        })
    }

    async fn update_item(&self, id: i64, item: &NewItem) -> StoreResult<(Item, i64)> {
        let mut tx = self.pool.begin().await?;
        let order_id = sqlx::query_scalar::<_, i64>(
            "UPDATE items SET sku = $2, name = $3, quantity = $4, unit_price = $5, \
                 image_url = $6, weight = $7 \
             WHERE id = $1 RETURNING order_id",
        )
        .bind(id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(&item.image_url)
        .bind(item.weight)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::ItemNotFound(id))?;

        Self::recompute_total(&mut tx, order_id).await?;
        tx.commit().await?;

        Ok((
            Item {
                id,
                sku: item.sku.clone(),
                name: item.name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                image_url: item.image_url.clone(),
                weight: item.weight,
            },
            order_id,
        ))
    }

    async fn delete_item(&self, id: i64) -> StoreResult<i64> {
        let mut tx = self.pool.begin().await?;
        let order_id =
            sqlx::query_scalar::<_, i64>("DELETE FROM items WHERE id = $1 RETURNING order_id")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(StoreError::ItemNotFound(id))?;
        Self::recompute_total(&mut tx, order_id).await?;
        tx.commit().await?;
        Ok(order_id)
    }
}
