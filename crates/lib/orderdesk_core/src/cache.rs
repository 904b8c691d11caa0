//! In-memory cache for order read results.
//!
//! Entries carry no TTL; they live until a mutation explicitly evicts them.
//! Keys form two namespaces: `order:{id}` for single-entity reads and
//! `orders:{page}:{size}:{sort_by}:{sort_dir}` for collection reads. A
//! mutation on an order (or any of its items) must clear that order's id
//! entry and the entire collection namespace, because any collection result
//! might have included the order.

use std::collections::HashMap;

use serde_json::Value;

use crate::models::order::Page;

/// Prefix shared by all collection-query keys.
const COLLECTION_PREFIX: &str = "orders:";

/// In-memory cache of serialized read responses.
///
/// Callers wrap it in `Arc<tokio::sync::RwLock<_>>` for request-parallel
/// access; invalidation on the mutation path takes the write lock, so every
/// later read observes the post-mutation state.
#[derive(Debug, Default)]
pub struct QueryCache {
    entries: HashMap<String, Value>,
}

impl QueryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Key for a single-order read.
    pub fn order_key(id: i64) -> String {
        format!("order:{id}")
    }

    /// Key for a collection read with the given pagination/sort parameters.
    pub fn collection_key(page: &Page) -> String {
        format!(
            "{COLLECTION_PREFIX}{}:{}:{}:{}",
            page.page,
            page.size,
            page.sort_by,
            page.sort_dir.as_str()
        )
    }

    /// Get a cached value if present.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    /// Insert or replace a cached value.
    pub fn insert(&mut self, key: String, value: Value) {
        self.entries.insert(key, value);
    }

    /// Evict everything a mutation of order `id` could have staled: the
    /// order's own entry and every collection entry.
    pub fn invalidate_order(&mut self, id: i64) {
        self.entries.remove(&Self::order_key(id));
        self.entries.retain(|key, _| !key.starts_with(COLLECTION_PREFIX));
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
