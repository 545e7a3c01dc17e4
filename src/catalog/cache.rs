//! Per-category product cache.
//!
//! Owned by the matcher instance — no process-wide statics. Reads are not
//! synchronized across concurrent misses: two simultaneous misses may load
//! the category twice, which is accepted since the catalog is read-only
//! from this core's perspective.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::core::ProductRecord;

struct Entry {
    products: Arc<Vec<ProductRecord>>,
    expires_at: Instant,
}

/// Time-based cache of category product lists.
pub struct CategoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl CategoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// The cached list for a category, unless expired.
    pub fn get(&self, category: &str) -> Option<Arc<Vec<ProductRecord>>> {
        let entries = self.entries.lock().unwrap();
        entries
            .get(category)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| Arc::clone(&entry.products))
    }

    /// Replace a category's list, restarting its TTL.
    pub fn set(&self, category: &str, products: Vec<ProductRecord>) -> Arc<Vec<ProductRecord>> {
        let products = Arc::new(products);
        self.entries.lock().unwrap().insert(
            category.to_string(),
            Entry {
                products: Arc::clone(&products),
                expires_at: Instant::now() + self.ttl,
            },
        );
        products
    }
}
