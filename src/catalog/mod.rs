//! Product matching.
//!
//! Resolves a cart position back to the canonical catalog records it was
//! configured from. Handles are an exact primary-key lookup; doors run a
//! five-field configuration match (model, finish, color, width, height)
//! against the cached category list, where every unset cart attribute
//! matches vacuously and each field may be satisfied through its alias
//! chain.

mod aliases;
mod cache;

pub use aliases::{
    ConfigField, DOOR_MATCH_ALIASES, FieldAliases, SUPPLIER_SKU_ALIASES, aliases_for,
    property_text,
};
pub use cache::CategoryCache;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::core::{CartItem, CatalogMatch, ProductRecord};
use crate::store::ProductStore;

/// Catalog category holding door leaves.
pub const DOORS_CATEGORY: &str = "Межкомнатные двери";

/// Catalog category holding handles.
pub const HANDLES_CATEGORY: &str = "Ручки";

/// Upper bound on matches returned for one cart position.
pub const MAX_MATCHES: usize = 5;

/// How long a loaded category list stays usable.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Resolves cart positions to catalog products.
pub struct ProductMatcher {
    store: Arc<dyn ProductStore>,
    cache: CategoryCache,
}

impl ProductMatcher {
    pub fn new(store: Arc<dyn ProductStore>) -> Self {
        Self::with_cache_ttl(store, CACHE_TTL)
    }

    pub fn with_cache_ttl(store: Arc<dyn ProductStore>, ttl: Duration) -> Self {
        Self {
            store,
            cache: CategoryCache::new(ttl),
        }
    }

    /// Resolve one cart position to its catalog products.
    ///
    /// Never fails the caller: store errors and malformed property bags are
    /// logged and yield fewer (possibly zero) matches, in which case the
    /// document renders from cart-supplied fields alone.
    pub async fn resolve(&self, item: &CartItem) -> Vec<CatalogMatch> {
        if item.is_handle() {
            return self.resolve_handle(item).await;
        }
        self.resolve_door(item).await
    }

    async fn resolve_handle(&self, item: &CartItem) -> Vec<CatalogMatch> {
        let Some(handle_id) = item.handle_id.as_deref() else {
            return Vec::new();
        };
        match self.store.product_in_category(handle_id, HANDLES_CATEGORY).await {
            Ok(Some(product)) => vec![parse_match(&product)],
            Ok(None) => {
                debug!(handle_id, "handle not found in catalog");
                Vec::new()
            }
            Err(error) => {
                warn!(handle_id, %error, "handle lookup failed, rendering from cart fields");
                Vec::new()
            }
        }
    }

    async fn resolve_door(&self, item: &CartItem) -> Vec<CatalogMatch> {
        let products = match self.category_products(DOORS_CATEGORY).await {
            Ok(products) => products,
            Err(error) => {
                warn!(%error, "door catalog load failed, rendering from cart fields");
                return Vec::new();
            }
        };

        let mut matches = Vec::new();
        let mut truncated = 0usize;
        for product in products.iter() {
            let Some(raw) = product.properties_data.as_deref() else {
                continue;
            };
            let properties: Map<String, Value> = match serde_json::from_str(raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    warn!(sku = %product.sku, "properties_data is not a JSON object, skipping");
                    continue;
                }
                Err(error) => {
                    warn!(sku = %product.sku, %error, "failed to parse properties_data, skipping");
                    continue;
                }
            };
            if matches_configuration(item, &properties) {
                if matches.len() < MAX_MATCHES {
                    matches.push(CatalogMatch {
                        id: product.id.clone(),
                        sku: product.sku.clone(),
                        name: product.name.clone(),
                        properties,
                    });
                } else {
                    truncated += 1;
                }
            }
        }

        if truncated > 0 {
            warn!(
                model = item.model.as_deref().unwrap_or(""),
                truncated,
                cap = MAX_MATCHES,
                "configuration matched more products than the cap, truncating"
            );
        }
        debug!(
            model = item.model.as_deref().unwrap_or(""),
            found = matches.len(),
            "door configuration resolved"
        );
        matches
    }

    async fn category_products(
        &self,
        category: &str,
    ) -> Result<Arc<Vec<ProductRecord>>, crate::store::StoreError> {
        if let Some(cached) = self.cache.get(category) {
            return Ok(cached);
        }
        let loaded = self.store.products_in_category(category).await?;
        debug!(category, count = loaded.len(), "category list loaded into cache");
        Ok(self.cache.set(category, loaded))
    }
}

/// Whether a property bag satisfies every configured cart attribute.
///
/// Each predicate is vacuously true when the cart attribute is unset.
/// String fields compare exactly against the first non-empty alias value;
/// dimensions compare after coercion to text on both sides.
pub fn matches_configuration(item: &CartItem, properties: &Map<String, Value>) -> bool {
    field_matches(item.model.as_deref(), properties, ConfigField::Model)
        && field_matches(item.finish.as_deref(), properties, ConfigField::Finish)
        && field_matches(item.color.as_deref(), properties, ConfigField::Color)
        && field_matches(item.width.as_deref(), properties, ConfigField::Width)
        && field_matches(item.height.as_deref(), properties, ConfigField::Height)
}

fn field_matches(wanted: Option<&str>, properties: &Map<String, Value>, field: ConfigField) -> bool {
    match wanted {
        None => true,
        Some(wanted) => {
            property_text(properties, aliases_for(field)).as_deref() == Some(wanted)
        }
    }
}

fn parse_match(product: &ProductRecord) -> CatalogMatch {
    let properties = match product.properties_data.as_deref() {
        Some(raw) => match serde_json::from_str(raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) | Err(_) => {
                warn!(sku = %product.sku, "failed to parse properties_data, using empty bag");
                Map::new()
            }
        },
        None => Map::new(),
    };
    CatalogMatch {
        id: product.id.clone(),
        sku: product.sku.clone(),
        name: product.name.clone(),
        properties,
    }
}
