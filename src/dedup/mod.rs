//! Document deduplication.
//!
//! Repeated export requests for the same logical document must not mint new
//! database rows — a user re-downloading a quote PDF should land on the
//! document already created for that cart. Two documents count as the same
//! when their discriminators (type, parent link, cart session, client)
//! match and their cart content compares equal after normalization.
//!
//! Lookup failures are absorbed: the system prefers an extra duplicate over
//! a failed export.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use crate::core::{CartItem, DocumentRecord, DocumentType};
use crate::store::{CandidateQuery, DocumentStore, ParentFilter};

/// Monetary comparisons tolerate one kopeck of drift: unit prices round-trip
/// through JSON snapshots and may accumulate floating-point noise upstream.
fn price_tolerance() -> Decimal {
    Decimal::new(1, 2)
}

/// Candidates scanned in the content-comparison stage.
const ORDER_SCAN_LIMIT: usize = 20;
const DOCUMENT_SCAN_LIMIT: usize = 10;

/// Idempotency guard over the document store.
pub struct Deduplicator {
    store: Arc<dyn DocumentStore>,
}

impl Deduplicator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Find a persisted document equivalent to the requested export.
    ///
    /// Orders are root documents and route through [`Self::find_existing_order`],
    /// which ignores any parent linkage. Returns `None` both when nothing
    /// matches and when the lookup itself fails.
    pub async fn find_existing(
        &self,
        doc_type: DocumentType,
        parent_document_id: Option<&str>,
        cart_session_id: Option<&str>,
        client_id: &str,
        items: &[CartItem],
        total_amount: Decimal,
    ) -> Option<DocumentRecord> {
        if doc_type == DocumentType::Order {
            return self
                .find_existing_order(cart_session_id, client_id, items, total_amount)
                .await;
        }
        self.find_existing_document(
            doc_type,
            parent_document_id,
            cart_session_id,
            client_id,
            items,
            total_amount,
        )
        .await
    }

    /// Order-specific lookup. Orders never carry a parent link, so the
    /// query always pins `parent_document_id` to NULL.
    pub async fn find_existing_order(
        &self,
        cart_session_id: Option<&str>,
        client_id: &str,
        items: &[CartItem],
        total_amount: Decimal,
    ) -> Option<DocumentRecord> {
        // The cart session is the primary discriminator: exports from
        // different sessions must never collapse into one order, so the
        // content scan stays inside the session when one is given.
        let query = CandidateQuery {
            doc_type: DocumentType::Order,
            client_id,
            parent: ParentFilter::Root,
            cart_session_id,
            limit: ORDER_SCAN_LIMIT,
        };
        let found = self.scan(query, items, total_amount).await;
        match &found {
            Some(order) => debug!(order = %order.number, "existing order found"),
            None => debug!(client_id, "no existing order matches"),
        }
        found
    }

    async fn find_existing_document(
        &self,
        doc_type: DocumentType,
        parent_document_id: Option<&str>,
        cart_session_id: Option<&str>,
        client_id: &str,
        items: &[CartItem],
        total_amount: Decimal,
    ) -> Option<DocumentRecord> {
        // Discriminator precedence: cart session when given, else parent
        // link, else everything the client has of this type.
        let parent = match parent_document_id {
            Some(id) => ParentFilter::Equals(id.to_string()),
            None => ParentFilter::Any,
        };
        let query = CandidateQuery {
            doc_type,
            client_id,
            parent,
            cart_session_id,
            limit: DOCUMENT_SCAN_LIMIT,
        };
        let found = self.scan(query, items, total_amount).await;
        match &found {
            Some(doc) => debug!(document = %doc.number, "existing document found"),
            None => debug!(client_id, "no existing document matches"),
        }
        found
    }

    async fn scan(
        &self,
        query: CandidateQuery<'_>,
        items: &[CartItem],
        total_amount: Decimal,
    ) -> Option<DocumentRecord> {
        let candidates = match self.store.find_documents(query).await {
            Ok(candidates) => candidates,
            Err(error) => {
                warn!(%error, "dedup lookup failed, proceeding as if no duplicate exists");
                return None;
            }
        };
        debug!(count = candidates.len(), "dedup candidates loaded");

        candidates.into_iter().find(|candidate| {
            amounts_equal(candidate.total_amount, total_amount)
                && candidate
                    .cart_data
                    .as_deref()
                    .is_some_and(|stored| compare_cart_content(items, stored))
        })
    }
}

fn amounts_equal(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= price_tolerance()
}

/// A cart line reduced to its comparison key fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedLine {
    pub kind: String,
    pub style: String,
    pub model: String,
    pub finish: String,
    pub color: String,
    pub width: String,
    pub height: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub hardware_kit_id: String,
    pub handle_id: String,
}

impl NormalizedLine {
    fn sort_key(&self) -> String {
        let identity = if self.handle_id.is_empty() {
            &self.model
        } else {
            &self.handle_id
        };
        format!(
            "{}:{}:{}:{}:{}:{}:{}",
            self.kind, identity, self.finish, self.color, self.width, self.height,
            self.hardware_kit_id
        )
    }

    fn is_handle(&self) -> bool {
        self.kind == "handle"
    }

    fn equals(&self, other: &Self) -> bool {
        if self.is_handle() || other.is_handle() {
            return self.kind == other.kind
                && self.handle_id == other.handle_id
                && self.quantity == other.quantity
                && amounts_equal(self.unit_price, other.unit_price);
        }
        self.kind == other.kind
            && self.style == other.style
            && self.model == other.model
            && self.finish == other.finish
            && self.color == other.color
            && self.width == other.width
            && self.height == other.height
            && self.hardware_kit_id == other.hardware_kit_id
            && self.handle_id == other.handle_id
            && self.quantity == other.quantity
            && amounts_equal(self.unit_price, other.unit_price)
    }
}

/// Normalize cart lines for comparison: lowercase and trim string fields,
/// reduce handles to their identity tuple, and sort by a composite key so
/// equal carts compare equal regardless of line order.
pub fn normalize_items(items: &[CartItem]) -> Vec<NormalizedLine> {
    let mut lines: Vec<NormalizedLine> = items
        .iter()
        .map(|item| {
            let handle_id = item
                .handle_id
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string();
            if item.is_handle() {
                return NormalizedLine {
                    kind: "handle".into(),
                    style: String::new(),
                    model: String::new(),
                    finish: String::new(),
                    color: String::new(),
                    width: String::new(),
                    height: String::new(),
                    quantity: item.quantity,
                    unit_price: item.unit_price,
                    hardware_kit_id: String::new(),
                    handle_id,
                };
            }
            NormalizedLine {
                kind: "door".into(),
                style: fold(item.style.as_deref()),
                model: fold(item.model.as_deref().or(item.name.as_deref())),
                finish: fold(item.finish.as_deref()),
                color: fold(item.color.as_deref()),
                width: item.width.clone().unwrap_or_default(),
                height: item.height.clone().unwrap_or_default(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                hardware_kit_id: item
                    .hardware_kit_id
                    .as_deref()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                handle_id,
            }
        })
        .collect();
    lines.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    lines
}

fn fold(value: Option<&str>) -> String {
    value.unwrap_or_default().trim().to_lowercase()
}

/// Compare live cart items against a persisted `cart_data` snapshot.
///
/// The snapshot may be a bare JSON array or wrapped as `{"items": [...]}` —
/// both shapes exist in production data. Any parse failure means "not
/// equal".
pub fn compare_cart_content(items: &[CartItem], stored: &str) -> bool {
    let parsed: Value = match serde_json::from_str(stored) {
        Ok(value) => value,
        Err(error) => {
            warn!(%error, "failed to parse stored cart_data, treating as different");
            return false;
        }
    };
    let stored_items = match &parsed {
        Value::Array(_) => parsed.clone(),
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(_)) => map["items"].clone(),
            _ => return false,
        },
        _ => return false,
    };
    let stored_items: Vec<CartItem> = match serde_json::from_value(stored_items) {
        Ok(items) => items,
        Err(error) => {
            warn!(%error, "stored cart_data items do not deserialize, treating as different");
            return false;
        }
    };

    let left = normalize_items(items);
    let right = normalize_items(&stored_items);
    if left.len() != right.len() {
        debug!(live = left.len(), stored = right.len(), "cart line counts differ");
        return false;
    }
    left.iter().zip(right.iter()).all(|(a, b)| a.equals(b))
}
