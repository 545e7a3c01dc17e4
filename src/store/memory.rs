//! In-memory store backend.
//!
//! Backs the test suite and demo setups. A single mutex guards all tables,
//! which makes `create_document` trivially atomic — the header and its items
//! become visible together or not at all.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{CandidateQuery, ClientStore, DocumentStore, ProductStore, StoreError};
use crate::core::{
    ClientRecord, DocumentItemRecord, DocumentRecord, NewDocument, NewDocumentItem, ProductRecord,
};

#[derive(Default)]
struct Tables {
    clients: HashMap<String, ClientRecord>,
    products: Vec<ProductRecord>,
    documents: Vec<DocumentRecord>,
    items: HashMap<String, Vec<DocumentItemRecord>>,
}

/// Mutex-guarded in-memory implementation of the store traits.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a client (test/demo helper).
    pub fn add_client(&self, client: ClientRecord) {
        self.tables.lock().unwrap().clients.insert(client.id.clone(), client);
    }

    /// Seed a catalog product (test/demo helper).
    pub fn add_product(&self, product: ProductRecord) {
        self.tables.lock().unwrap().products.push(product);
    }

    /// Number of persisted documents across all types (test helper).
    pub fn document_count(&self) -> usize {
        self.tables.lock().unwrap().documents.len()
    }

    /// Snapshot of all persisted documents (test helper).
    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.tables.lock().unwrap().documents.clone()
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn client(&self, id: &str) -> Result<Option<ClientRecord>, StoreError> {
        Ok(self.tables.lock().unwrap().clients.get(id).cloned())
    }

    async fn create_client(&self, client: ClientRecord) -> Result<ClientRecord, StoreError> {
        self.tables
            .lock()
            .unwrap()
            .clients
            .insert(client.id.clone(), client.clone());
        Ok(client)
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn products_in_category(
        &self,
        category: &str,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .products
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect())
    }

    async fn product_in_category(
        &self,
        id: &str,
        category: &str,
    ) -> Result<Option<ProductRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .products
            .iter()
            .find(|p| p.id == id && p.category == category)
            .cloned())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_documents(
        &self,
        query: CandidateQuery<'_>,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        let tables = self.tables.lock().unwrap();
        let mut candidates: Vec<DocumentRecord> = tables
            .documents
            .iter()
            .filter(|d| d.doc_type == query.doc_type)
            .filter(|d| d.client_id == query.client_id)
            .filter(|d| query.parent.matches(d.parent_document_id.as_deref()))
            .filter(|d| match query.cart_session_id {
                Some(session) => d.cart_session_id.as_deref() == Some(session),
                None => true,
            })
            .cloned()
            .collect();
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        candidates.truncate(query.limit);
        Ok(candidates)
    }

    async fn create_document(
        &self,
        document: NewDocument,
        items: Vec<NewDocumentItem>,
    ) -> Result<DocumentRecord, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let record = DocumentRecord {
            id: Uuid::new_v4().to_string(),
            doc_type: document.doc_type,
            number: document.number,
            parent_document_id: document.parent_document_id,
            cart_session_id: document.cart_session_id,
            client_id: document.client_id,
            created_by: document.created_by,
            status: document.status,
            subtotal: document.subtotal,
            total_amount: document.total_amount,
            currency: document.currency,
            notes: document.notes,
            cart_data: document.cart_data,
            created_at: Utc::now(),
        };
        let item_records = items
            .into_iter()
            .map(|item| DocumentItemRecord {
                id: Uuid::new_v4().to_string(),
                document_id: record.id.clone(),
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.total_price,
                notes: item.notes,
            })
            .collect();
        tables.items.insert(record.id.clone(), item_records);
        tables.documents.push(record.clone());
        Ok(record)
    }

    async fn document_items(
        &self,
        document_id: &str,
    ) -> Result<Vec<DocumentItemRecord>, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .items
            .get(document_id)
            .cloned()
            .unwrap_or_default())
    }
}
