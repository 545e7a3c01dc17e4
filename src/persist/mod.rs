//! Document persistence.
//!
//! Creates the document header and its line items through the store's
//! atomic write, so a half-created document can never be mistaken for a
//! complete one by a later dedup check. The per-item notes reuse the same
//! display-name formatting the renderers print, keeping the database in
//! sync with what the customer saw.

use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::core::{
    CartItem, DocumentRecord, DocumentType, ExportError, NewDocument, NewDocumentItem,
    display_name,
};
use crate::store::{ClientStore, DocumentStore, Store};

/// Provenance note written on every generated document.
pub const PROVENANCE_NOTE: &str = "Сгенерировано из конфигуратора дверей";

const CURRENCY: &str = "RUB";

/// Creates document records for fresh exports.
pub struct DocumentPersister {
    store: Arc<dyn Store>,
}

impl DocumentPersister {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Persist a document with its line items.
    ///
    /// Fails with [`ExportError::NotFound`] when the client does not exist —
    /// the orchestrator provisions a placeholder beforehand in the lenient
    /// path.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        doc_type: DocumentType,
        client_id: &str,
        created_by: &str,
        items: &[CartItem],
        total_amount: Decimal,
        document_number: &str,
        parent_document_id: Option<&str>,
        cart_session_id: Option<&str>,
    ) -> Result<DocumentRecord, ExportError> {
        let client = self
            .store
            .client(client_id)
            .await
            .map_err(|e| ExportError::Persistence(e.to_string()))?;
        if client.is_none() {
            return Err(ExportError::NotFound {
                entity: "client",
                id: client_id.to_string(),
            });
        }

        let cart_data = serde_json::to_string(items)
            .map_err(|e| ExportError::Persistence(format!("cart snapshot failed: {e}")))?;

        let document = NewDocument {
            doc_type,
            number: document_number.to_string(),
            parent_document_id: parent_document_id.map(str::to_string),
            cart_session_id: cart_session_id.map(str::to_string),
            client_id: client_id.to_string(),
            created_by: created_by.to_string(),
            status: doc_type.default_status().to_string(),
            subtotal: total_amount,
            total_amount,
            currency: CURRENCY.to_string(),
            notes: PROVENANCE_NOTE.to_string(),
            cart_data: Some(cart_data),
        };

        let document_items = items
            .iter()
            .enumerate()
            .map(|(index, item)| NewDocumentItem {
                product_id: item
                    .id
                    .clone()
                    .unwrap_or_else(|| format!("temp_{index}")),
                quantity: item.quantity,
                unit_price: item.unit_price,
                total_price: item.line_total(),
                notes: format!(
                    "{} | Артикул: {}",
                    display_name(item),
                    item.sku_1c.as_deref().unwrap_or("N/A")
                ),
            })
            .collect();

        let record = self
            .store
            .create_document(document, document_items)
            .await
            .map_err(|e| ExportError::Persistence(e.to_string()))?;
        debug!(
            document = %record.number,
            id = %record.id,
            items = items.len(),
            "document persisted"
        );
        Ok(record)
    }
}
