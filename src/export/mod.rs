//! Export orchestration.
//!
//! The linear pipeline behind the public entry point:
//!
//! `validate → dedup check → mint numbers → resolve items → render →
//! persist-if-new → return buffer + metadata`
//!
//! On a dedup hit the stored document keeps its identity but the response
//! still carries a freshly minted export-facing number — persisted numbers
//! may use Cyrillic prefixes unsuitable for filenames, and every download
//! should be distinguishable even when it reuses the underlying document.
//! Persistence failures never fail an export that already has a rendered
//! buffer; the missing `document_id` tells the caller no row backs it.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::catalog::{ProductMatcher, SUPPLIER_SKU_ALIASES, property_text};
use crate::core::{
    CartItem, CatalogMatch, ClientInfo, ClientRecord, DocumentType, ExportData, ExportError,
    ExportFormat, ItemKind, ResolvedItem, display_name, mint_numbers, sanitize_filename,
};
use crate::dedup::Deduplicator;
use crate::persist::DocumentPersister;
use crate::render::pdf::{BrowserEngine, PdfRenderer};
use crate::render::{RendererKind, csv, excel, renderer_for};
use crate::store::{ClientStore, Store};

/// Parameters of one export act.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub doc_type: DocumentType,
    pub format: ExportFormat,
    pub client_id: String,
    pub items: Vec<CartItem>,
    pub total_amount: Decimal,
    /// Groups repeated exports of one cart instance (primary dedup key).
    pub cart_session_id: Option<String>,
    /// Upstream document this export derives from.
    pub parent_document_id: Option<String>,
    /// Recorded as `created_by` on fresh documents; defaults to `system`.
    pub created_by: Option<String>,
}

/// Result of one export act.
#[derive(Debug)]
pub struct ExportOutcome {
    pub buffer: Vec<u8>,
    pub filename: String,
    pub mime_type: &'static str,
    /// Export-facing document number (always Latin-prefixed).
    pub document_number: String,
    /// Persisted document id; `None` when the write failed or was skipped.
    pub document_id: Option<String>,
    pub document_type: Option<DocumentType>,
}

/// Top-level export pipeline.
pub struct ExportService {
    store: Arc<dyn Store>,
    matcher: ProductMatcher,
    dedup: Deduplicator,
    persister: DocumentPersister,
    pdf: PdfRenderer,
}

impl ExportService {
    pub fn new<S>(store: Arc<S>, engine: Arc<dyn BrowserEngine>) -> Self
    where
        S: Store + 'static,
    {
        Self::with_pdf_renderer(store, PdfRenderer::new(engine))
    }

    /// Service with a custom PDF renderer (timeout/reuse knobs).
    pub fn with_pdf_renderer<S>(store: Arc<S>, pdf: PdfRenderer) -> Self
    where
        S: Store + 'static,
    {
        Self {
            matcher: ProductMatcher::new(store.clone()),
            dedup: Deduplicator::new(store.clone()),
            persister: DocumentPersister::new(store.clone()),
            pdf,
            store,
        }
    }

    /// Run one export end to end.
    pub async fn export_document(
        &self,
        request: ExportRequest,
    ) -> Result<ExportOutcome, ExportError> {
        if request.client_id.is_empty() {
            return Err(ExportError::Validation("clientId is required".into()));
        }
        if request.items.is_empty() {
            return Err(ExportError::Validation("cart is empty".into()));
        }

        info!(
            doc_type = ?request.doc_type,
            format = ?request.format,
            client_id = %request.client_id,
            items = request.items.len(),
            "export requested"
        );

        let client = self.ensure_client(&request.client_id).await;

        let existing = self
            .dedup
            .find_existing(
                request.doc_type,
                request.parent_document_id.as_deref(),
                request.cart_session_id.as_deref(),
                &request.client_id,
                &request.items,
                request.total_amount,
            )
            .await;

        let numbers = mint_numbers(request.doc_type, Utc::now().timestamp_millis());

        // Resolution is read-only and embarrassingly parallel; output order
        // follows the cart.
        let matches = join_all(request.items.iter().map(|item| self.matcher.resolve(item))).await;
        let items: Vec<ResolvedItem> = request
            .items
            .iter()
            .zip(matches)
            .enumerate()
            .map(|(index, (item, matches))| resolve_item(index, item, matches))
            .collect();

        let data = ExportData {
            doc_type: request.doc_type,
            document_number: numbers.export_facing.clone(),
            client,
            items,
            total_amount: request.total_amount,
            supplier: None,
        };

        let buffer = self.render(&data, request.format).await?;

        let (document_id, document_type) = match existing {
            Some(document) => {
                debug!(
                    document = %document.number,
                    id = %document.id,
                    "reusing existing document, skipping persistence"
                );
                (Some(document.id), Some(request.doc_type))
            }
            None => {
                let created_by = request.created_by.as_deref().unwrap_or("system");
                match self
                    .persister
                    .create(
                        request.doc_type,
                        &request.client_id,
                        created_by,
                        &request.items,
                        request.total_amount,
                        &numbers.canonical,
                        request.parent_document_id.as_deref(),
                        request.cart_session_id.as_deref(),
                    )
                    .await
                {
                    Ok(record) => (Some(record.id), Some(request.doc_type)),
                    Err(error) => {
                        // The caller still gets their buffer; the missing id
                        // signals that no database row backs this artifact.
                        error!(%error, "document persistence failed, returning buffer anyway");
                        (None, None)
                    }
                }
            }
        };

        let filename = format!(
            "{}.{}",
            sanitize_filename(&numbers.export_facing),
            request.format.extension()
        );

        Ok(ExportOutcome {
            buffer,
            filename,
            mime_type: request.format.mime_type(),
            document_number: numbers.export_facing,
            document_id,
            document_type,
        })
    }

    async fn render(&self, data: &ExportData, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        match renderer_for(data.doc_type, format) {
            RendererKind::Pdf => self.pdf.render(data).await,
            RendererKind::ExcelOrder => excel::to_order_workbook(data),
            RendererKind::ExcelSimple => excel::to_flat_workbook(data),
            RendererKind::Csv => Ok(csv::to_csv(data).into_bytes()),
        }
    }

    /// Load the client, provisioning a placeholder when missing.
    ///
    /// The generic export path must keep working for demo flows where the
    /// CRM record does not exist yet; the stricter persistence path will
    /// still refuse clients that cannot even be created.
    async fn ensure_client(&self, client_id: &str) -> ClientInfo {
        match self.store.client(client_id).await {
            Ok(Some(record)) => return ClientInfo::from(&record),
            Ok(None) => warn!(client_id, "client not found, provisioning placeholder"),
            Err(error) => warn!(client_id, %error, "client lookup failed, using placeholder"),
        }

        let placeholder = placeholder_client(client_id);
        match self.store.create_client(placeholder.clone()).await {
            Ok(record) => ClientInfo::from(&record),
            Err(error) => {
                warn!(client_id, %error, "placeholder client write failed, rendering unpersisted");
                ClientInfo::from(&placeholder)
            }
        }
    }
}

fn placeholder_client(client_id: &str) -> ClientRecord {
    ClientRecord {
        id: client_id.to_string(),
        first_name: "Тестовый".to_string(),
        last_name: "Клиент".to_string(),
        middle_name: None,
        phone: Some("+7 (999) 123-45-67".to_string()),
        address: Some("Тестовый адрес".to_string()),
        email: Some("test@example.com".to_string()),
    }
}

/// Assemble the renderer-facing view of one cart item.
fn resolve_item(index: usize, item: &CartItem, matches: Vec<CatalogMatch>) -> ResolvedItem {
    let kind = if item.is_handle() {
        ItemKind::Handle
    } else {
        item.kind
    };
    let sku = item
        .sku_1c
        .clone()
        .or_else(|| {
            matches
                .first()
                .and_then(|m| property_text(&m.properties, SUPPLIER_SKU_ALIASES))
        })
        .unwrap_or_else(|| "N/A".to_string());
    ResolvedItem {
        row_number: index + 1,
        sku,
        name: display_name(item),
        kind,
        unit_price: item.unit_price,
        quantity: item.quantity,
        total: item.line_total(),
        matches,
    }
}
