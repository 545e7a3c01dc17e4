#![cfg(feature = "export")]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domeo_docs::export::{ExportRequest, ExportService};
use domeo_docs::render::pdf::{Browser, BrowserEngine, Page};
use domeo_docs::store::{
    CandidateQuery, ClientStore, DocumentStore, MemoryStore, ProductStore, StoreError,
};
use domeo_docs::{
    CartItem, ClientRecord, DocumentItemRecord, DocumentRecord, DocumentType, ExportError,
    ExportFormat, NewDocument, NewDocumentItem, ProductRecord,
};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn client() -> ClientRecord {
    ClientRecord {
        id: "c1".into(),
        first_name: "Иван".into(),
        last_name: "Иванов".into(),
        middle_name: None,
        phone: Some("+7 (912) 000-11-22".into()),
        address: Some("Москва".into()),
        email: None,
    }
}

fn cart() -> Vec<CartItem> {
    serde_json::from_value(serde_json::json!([{
        "id": "p1",
        "type": "door",
        "model": "X",
        "unitPrice": 1000,
        "qty": 1
    }]))
    .unwrap()
}

fn request(format: ExportFormat, session: &str) -> ExportRequest {
    ExportRequest {
        doc_type: DocumentType::Quote,
        format,
        client_id: "c1".into(),
        items: cart(),
        total_amount: Decimal::from(1000),
        cart_session_id: Some(session.into()),
        parent_document_id: None,
        created_by: None,
    }
}

/// Browser engine producing a fixed buffer; good enough for pipeline tests.
struct StubEngine;

struct StubBrowser;

struct StubPage;

#[async_trait]
impl BrowserEngine for StubEngine {
    async fn launch(&self) -> Result<Box<dyn Browser>, ExportError> {
        Ok(Box::new(StubBrowser))
    }
}

#[async_trait]
impl Browser for StubBrowser {
    async fn new_page(&mut self) -> Result<Box<dyn Page>, ExportError> {
        Ok(Box::new(StubPage))
    }

    async fn close(&mut self) -> Result<(), ExportError> {
        Ok(())
    }
}

#[async_trait]
impl Page for StubPage {
    async fn set_content(&mut self, _html: &str, _timeout: Duration) -> Result<(), ExportError> {
        Ok(())
    }

    async fn print_pdf(&mut self) -> Result<Vec<u8>, ExportError> {
        Ok(b"%PDF-stub".to_vec())
    }

    async fn close(&mut self) -> Result<(), ExportError> {
        Ok(())
    }
}

fn service(store: Arc<MemoryStore>) -> ExportService {
    ExportService::new(store, Arc::new(StubEngine))
}

// ---------------------------------------------------------------------------
// Idempotency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_export_persists_exactly_one_document() {
    let store = Arc::new(MemoryStore::new());
    store.add_client(client());
    let service = service(store.clone());

    let first = service
        .export_document(request(ExportFormat::Csv, "s1"))
        .await
        .unwrap();
    // A later re-download of the same cart session.
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = service
        .export_document(request(ExportFormat::Csv, "s1"))
        .await
        .unwrap();

    assert_eq!(store.document_count(), 1);
    assert_eq!(first.document_id, second.document_id);
    assert!(first.document_id.is_some());
    // Each export act still gets its own download number.
    assert_ne!(first.document_number, second.document_number);
}

#[tokio::test]
async fn different_sessions_persist_separate_documents() {
    let store = Arc::new(MemoryStore::new());
    store.add_client(client());
    let service = service(store.clone());

    let first = service
        .export_document(request(ExportFormat::Csv, "s1"))
        .await
        .unwrap();
    let second = service
        .export_document(request(ExportFormat::Csv, "s2"))
        .await
        .unwrap();

    assert_eq!(store.document_count(), 2);
    assert_ne!(first.document_id, second.document_id);
}

#[tokio::test]
async fn reused_document_keeps_its_item_batch() {
    let store = Arc::new(MemoryStore::new());
    store.add_client(client());
    let service = service(store.clone());

    let first = service
        .export_document(request(ExportFormat::Csv, "s1"))
        .await
        .unwrap();
    service
        .export_document(request(ExportFormat::Csv, "s1"))
        .await
        .unwrap();

    let items = store
        .document_items(first.document_id.as_deref().unwrap())
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
}

// ---------------------------------------------------------------------------
// Numbering duality
// ---------------------------------------------------------------------------

fn assert_number_shape(number: &str, prefix: &str) {
    let suffix = number
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or_else(|| panic!("number {number} should start with {prefix}-"));
    assert!(!suffix.is_empty());
    assert!(suffix.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn export_and_db_numbers_share_the_timestamp_suffix() {
    let store = Arc::new(MemoryStore::new());
    store.add_client(client());
    let service = service(store.clone());

    let outcome = service
        .export_document(request(ExportFormat::Csv, "s1"))
        .await
        .unwrap();

    assert_number_shape(&outcome.document_number, "KP");
    let persisted = &store.documents()[0];
    assert_number_shape(&persisted.number, "КП");
    assert_eq!(
        outcome.document_number.strip_prefix("KP-"),
        persisted.number.strip_prefix("КП-"),
    );
}

#[tokio::test]
async fn latin_prefix_follows_document_type() {
    let store = Arc::new(MemoryStore::new());
    store.add_client(client());
    let service = service(store.clone());

    for (doc_type, prefix) in [
        (DocumentType::Quote, "KP"),
        (DocumentType::Invoice, "Invoice"),
        (DocumentType::Order, "Order"),
    ] {
        let mut req = request(ExportFormat::Csv, &format!("s-{prefix}"));
        req.doc_type = doc_type;
        let outcome = service.export_document(req).await.unwrap();
        assert_number_shape(&outcome.document_number, prefix);
        assert!(outcome.filename.is_ascii(), "{}", outcome.filename);
    }
}

// ---------------------------------------------------------------------------
// Render formats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pdf_export_returns_engine_buffer() {
    let store = Arc::new(MemoryStore::new());
    store.add_client(client());
    let service = service(store.clone());

    let outcome = service
        .export_document(request(ExportFormat::Pdf, "s1"))
        .await
        .unwrap();
    assert_eq!(outcome.buffer, b"%PDF-stub");
    assert_eq!(outcome.mime_type, "application/pdf");
    assert!(outcome.filename.ends_with(".pdf"));
}

#[tokio::test]
async fn order_excel_export_is_a_zip_container() {
    let store = Arc::new(MemoryStore::new());
    store.add_client(client());
    let service = service(store.clone());

    let mut req = request(ExportFormat::Excel, "s1");
    req.doc_type = DocumentType::Order;
    let outcome = service.export_document(req).await.unwrap();
    assert_eq!(&outcome.buffer[..2], b"PK");
    assert!(outcome.filename.ends_with(".xlsx"));
}

#[tokio::test]
async fn csv_export_contains_the_cart_line() {
    let store = Arc::new(MemoryStore::new());
    store.add_client(client());
    let service = service(store.clone());

    let outcome = service
        .export_document(request(ExportFormat::Csv, "s1"))
        .await
        .unwrap();
    let text = String::from_utf8(outcome.buffer).unwrap();
    assert!(text.contains("Дверь X"));
    assert_eq!(outcome.mime_type, "text/csv");
}

// ---------------------------------------------------------------------------
// Validation and degraded paths
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_cart_is_rejected_before_side_effects() {
    let store = Arc::new(MemoryStore::new());
    store.add_client(client());
    let service = service(store.clone());

    let mut req = request(ExportFormat::Csv, "s1");
    req.items.clear();
    let error = service.export_document(req).await.unwrap_err();
    assert!(matches!(error, ExportError::Validation(_)));
    assert_eq!(store.document_count(), 0);
}

#[tokio::test]
async fn missing_client_id_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let service = service(store);

    let mut req = request(ExportFormat::Csv, "s1");
    req.client_id = String::new();
    let error = service.export_document(req).await.unwrap_err();
    assert!(matches!(error, ExportError::Validation(_)));
}

#[tokio::test]
async fn unknown_client_gets_a_placeholder_record() {
    let store = Arc::new(MemoryStore::new());
    let service = service(store.clone());

    let outcome = service
        .export_document(request(ExportFormat::Csv, "s1"))
        .await
        .unwrap();
    assert!(outcome.document_id.is_some());

    let placeholder = store.client("c1").await.unwrap().expect("placeholder created");
    assert_eq!(placeholder.first_name, "Тестовый");
    assert_eq!(placeholder.last_name, "Клиент");
}

/// Store whose document writes always fail; reads delegate to the inner
/// in-memory store.
struct WriteFailingStore {
    inner: MemoryStore,
}

#[async_trait]
impl ClientStore for WriteFailingStore {
    async fn client(&self, id: &str) -> Result<Option<ClientRecord>, StoreError> {
        self.inner.client(id).await
    }

    async fn create_client(&self, client: ClientRecord) -> Result<ClientRecord, StoreError> {
        self.inner.create_client(client).await
    }
}

#[async_trait]
impl ProductStore for WriteFailingStore {
    async fn products_in_category(
        &self,
        category: &str,
    ) -> Result<Vec<ProductRecord>, StoreError> {
        self.inner.products_in_category(category).await
    }

    async fn product_in_category(
        &self,
        id: &str,
        category: &str,
    ) -> Result<Option<ProductRecord>, StoreError> {
        self.inner.product_in_category(id, category).await
    }
}

#[async_trait]
impl DocumentStore for WriteFailingStore {
    async fn find_documents(
        &self,
        query: CandidateQuery<'_>,
    ) -> Result<Vec<DocumentRecord>, StoreError> {
        self.inner.find_documents(query).await
    }

    async fn create_document(
        &self,
        _document: NewDocument,
        _items: Vec<NewDocumentItem>,
    ) -> Result<DocumentRecord, StoreError> {
        Err(StoreError::Backend("disk full".into()))
    }

    async fn document_items(
        &self,
        document_id: &str,
    ) -> Result<Vec<DocumentItemRecord>, StoreError> {
        self.inner.document_items(document_id).await
    }
}

#[tokio::test]
async fn persistence_failure_still_returns_the_buffer() {
    let inner = MemoryStore::new();
    inner.add_client(client());
    let store = Arc::new(WriteFailingStore { inner });
    let service = ExportService::new(store, Arc::new(StubEngine));

    let outcome = service
        .export_document(request(ExportFormat::Csv, "s1"))
        .await
        .unwrap();
    assert!(!outcome.buffer.is_empty());
    assert!(outcome.document_id.is_none());
    assert!(outcome.document_type.is_none());
}
