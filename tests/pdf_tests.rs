#![cfg(feature = "pdf")]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use domeo_docs::render::pdf::{
    Browser, BrowserEngine, FAST_RENDER_TIMEOUT, Page, PdfRenderer, RENDER_TIMEOUT,
};
use domeo_docs::{ClientInfo, DocumentType, ExportData, ExportError};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Instrumented mocks
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Counters {
    launches: AtomicUsize,
    page_closes: AtomicUsize,
    browser_closes: AtomicUsize,
}

#[derive(Clone, Copy, PartialEq)]
enum PrintBehavior {
    Succeed,
    Fail,
    Hang,
}

struct MockEngine {
    counters: Arc<Counters>,
    behavior: PrintBehavior,
}

struct MockBrowser {
    counters: Arc<Counters>,
    behavior: PrintBehavior,
}

struct MockPage {
    counters: Arc<Counters>,
    behavior: PrintBehavior,
}

#[async_trait]
impl BrowserEngine for MockEngine {
    async fn launch(&self) -> Result<Box<dyn Browser>, ExportError> {
        self.counters.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockBrowser {
            counters: self.counters.clone(),
            behavior: self.behavior,
        }))
    }
}

#[async_trait]
impl Browser for MockBrowser {
    async fn new_page(&mut self) -> Result<Box<dyn Page>, ExportError> {
        Ok(Box::new(MockPage {
            counters: self.counters.clone(),
            behavior: self.behavior,
        }))
    }

    async fn close(&mut self) -> Result<(), ExportError> {
        self.counters.browser_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Page for MockPage {
    async fn set_content(&mut self, _html: &str, _timeout: Duration) -> Result<(), ExportError> {
        Ok(())
    }

    async fn print_pdf(&mut self) -> Result<Vec<u8>, ExportError> {
        match self.behavior {
            PrintBehavior::Succeed => Ok(b"%PDF-mock".to_vec()),
            PrintBehavior::Fail => Err(ExportError::Rendering("print crashed".into())),
            PrintBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
        }
    }

    async fn close(&mut self) -> Result<(), ExportError> {
        self.counters.page_closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn engine(behavior: PrintBehavior) -> (Arc<Counters>, Arc<MockEngine>) {
    let counters = Arc::new(Counters::default());
    let engine = Arc::new(MockEngine {
        counters: counters.clone(),
        behavior,
    });
    (counters, engine)
}

fn payload() -> ExportData {
    ExportData {
        doc_type: DocumentType::Quote,
        document_number: "KP-1726000000000".into(),
        client: ClientInfo {
            name: "Иванов Иван".into(),
            phone: None,
            address: None,
        },
        items: Vec::new(),
        total_amount: Decimal::from(1000),
        supplier: None,
    }
}

// ---------------------------------------------------------------------------
// Rendering and cleanup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_render_closes_page_and_browser_once() {
    let (counters, engine) = engine(PrintBehavior::Succeed);
    let renderer = PdfRenderer::new(engine);

    let buffer = renderer.render(&payload()).await.unwrap();
    assert_eq!(buffer, b"%PDF-mock");
    assert_eq!(counters.page_closes.load(Ordering::SeqCst), 1);
    assert_eq!(counters.browser_closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_print_still_closes_page_and_browser_once() {
    let (counters, engine) = engine(PrintBehavior::Fail);
    let renderer = PdfRenderer::new(engine);

    let error = renderer.render(&payload()).await.unwrap_err();
    assert!(matches!(error, ExportError::Rendering(_)));
    assert_eq!(counters.page_closes.load(Ordering::SeqCst), 1);
    assert_eq!(counters.browser_closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn hanging_render_times_out_and_cleans_up() {
    let (counters, engine) = engine(PrintBehavior::Hang);
    let renderer = PdfRenderer::with_timeout(engine, Duration::from_millis(50));

    let error = renderer.render(&payload()).await.unwrap_err();
    match error {
        ExportError::Rendering(message) => assert!(message.contains("timed out")),
        other => panic!("expected rendering error, got {other:?}"),
    }
    assert_eq!(counters.page_closes.load(Ordering::SeqCst), 1);
    assert_eq!(counters.browser_closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn timeout_constants_match_the_render_budget() {
    assert_eq!(RENDER_TIMEOUT, Duration::from_secs(60));
    assert_eq!(FAST_RENDER_TIMEOUT, Duration::from_secs(30));
}

// ---------------------------------------------------------------------------
// Browser reuse knob
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reuse_keeps_one_browser_across_renders() {
    let (counters, engine) = engine(PrintBehavior::Succeed);
    let renderer = PdfRenderer::with_browser_reuse(engine, RENDER_TIMEOUT);

    renderer.render(&payload()).await.unwrap();
    renderer.render(&payload()).await.unwrap();
    assert_eq!(counters.launches.load(Ordering::SeqCst), 1);
    assert_eq!(counters.browser_closes.load(Ordering::SeqCst), 0);

    renderer.cleanup().await.unwrap();
    assert_eq!(counters.browser_closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reuse_discards_the_browser_after_a_failure() {
    let (counters, engine) = engine(PrintBehavior::Fail);
    let renderer = PdfRenderer::with_browser_reuse(engine, RENDER_TIMEOUT);

    renderer.render(&payload()).await.unwrap_err();
    // The failed instance was closed, not returned to the cache.
    assert_eq!(counters.browser_closes.load(Ordering::SeqCst), 1);

    renderer.render(&payload()).await.unwrap_err();
    assert_eq!(counters.launches.load(Ordering::SeqCst), 2);

    // Nothing left for cleanup to close.
    renderer.cleanup().await.unwrap();
    assert_eq!(counters.browser_closes.load(Ordering::SeqCst), 2);
}
