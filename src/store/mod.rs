//! Persistence-layer seams.
//!
//! The relational store is an external collaborator; this module defines the
//! narrow contracts the export core needs from it and ships an in-memory
//! reference backend used by the test suite and demos. Production deployments
//! implement the same traits over their database of choice.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::{
    ClientRecord, DocumentItemRecord, DocumentRecord, DocumentType, NewDocument, NewDocumentItem,
    ProductRecord,
};

/// Error from a store backend.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// Backend failure (connection loss, constraint violation, ...).
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Filter over the parent-document linkage of dedup candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentFilter {
    /// No constraint on the parent link.
    Any,
    /// Root documents only (`parent_document_id IS NULL`).
    Root,
    /// Documents generated from the given parent.
    Equals(String),
}

impl ParentFilter {
    /// Whether a document's parent link satisfies this filter.
    pub fn matches(&self, parent: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Root => parent.is_none(),
            Self::Equals(id) => parent == Some(id.as_str()),
        }
    }
}

/// Discriminator fields selecting dedup candidates.
#[derive(Debug, Clone)]
pub struct CandidateQuery<'a> {
    pub doc_type: DocumentType,
    pub client_id: &'a str,
    pub parent: ParentFilter,
    /// When set, only documents of this cart session match.
    pub cart_session_id: Option<&'a str>,
    /// Maximum number of candidates, newest first.
    pub limit: usize,
}

/// Client lookups and creation.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn client(&self, id: &str) -> Result<Option<ClientRecord>, StoreError>;

    async fn create_client(&self, client: ClientRecord) -> Result<ClientRecord, StoreError>;
}

/// Read-only catalog access.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All products of a category, reduced to the matching fields.
    async fn products_in_category(&self, category: &str)
    -> Result<Vec<ProductRecord>, StoreError>;

    /// Primary-key lookup constrained to a category.
    async fn product_in_category(
        &self,
        id: &str,
        category: &str,
    ) -> Result<Option<ProductRecord>, StoreError>;
}

/// Document reads and the atomic header+items write.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Candidates matching the discriminator fields, newest first.
    async fn find_documents(
        &self,
        query: CandidateQuery<'_>,
    ) -> Result<Vec<DocumentRecord>, StoreError>;

    /// Create the document header and its line items as one atomic write.
    ///
    /// Implementations must guarantee all-or-nothing semantics: a header
    /// without its items is a corruption state the dedup check would later
    /// mistake for a complete document.
    async fn create_document(
        &self,
        document: NewDocument,
        items: Vec<NewDocumentItem>,
    ) -> Result<DocumentRecord, StoreError>;

    /// Line items of a persisted document.
    async fn document_items(
        &self,
        document_id: &str,
    ) -> Result<Vec<DocumentItemRecord>, StoreError>;
}

/// The full persistence surface the export core depends on.
pub trait Store: ClientStore + ProductStore + DocumentStore {}

impl<T: ClientStore + ProductStore + DocumentStore> Store for T {}
