use thiserror::Error;

/// Errors surfaced by the export pipeline.
///
/// Only failures the caller can act on are raised: bad input, a missing
/// referenced record, or a renderer that produced no buffer. Lookup failures
/// during deduplication and per-product property parse errors are absorbed
/// at the call site (logged, resolution continues) and never reach this enum.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExportError {
    /// Missing or invalid export parameters; raised before any side effect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A referenced record does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Entity kind, e.g. "client".
        entity: &'static str,
        /// Identifier that failed to resolve.
        id: String,
    },

    /// Headless-browser or workbook failure, wrapping the original message.
    #[error("rendering failed: {0}")]
    Rendering(String),

    /// Database write failure while persisting a document.
    #[error("persistence failed: {0}")]
    Persistence(String),
}
