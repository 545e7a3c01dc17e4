//! # domeo-docs
//!
//! Document export and deduplication core for the Domeo door-configurator
//! back office: turns a configured shopping cart into a quote (КП), invoice
//! (Счет) or order (Заказ) rendered as PDF, Excel or CSV, while guaranteeing
//! that repeated exports of the same cart reuse the persisted document
//! instead of minting duplicates.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating point.
//! The relational store and the headless browser are external collaborators
//! behind traits; the crate ships an in-memory store and a WebDriver engine
//! as reference implementations.
//!
//! ## Quick Start
//!
//! ```rust
//! use domeo_docs::dedup::compare_cart_content;
//! use domeo_docs::{CartItem, DocumentType, mint_numbers};
//!
//! let numbers = mint_numbers(DocumentType::Quote, 1_726_000_000_000);
//! assert_eq!(numbers.export_facing, "KP-1726000000000");
//! assert_eq!(numbers.canonical, "КП-1726000000000");
//!
//! let cart: Vec<CartItem> = serde_json::from_str(
//!     r#"[{"type":"door","model":"DomeoDoors_Neo_1","unitPrice":25000,"qty":1}]"#,
//! ).unwrap();
//! let snapshot = serde_json::to_string(&cart).unwrap();
//! assert!(compare_cart_content(&cart, &snapshot));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Types, numbering, matcher, dedup, store seams, persister, CSV |
//! | `pdf` | Headless-browser PDF rendering (WebDriver engine) |
//! | `excel` | Order and flat xlsx workbooks |
//! | `export` | The end-to-end `ExportService` (needs `pdf` + `excel`) |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod catalog;

#[cfg(feature = "core")]
pub mod dedup;

#[cfg(feature = "core")]
pub mod persist;

#[cfg(feature = "core")]
pub mod render;

#[cfg(feature = "core")]
pub mod store;

#[cfg(feature = "export")]
pub mod export;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
