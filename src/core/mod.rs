//! Core document types, errors, numbering and display formatting.
//!
//! Everything downstream of the cart speaks these types: the matcher and
//! deduplicator consume [`CartItem`]s, the renderers consume [`ExportData`],
//! and the persister produces [`DocumentRecord`]s.

mod display;
mod error;
mod numbering;
mod types;

pub use display::display_name;
pub use error::*;
pub use numbering::*;
pub use types::*;

pub(crate) use display::format_ru_amount;
