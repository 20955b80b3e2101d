//! `sheetgate-store`: persistence for accepted records.
//!
//! One SQLite table holds one JSON document per record, plus the columns
//! needed for ordering.

pub mod error;
pub mod model;
pub mod store;

pub use error::StoreError;
pub use model::{ImportSummary, Page, StoredRecord};
pub use store::RecordStore;
