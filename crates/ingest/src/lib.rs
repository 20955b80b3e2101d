//! `sheetgate-ingest`: spreadsheet ingestion and validation pipeline.
//!
//! Pure engine crate: receives workbook bytes, returns classified rows.
//! No storage or CLI dependencies.

pub mod error;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod schema;
pub mod sheet;
pub mod validate;
pub mod value;

pub use error::{IngestError, SchemaError};
pub use model::{NormalizedRecord, RowError, SheetErrors, SheetReport, UploadResult};
pub use pipeline::Pipeline;
pub use schema::{ColumnKind, ColumnSchema, Constraint, SchemaRegistry, SheetSchema};
pub use value::{FieldValue, RawCell};
