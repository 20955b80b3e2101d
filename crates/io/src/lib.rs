// File export: stored records -> XLSX / CSV

pub mod csv;
pub mod error;
pub mod format;
pub mod xlsx;

pub use error::ExportError;
pub use format::ExportRow;
