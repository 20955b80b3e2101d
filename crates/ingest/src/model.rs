use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::SchemaRegistry;
use crate::value::FieldValue;

/// Schema-mapped fields of one record, keyed by target field name.
pub type Fields = BTreeMap<String, FieldValue>;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A validated row, tagged with the sheet it came from. The unit handed to storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedRecord {
    pub sheet_name: String,
    #[serde(flatten)]
    pub fields: Fields,
}

impl NormalizedRecord {
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }
}

// ---------------------------------------------------------------------------
// Per-sheet reports
// ---------------------------------------------------------------------------

/// All errors for one rejected row. `row` is the 1-based sheet row number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub row: u32,
    pub errors: Vec<String>,
}

/// Outcome of processing one sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetReport {
    pub sheet_name: String,
    pub valid_records: Vec<NormalizedRecord>,
    pub row_errors: Vec<RowError>,
}

/// Error entry in the upload result: one per sheet with at least one bad row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetErrors {
    pub sheet: String,
    pub errors: Vec<RowError>,
}

// ---------------------------------------------------------------------------
// Upload result
// ---------------------------------------------------------------------------

pub const MESSAGE_ALL_VALID: &str = "All data validated successfully";
pub const MESSAGE_WITH_ERRORS: &str = "Validation completed with errors";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub errors: Vec<SheetErrors>,
    pub valid_data: Vec<NormalizedRecord>,
    pub message: String,
}

impl UploadResult {
    /// Fold per-sheet reports (in workbook order) into one result.
    pub fn from_reports(reports: Vec<SheetReport>) -> Self {
        let mut errors = Vec::new();
        let mut valid_data = Vec::new();

        for report in reports {
            if !report.row_errors.is_empty() {
                errors.push(SheetErrors {
                    sheet: report.sheet_name,
                    errors: report.row_errors,
                });
            }
            valid_data.extend(report.valid_records);
        }

        let message = if errors.is_empty() {
            MESSAGE_ALL_VALID
        } else {
            MESSAGE_WITH_ERRORS
        };

        UploadResult {
            errors,
            valid_data,
            message: message.to_string(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Re-type date fields after parsing a saved result from JSON.
    pub fn restore_dates(&mut self, registry: &SchemaRegistry) {
        for record in &mut self.valid_data {
            registry
                .resolve(&record.sheet_name)
                .restore_dates(&mut record.fields);
        }
    }

    /// Total number of rejected rows across all sheets.
    pub fn rejected_rows(&self) -> usize {
        self.errors.iter().map(|s| s.errors.len()).sum()
    }
}
