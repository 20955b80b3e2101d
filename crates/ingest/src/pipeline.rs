use std::io::Cursor;

use calamine::{Reader, Xlsx};
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::error::IngestError;
use crate::model::UploadResult;
use crate::schema::SchemaRegistry;
use crate::sheet::{process_sheet, SheetGrid};

/// Workbook-level entry point: bytes in, classified rows out.
///
/// Holds no per-request state; one instance can serve concurrent uploads.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    registry: SchemaRegistry,
    /// Date that "current month" constraints compare against. Today (UTC) when unset.
    reference_date: Option<NaiveDate>,
}

impl Pipeline {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            reference_date: None,
        }
    }

    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.reference_date = Some(date);
        self
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Parse and validate an .xlsx workbook.
    ///
    /// Only an unreadable workbook is an error; row problems are reported in the result.
    pub fn process(&self, bytes: &[u8]) -> Result<UploadResult, IngestError> {
        let grids = read_workbook(bytes)?;
        Ok(self.process_grids(&grids))
    }

    /// Validate sheets that were already read, in the given order.
    pub fn process_grids(&self, grids: &[SheetGrid]) -> UploadResult {
        let reference_date = self
            .reference_date
            .unwrap_or_else(|| Utc::now().date_naive());

        let reports = grids
            .iter()
            .map(|grid| process_sheet(grid, &self.registry, reference_date))
            .collect();
        let result = UploadResult::from_reports(reports);

        info!(
            sheets = grids.len(),
            valid = result.valid_data.len(),
            rejected = result.rejected_rows(),
            "{}",
            result.message
        );
        result
    }
}

/// Read every worksheet of an .xlsx buffer, in workbook order.
pub fn read_workbook(bytes: &[u8]) -> Result<Vec<SheetGrid>, IngestError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| IngestError::MalformedWorkbook(e.to_string()))?;

    let sheet_names = workbook.sheet_names();
    debug!(sheets = sheet_names.len(), bytes = bytes.len(), "workbook opened");

    let mut grids = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| IngestError::MalformedWorkbook(format!("sheet '{name}': {e}")))?;
        grids.push(SheetGrid::from_range(name, &range));
    }

    Ok(grids)
}
