// XLSX export
//
// Presentation snapshot of stored records: every cell is written as the same
// formatted text the CSV export produces. Not meant to be re-imported.

use std::path::Path;
use std::time::Instant;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use sheetgate_ingest::NormalizedRecord;
use tracing::info;

use crate::error::ExportError;
use crate::format::{ExportRow, EXPORT_HEADER};

/// Name of the single worksheet in an export.
pub const EXPORT_SHEET: &str = "Exported Data";

/// Column widths (Excel character units) for Name, Amount, Date, Verified.
const COLUMN_WIDTHS: [f64; 4] = [28.0, 16.0, 12.0, 10.0];

#[derive(Debug, Default, Clone)]
pub struct ExportResult {
    pub rows_exported: usize,
    pub export_duration_ms: u128,
}

/// Write records to an .xlsx file.
pub fn export(records: &[NormalizedRecord], path: &Path) -> Result<ExportResult, ExportError> {
    let start_time = Instant::now();

    let mut workbook = build_workbook(records)?;
    workbook.save(path)?;

    let result = ExportResult {
        rows_exported: records.len(),
        export_duration_ms: start_time.elapsed().as_millis(),
    };
    info!(rows = result.rows_exported, path = %path.display(), "xlsx export written");
    Ok(result)
}

/// Render records to an in-memory .xlsx file.
pub fn export_to_buffer(records: &[NormalizedRecord]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = build_workbook(records)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook(records: &[NormalizedRecord]) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name(EXPORT_SHEET)?;
    write_rows(worksheet, records)?;
    Ok(workbook)
}

fn write_rows(worksheet: &mut Worksheet, records: &[NormalizedRecord]) -> Result<(), ExportError> {
    let header_format = Format::new().set_bold();

    for (col, (title, width)) in EXPORT_HEADER.iter().zip(COLUMN_WIDTHS).enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
        worksheet.set_column_width(col as u16, width)?;
    }

    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        let export_row = ExportRow::from_record(record);
        for (col, cell) in export_row.cells().iter().enumerate() {
            if !cell.is_empty() {
                worksheet.write_string(row, col as u16, *cell)?;
            }
        }
    }

    Ok(())
}
