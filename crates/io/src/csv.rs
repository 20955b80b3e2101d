// CSV export

use std::io::Write;
use std::path::Path;

use sheetgate_ingest::NormalizedRecord;

use crate::error::ExportError;
use crate::format::{ExportRow, EXPORT_HEADER};

/// Write records as CSV to any writer. Returns the number of data rows.
pub fn export_to_writer<W: Write>(records: &[NormalizedRecord], writer: W) -> Result<usize, ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_HEADER)?;

    for record in records {
        wtr.write_record(ExportRow::from_record(record).cells())?;
    }

    wtr.flush()?;
    Ok(records.len())
}

pub fn export(records: &[NormalizedRecord], path: &Path) -> Result<usize, ExportError> {
    let file = std::fs::File::create(path)?;
    export_to_writer(records, file)
}
