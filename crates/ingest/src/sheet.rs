// Sheet processing: header resolution + per-row classification.

use std::collections::HashMap;

use calamine::{Data, Range};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::model::{NormalizedRecord, RowError, SheetReport};
use crate::schema::SchemaRegistry;
use crate::validate::{validate_row, ValidationOutcome};
use crate::value::RawCell;

// ---------------------------------------------------------------------------
// Header map
// ---------------------------------------------------------------------------

/// Trimmed header text → column index within the row.
#[derive(Debug, Clone, Default)]
pub struct HeaderMap {
    index: HashMap<String, usize>,
}

impl HeaderMap {
    /// Build from the header row. The first occurrence of a repeated header wins.
    pub fn from_cells(cells: &[RawCell]) -> Self {
        let mut index = HashMap::new();
        for (col, cell) in cells.iter().enumerate() {
            if let Some(header) = cell.header_text() {
                index.entry(header).or_insert(col);
            }
        }
        Self { index }
    }

    pub fn index_of(&self, header: &str) -> Option<usize> {
        self.index.get(header).copied()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Sheet grid
// ---------------------------------------------------------------------------

/// The used range of one worksheet, converted to [`RawCell`]s.
#[derive(Debug, Clone)]
pub struct SheetGrid {
    pub name: String,
    /// 0-based sheet row index of `rows[0]`.
    pub first_row: u32,
    pub rows: Vec<Vec<RawCell>>,
}

impl SheetGrid {
    /// A grid whose first row is sheet row 1.
    pub fn new(name: impl Into<String>, rows: Vec<Vec<RawCell>>) -> Self {
        Self {
            name: name.into(),
            first_row: 0,
            rows,
        }
    }

    pub fn from_range(name: impl Into<String>, range: &Range<Data>) -> Self {
        let first_row = range.start().map(|(row, _)| row).unwrap_or(0);
        let rows = range
            .rows()
            .map(|row| row.iter().map(RawCell::from).collect())
            .collect();
        Self {
            name: name.into(),
            first_row,
            rows,
        }
    }
}

// ---------------------------------------------------------------------------
// Processing
// ---------------------------------------------------------------------------

/// Classify every data row of a sheet against the schema its name resolves to.
///
/// Sheet row 1 is the header row. When the used range starts lower, row 1 is
/// blank: no column resolves and every row in the range is a data row.
/// Rows with no content are skipped.
pub fn process_sheet(grid: &SheetGrid, registry: &SchemaRegistry, reference_date: NaiveDate) -> SheetReport {
    let schema = registry.resolve(&grid.name);

    let mut report = SheetReport {
        sheet_name: grid.name.clone(),
        valid_records: Vec::new(),
        row_errors: Vec::new(),
    };

    let mut rows = grid.rows.iter().enumerate();
    let headers = if grid.first_row == 0 {
        let Some((_, header_cells)) = rows.next() else {
            debug!(sheet = %grid.name, "empty sheet");
            return report;
        };
        HeaderMap::from_cells(header_cells)
    } else {
        HeaderMap::default()
    };
    if !schema.columns.iter().any(|c| headers.index_of(&c.header).is_some()) {
        warn!(sheet = %grid.name, "header row matches no schema column");
    }

    let mut blank_rows = 0usize;
    for (offset, cells) in rows {
        if cells.iter().all(RawCell::is_blank) {
            blank_rows += 1;
            continue;
        }

        let row = grid.first_row + offset as u32 + 1;
        match validate_row(schema, &headers, cells, reference_date) {
            ValidationOutcome::Valid(fields) => report.valid_records.push(NormalizedRecord {
                sheet_name: grid.name.clone(),
                fields,
            }),
            ValidationOutcome::Invalid(errors) => report.row_errors.push(RowError { row, errors }),
        }
    }

    debug!(
        sheet = %grid.name,
        valid = report.valid_records.len(),
        invalid = report.row_errors.len(),
        blank = blank_rows,
        "sheet processed"
    );

    report
}
