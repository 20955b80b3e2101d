// list / delete / export / schemas

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use sheetgate_io::format::ExportRow;
use sheetgate_ingest::NormalizedRecord;
use tracing::info;

use crate::exit_codes::EXIT_EXPORT;
use crate::{CliError, Context};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "xlsx" => Some(ExportFormat::Xlsx),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

/// Default export file name, without extension.
const EXPORT_STEM: &str = "exported_data";

fn stdout_line(out: &mut impl Write, line: &str) -> Result<(), CliError> {
    writeln!(out, "{}", line).map_err(|e| CliError::io(e.to_string()))
}

// ============================================================================
// list
// ============================================================================

pub fn cmd_list(
    ctx: &Context,
    page: u32,
    limit: Option<u32>,
    json: bool,
) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    let limit = limit.unwrap_or(ctx.settings.page_size);
    let page = store.page(page, limit).map_err(CliError::store)?;

    let mut out = io::stdout().lock();
    if json {
        let text = serde_json::to_string_pretty(&page).map_err(|e| CliError::io(e.to_string()))?;
        return stdout_line(&mut out, &text);
    }

    if page.data.is_empty() {
        return stdout_line(&mut out, &format!("No records (page {} of {})", page.current_page, page.total_pages));
    }

    for stored in &page.data {
        stdout_line(&mut out, &list_line(&stored.id, &stored.record))?;
    }
    stdout_line(
        &mut out,
        &format!(
            "page {} of {} ({} records)",
            page.current_page, page.total_pages, page.total
        ),
    )
}

fn list_line(id: &str, record: &NormalizedRecord) -> String {
    let row = ExportRow::from_record(record);
    let status = record
        .get("status")
        .map(ToString::to_string)
        .unwrap_or(row.verified);
    format!(
        "{}  {:<10} {:<24} {:>16}  {:<10} {}",
        id, record.sheet_name, row.name, row.amount, row.date, status
    )
}

// ============================================================================
// delete
// ============================================================================

pub fn cmd_delete(ctx: &Context, id: String) -> Result<(), CliError> {
    let store = ctx.open_store()?;
    let deleted = store.delete(&id).map_err(CliError::store)?;

    let mut out = io::stdout().lock();
    if deleted {
        stdout_line(&mut out, "Row deleted successfully")
    } else {
        stdout_line(&mut out, &format!("No record with id {} (nothing deleted)", id))
    }
}

// ============================================================================
// export
// ============================================================================

pub fn cmd_export(
    ctx: &Context,
    output: Option<PathBuf>,
    format: Option<ExportFormat>,
) -> Result<(), CliError> {
    let format = format
        .or_else(|| output.as_deref().and_then(ExportFormat::from_path))
        .unwrap_or(ExportFormat::Xlsx);
    let output = output.unwrap_or_else(|| {
        PathBuf::from(format!("{}.{}", EXPORT_STEM, format.extension()))
    });

    let store = ctx.open_store()?;
    let records: Vec<NormalizedRecord> = store
        .all()
        .map_err(CliError::store)?
        .into_iter()
        .map(|stored| stored.record)
        .collect();

    let export_err = |e: sheetgate_io::ExportError| CliError {
        code: EXIT_EXPORT,
        message: format!("{}: {}", output.display(), e),
        hint: None,
    };

    let rows = match format {
        ExportFormat::Xlsx => {
            sheetgate_io::xlsx::export(&records, &output)
                .map_err(export_err)?
                .rows_exported
        }
        ExportFormat::Csv => sheetgate_io::csv::export(&records, &output).map_err(export_err)?,
    };
    info!(rows, format = format.extension(), "export finished");

    let mut out = io::stdout().lock();
    stdout_line(&mut out, &format!("Exported {} rows to {}", rows, output.display()))
}

// ============================================================================
// schemas
// ============================================================================

pub fn cmd_schemas(ctx: &Context, json: bool) -> Result<(), CliError> {
    let registry = &ctx.registry;
    let mut out = io::stdout().lock();

    if json {
        let text =
            serde_json::to_string_pretty(registry).map_err(|e| CliError::io(e.to_string()))?;
        return stdout_line(&mut out, &text);
    }

    for (name, schema) in registry.sheets() {
        let marker = if name == registry.default_name() { " (default)" } else { "" };
        stdout_line(&mut out, &format!("{}{}", name, marker))?;
        for col in &schema.columns {
            let mut line = format!("  {:<14} -> {:<12} {}", col.header, col.field, col.kind);
            if col.required {
                line.push_str(", required");
            }
            if let Some(constraint) = &col.constraint {
                line.push_str(&format!(", {}", constraint));
            }
            stdout_line(&mut out, &line)?;
        }
    }
    Ok(())
}
