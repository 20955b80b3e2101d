// validate / import
//
// Upload boundary: the checks a file must pass before its bytes reach the
// pipeline, then the two commands that run the pipeline.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use sheetgate_ingest::{IngestError, Pipeline, UploadResult};
use thiserror::Error;
use tracing::info;

use crate::exit_codes::{
    EXIT_MALFORMED_WORKBOOK, EXIT_ROWS_REJECTED, EXIT_UPLOAD_TOO_LARGE, EXIT_UPLOAD_TYPE,
};
use crate::{CliError, Context};

/// Accepted upload extension (case-sensitive, like the browser upload filter it replaces).
pub const UPLOAD_EXTENSION: &str = "xlsx";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadRejected {
    #[error("only .xlsx files are allowed")]
    WrongType,

    #[error("file is {size} bytes; maximum is {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
}

impl From<UploadRejected> for CliError {
    fn from(err: UploadRejected) -> Self {
        match err {
            UploadRejected::WrongType => CliError {
                code: EXIT_UPLOAD_TYPE,
                message: err.to_string(),
                hint: Some("save the workbook as Excel Workbook (.xlsx)".to_string()),
            },
            UploadRejected::TooLarge { .. } => CliError {
                code: EXIT_UPLOAD_TOO_LARGE,
                message: err.to_string(),
                hint: Some("raise max_upload_bytes in settings.toml".to_string()),
            },
        }
    }
}

/// Reject files by extension and size before reading them.
pub fn check_upload(path: &Path, len: u64, max_bytes: u64) -> Result<(), UploadRejected> {
    if path.extension().and_then(|e| e.to_str()) != Some(UPLOAD_EXTENSION) {
        return Err(UploadRejected::WrongType);
    }
    if len > max_bytes {
        return Err(UploadRejected::TooLarge {
            size: len,
            limit: max_bytes,
        });
    }
    Ok(())
}

fn read_upload(path: &Path, max_bytes: u64) -> Result<Vec<u8>, CliError> {
    let meta = fs::metadata(path)
        .map_err(|e| CliError::args(format!("{}: {}", path.display(), e)))?;
    check_upload(path, meta.len(), max_bytes)?;
    fs::read(path).map_err(|e| CliError::io(format!("{}: {}", path.display(), e)))
}

fn run_pipeline(ctx: &Context, file: &Path) -> Result<UploadResult, CliError> {
    let bytes = read_upload(file, ctx.settings.max_upload_bytes)?;
    let pipeline = Pipeline::new(ctx.registry.clone());
    pipeline.process(&bytes).map_err(|e| match e {
        IngestError::MalformedWorkbook(_) => CliError {
            code: EXIT_MALFORMED_WORKBOOK,
            message: format!("{}: {}", file.display(), e),
            hint: None,
        },
    })
}

fn write_json(value: &impl serde::Serialize, output: Option<&Path>) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::io(e.to_string()))?;
    match output {
        Some(path) => fs::write(path, text + "\n")
            .map_err(|e| CliError::io(format!("{}: {}", path.display(), e))),
        None => {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", text).map_err(|e| CliError::io(e.to_string()))
        }
    }
}

fn print_summary(file: &Path, result: &UploadResult) -> Result<(), CliError> {
    let mut lines = vec![
        format!("{}: {}", file.display(), result.message),
        format!("  valid rows:    {}", result.valid_data.len()),
        format!("  rejected rows: {}", result.rejected_rows()),
    ];

    for sheet in &result.errors {
        lines.push(String::new());
        lines.push(format!("Sheet {}:", sheet.sheet));
        for row in &sheet.errors {
            lines.push(format!("  row {}: {}", row.row, row.errors.join("; ")));
        }
    }

    let mut out = io::stdout().lock();
    writeln!(out, "{}", lines.join("\n")).map_err(|e| CliError::io(e.to_string()))
}

// ============================================================================
// validate
// ============================================================================

pub fn cmd_validate(
    ctx: &Context,
    file: PathBuf,
    json: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let result = run_pipeline(ctx, &file)?;

    if json || output.is_some() {
        write_json(&result, output.as_deref())?;
    }
    if !json {
        print_summary(&file, &result)?;
    }

    if result.has_errors() {
        return Err(CliError {
            code: EXIT_ROWS_REJECTED,
            message: String::new(),
            hint: None,
        });
    }
    Ok(())
}

// ============================================================================
// import
// ============================================================================

pub fn cmd_import(
    ctx: &Context,
    file: Option<PathBuf>,
    from_json: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let result = match (file, from_json) {
        (Some(file), None) => run_pipeline(ctx, &file)?,
        (None, Some(saved)) => {
            let text = fs::read_to_string(&saved)
                .map_err(|e| CliError::args(format!("{}: {}", saved.display(), e)))?;
            let mut saved_result = serde_json::from_str::<UploadResult>(&text).map_err(|e| {
                CliError::parse(format!("{}: {}", saved.display(), e))
                    .with_hint("expected the output of `sheetgate validate --json`")
            })?;
            saved_result.restore_dates(&ctx.registry);
            saved_result
        }
        _ => return Err(CliError::args("give either a workbook or --from-json <file>")),
    };

    let mut store = ctx.open_store()?;
    let summary = store
        .insert_many(&result.valid_data)
        .map_err(CliError::store)?;
    info!(imported = summary.imported, rejected = result.rejected_rows(), "import finished");

    if json {
        write_json(&summary, None)?;
    } else {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", summary.message).map_err(|e| CliError::io(e.to_string()))?;
        if result.has_errors() {
            writeln!(
                out,
                "{} rejected row(s) were not imported",
                result.rejected_rows()
            )
            .map_err(|e| CliError::io(e.to_string()))?;
        }
    }
    Ok(())
}
