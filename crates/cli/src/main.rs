// sheetgate CLI - validate, import and export spreadsheet data

mod exit_codes;
mod logging;
mod records;
mod upload;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sheetgate_config::{Settings, SettingsError};
use sheetgate_ingest::SchemaRegistry;
use sheetgate_store::{RecordStore, StoreError};
use tracing::debug;

use exit_codes::{
    store_exit_code, EXIT_CONFIG_SCHEMA, EXIT_CONFIG_SETTINGS, EXIT_ERROR, EXIT_SUCCESS,
    EXIT_USAGE,
};
use logging::LogFormat;
use records::ExportFormat;

#[derive(Parser)]
#[command(name = "sheetgate")]
#[command(about = "Validate multi-sheet .xlsx workbooks and keep the accepted rows")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Settings file (default: <config dir>/sheetgate/settings.toml)
    #[arg(long, global = true, env = "SHEETGATE_CONFIG")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a workbook and report valid rows and per-row errors
    #[command(after_help = "\
Examples:
  sheetgate validate ledger.xlsx
  sheetgate validate ledger.xlsx --json
  sheetgate validate ledger.xlsx -o result.json

Exit codes:
  0  every row is valid
  3  at least one row was rejected")]
    Validate {
        /// Workbook to validate (.xlsx)
        file: PathBuf,

        /// Print the result as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Also write the JSON result to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Validate a workbook and store its valid rows
    #[command(after_help = "\
Examples:
  sheetgate import ledger.xlsx
  sheetgate validate ledger.xlsx -o result.json && sheetgate import --from-json result.json")]
    Import {
        /// Workbook to import (.xlsx)
        #[arg(conflicts_with = "from_json", required_unless_present = "from_json")]
        file: Option<PathBuf>,

        /// Import the validData of a saved `validate --json` result
        #[arg(long)]
        from_json: Option<PathBuf>,

        /// Print the import summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List stored records, newest date first
    #[command(after_help = "\
Examples:
  sheetgate list
  sheetgate list --page 2 --limit 50
  sheetgate list --json")]
    List {
        /// Page number (1-based)
        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Records per page (default: page_size from settings)
        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        json: bool,
    },

    /// Delete a stored record by id
    Delete {
        /// Record id as shown by `sheetgate list`
        id: String,
    },

    /// Export all stored records
    #[command(after_help = "\
Examples:
  sheetgate export
  sheetgate export -o march.csv
  sheetgate export --format csv")]
    Export {
        /// Output file (default: exported_data.xlsx / exported_data.csv)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Output format (default: from the output extension, else xlsx)
        #[arg(long, value_enum)]
        format: Option<ExportFormat>,
    },

    /// Show the active sheet schemas
    Schemas {
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("GIT_COMMIT_HASH"),
        ")"
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = Context::load(cli.config.as_deref()).and_then(|ctx| {
        logging::init(cli.verbose, cli.log_format, &ctx.settings.log_level);
        debug!(database = %ctx.settings.database.display(), "settings resolved");

        match cli.command {
            Commands::Validate { file, json, output } => {
                upload::cmd_validate(&ctx, file, json, output)
            }
            Commands::Import { file, from_json, json } => {
                upload::cmd_import(&ctx, file, from_json, json)
            }
            Commands::List { page, limit, json } => records::cmd_list(&ctx, page, limit, json),
            Commands::Delete { id } => records::cmd_delete(&ctx, id),
            Commands::Export { output, format } => records::cmd_export(&ctx, output, format),
            Commands::Schemas { json } => records::cmd_schemas(&ctx, json),
        }
    });

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

// ============================================================================
// Shared command context
// ============================================================================

/// Settings and schema registry, resolved once per invocation.
pub struct Context {
    pub settings: Settings,
    pub registry: SchemaRegistry,
}

impl Context {
    fn load(config: Option<&Path>) -> Result<Self, CliError> {
        let settings = Settings::load(config).map_err(CliError::settings)?;

        let registry = match &settings.schemas {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|e| CliError {
                    code: EXIT_CONFIG_SCHEMA,
                    message: format!("{}: {}", path.display(), e),
                    hint: None,
                })?;
                SchemaRegistry::from_toml(&text).map_err(|e| CliError {
                    code: EXIT_CONFIG_SCHEMA,
                    message: format!("{}: {}", path.display(), e),
                    hint: Some("run `sheetgate schemas` without a schema file to see the expected shape".to_string()),
                })?
            }
            None => SchemaRegistry::builtin(),
        };

        Ok(Self { settings, registry })
    }

    /// Open the record store, creating the database directory on first use.
    pub fn open_store(&self) -> Result<RecordStore, CliError> {
        let path = &self.settings.database;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CliError::io(format!("{}: {}", parent.display(), e)))?;
        }
        RecordStore::open(path).map_err(CliError::store)
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn settings(err: SettingsError) -> Self {
        Self { code: EXIT_CONFIG_SETTINGS, message: err.to_string(), hint: None }
    }

    /// Create error from store error with the matching exit code.
    pub fn store(err: StoreError) -> Self {
        let hint = match &err {
            StoreError::InvalidId(_) => Some("ids look like 0f8fad5b-d9cb-469f-a165-70867728950e".to_string()),
            StoreError::NoData => Some("the workbook has no valid rows; see `sheetgate validate`".to_string()),
            _ => None,
        };
        Self { code: store_exit_code(&err), message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
