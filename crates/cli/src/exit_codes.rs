//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain    | Description                                 |
//! |---------|-----------|---------------------------------------------|
//! | 0       | Universal | Success                                     |
//! | 1       | Universal | General error (unspecified)                 |
//! | 2       | Universal | CLI usage error (bad args, missing file)    |
//! | 3-9     | upload    | Boundary checks and workbook validation     |
//! | 10-19   | config    | Settings and schema files                   |
//! | 20-29   | store     | Record store                                |
//! | 30-39   | export    | XLSX/CSV export                             |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use sheetgate_store::StoreError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing input file.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Upload (3-9)
// =============================================================================

/// Workbook parsed, but at least one row was rejected.
/// Like `diff(1)`, a "found something" result rather than a failure.
pub const EXIT_ROWS_REJECTED: u8 = 3;

/// File extension is not .xlsx.
pub const EXIT_UPLOAD_TYPE: u8 = 4;

/// File exceeds `max_upload_bytes`.
pub const EXIT_UPLOAD_TOO_LARGE: u8 = 5;

/// Bytes are not a readable workbook.
pub const EXIT_MALFORMED_WORKBOOK: u8 = 6;

// =============================================================================
// Config (10-19)
// =============================================================================

/// Settings file unreadable or invalid.
pub const EXIT_CONFIG_SETTINGS: u8 = 10;

/// Schema registry file unreadable or invalid.
pub const EXIT_CONFIG_SCHEMA: u8 = 11;

// =============================================================================
// Store (20-29)
// =============================================================================

/// SQLite or record encoding failure.
pub const EXIT_STORE: u8 = 20;

/// Record id is not a valid id.
pub const EXIT_STORE_INVALID_ID: u8 = 21;

/// Import requested with nothing to import.
pub const EXIT_STORE_NO_DATA: u8 = 22;

// =============================================================================
// Export (30-39)
// =============================================================================

/// Export file could not be written.
pub const EXIT_EXPORT: u8 = 30;

/// Map a StoreError to its exit code.
pub fn store_exit_code(err: &StoreError) -> u8 {
    match err {
        StoreError::Sqlite(_) | StoreError::Json(_) => EXIT_STORE,
        StoreError::InvalidId(_) => EXIT_STORE_INVALID_ID,
        StoreError::NoData => EXIT_STORE_NO_DATA,
    }
}
