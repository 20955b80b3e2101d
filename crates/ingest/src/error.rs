use thiserror::Error;

/// Fatal, per-request failures. Row and cell problems are never reported here;
/// they are accumulated into the [`UploadResult`](crate::UploadResult).
#[derive(Debug, Error)]
pub enum IngestError {
    /// The bytes are not a readable .xlsx workbook.
    #[error("malformed workbook: {0}")]
    MalformedWorkbook(String),
}

/// Schema registry construction errors (configuration time only).
#[derive(Debug, Error)]
pub enum SchemaError {
    /// TOML parse / deserialization error.
    #[error("schema parse error: {0}")]
    Parse(String),

    /// The registry does not contain the sheet named as its default.
    #[error("default schema '{0}' is not defined")]
    MissingDefault(String),

    /// Two columns in one sheet share a header.
    #[error("sheet '{sheet}': duplicate header '{header}'")]
    DuplicateHeader { sheet: String, header: String },

    /// Two columns in one sheet map to the same target field.
    #[error("sheet '{sheet}': duplicate target field '{field}'")]
    DuplicateField { sheet: String, field: String },

    /// A sheet schema with no columns.
    #[error("sheet '{0}' has no columns")]
    EmptySheet(String),

    /// `one_of` constraint with an empty value list.
    #[error("sheet '{sheet}', column '{header}': one_of needs at least one value")]
    EmptyOneOf { sheet: String, header: String },
}

/// A cell whose value cannot be converted to its column's domain type.
///
/// Recoverable: the row validator turns it into an `Invalid <Header> value`
/// row error and keeps going.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CellNormalizationError {
    #[error("date serial {0} is out of range")]
    SerialOutOfRange(f64),

    #[error("cannot parse date '{0}'")]
    UnparseableDate(String),

    #[error("cell holds error value {0}")]
    ErrorCell(String),
}
