use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;
use crate::model::Fields;
use crate::normalize::parse_date_text;
use crate::value::FieldValue;

/// Name of the built-in fallback schema.
pub const DEFAULT_SHEET: &str = "Default";

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// How a column's raw cells are normalized before validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Spreadsheet date serials and ISO-like strings become UTC dates.
    #[serde(rename = "date")]
    DateLike,
    /// Native booleans become "Yes" / "No".
    #[serde(rename = "flag")]
    BooleanFlag,
    #[serde(rename = "text")]
    PlainText,
    /// Numeric strings become numbers.
    #[serde(rename = "number")]
    PlainNumber,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DateLike => write!(f, "date"),
            Self::BooleanFlag => write!(f, "flag"),
            Self::PlainText => write!(f, "text"),
            Self::PlainNumber => write!(f, "number"),
        }
    }
}

/// Named validation rule for a column. Checked by [`crate::validate::check_constraint`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Constraint {
    /// Numeric and strictly greater than zero.
    PositiveNumber,
    /// Resolved to a calendar date.
    ValidDate,
    /// A date in the same month and year as the reference date.
    DateInCurrentMonth,
    /// One of the listed strings (exact match).
    OneOf { values: Vec<String> },
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PositiveNumber => write!(f, "positive number"),
            Self::ValidDate => write!(f, "valid date"),
            Self::DateInCurrentMonth => write!(f, "date in current month"),
            Self::OneOf { values } => write!(f, "one of {}", values.join(", ")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Header text as it appears (trimmed) in the sheet's first row.
    pub header: String,
    /// Record field the value is stored under.
    pub field: String,
    pub kind: ColumnKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
}

impl ColumnSchema {
    pub fn new(header: &str, field: &str, kind: ColumnKind) -> Self {
        Self {
            header: header.to_string(),
            field: field.to_string(),
            kind,
            required: false,
            constraint: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }
}

// ---------------------------------------------------------------------------
// Sheet
// ---------------------------------------------------------------------------

/// Ordered column specs for one sheet. Order drives error order within a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetSchema {
    pub columns: Vec<ColumnSchema>,
}

impl SheetSchema {
    pub fn column(&self, header: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.header == header)
    }

    /// Re-type the date columns of fields read back from JSON, where dates are
    /// plain strings. Text columns are left alone whatever they contain.
    pub fn restore_dates(&self, fields: &mut Fields) {
        for col in self.columns.iter().filter(|c| c.kind == ColumnKind::DateLike) {
            let parsed = match fields.get(&col.field) {
                Some(FieldValue::Text(s)) => parse_date_text(s).ok(),
                _ => None,
            };
            if let Some(date) = parsed {
                fields.insert(col.field.clone(), FieldValue::Date(date));
            }
        }
    }

    fn validate(&self, sheet: &str) -> Result<(), SchemaError> {
        if self.columns.is_empty() {
            return Err(SchemaError::EmptySheet(sheet.to_string()));
        }

        let mut headers = HashSet::new();
        let mut fields = HashSet::new();
        for col in &self.columns {
            if !headers.insert(col.header.as_str()) {
                return Err(SchemaError::DuplicateHeader {
                    sheet: sheet.to_string(),
                    header: col.header.clone(),
                });
            }
            if !fields.insert(col.field.as_str()) {
                return Err(SchemaError::DuplicateField {
                    sheet: sheet.to_string(),
                    field: col.field.clone(),
                });
            }
            if let Some(Constraint::OneOf { values }) = &col.constraint {
                if values.is_empty() {
                    return Err(SchemaError::EmptyOneOf {
                        sheet: sheet.to_string(),
                        header: col.header.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Process-wide, read-only mapping from sheet name to schema.
///
/// Every constructor validates, so the default schema is always present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawRegistry")]
pub struct SchemaRegistry {
    default: String,
    sheets: BTreeMap<String, SheetSchema>,
}

#[derive(Deserialize)]
struct RawRegistry {
    #[serde(default = "default_sheet_name")]
    default: String,
    sheets: BTreeMap<String, SheetSchema>,
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET.to_string()
}

impl TryFrom<RawRegistry> for SchemaRegistry {
    type Error = SchemaError;

    fn try_from(raw: RawRegistry) -> Result<Self, SchemaError> {
        let registry = SchemaRegistry {
            default: raw.default,
            sheets: raw.sheets,
        };
        registry.validate()?;
        Ok(registry)
    }
}

impl SchemaRegistry {
    /// The two schemas shipped with the binary: `Default` and `Invoices`.
    pub fn builtin() -> Self {
        use ColumnKind::*;

        let yes_no = Constraint::OneOf {
            values: vec!["Yes".into(), "No".into()],
        };
        let paid_pending = Constraint::OneOf {
            values: vec!["Paid".into(), "Pending".into()],
        };

        let default = SheetSchema {
            columns: vec![
                ColumnSchema::new("Name", "name", PlainText).required(),
                ColumnSchema::new("Amount", "amount", PlainNumber)
                    .required()
                    .with_constraint(Constraint::PositiveNumber),
                ColumnSchema::new("Date", "date", DateLike)
                    .required()
                    .with_constraint(Constraint::ValidDate),
                ColumnSchema::new("Verified", "verified", BooleanFlag)
                    .required()
                    .with_constraint(yes_no),
            ],
        };

        let invoices = SheetSchema {
            columns: vec![
                ColumnSchema::new("Name", "name", PlainText).required(),
                ColumnSchema::new("InvoiceDate", "invoiceDate", DateLike)
                    .required()
                    .with_constraint(Constraint::ValidDate),
                ColumnSchema::new("Amount", "amount", PlainNumber)
                    .required()
                    .with_constraint(Constraint::PositiveNumber),
                ColumnSchema::new("Status", "status", PlainText)
                    .required()
                    .with_constraint(paid_pending),
            ],
        };

        let mut sheets = BTreeMap::new();
        sheets.insert(DEFAULT_SHEET.to_string(), default);
        sheets.insert("Invoices".to_string(), invoices);

        SchemaRegistry {
            default: DEFAULT_SHEET.to_string(),
            sheets,
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, SchemaError> {
        toml::from_str(input).map_err(|e| SchemaError::Parse(e.to_string()))
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if !self.sheets.contains_key(&self.default) {
            return Err(SchemaError::MissingDefault(self.default.clone()));
        }
        for (name, schema) in &self.sheets {
            schema.validate(name)?;
        }
        Ok(())
    }

    /// Schema for a sheet name. Unknown names fall back to the default schema.
    pub fn resolve(&self, sheet_name: &str) -> &SheetSchema {
        self.sheets
            .get(sheet_name)
            .unwrap_or_else(|| &self.sheets[&self.default])
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn sheets(&self) -> impl Iterator<Item = (&str, &SheetSchema)> {
        self.sheets.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
