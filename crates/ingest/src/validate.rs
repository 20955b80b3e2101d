use chrono::{Datelike, NaiveDate};

use crate::model::Fields;
use crate::normalize::normalize;
use crate::schema::{ColumnSchema, Constraint, SheetSchema};
use crate::sheet::HeaderMap;
use crate::value::{FieldValue, RawCell};

static MISSING: RawCell = RawCell::Empty;

/// Result of validating one row. Invalid rows never carry a partial record.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid(Fields),
    Invalid(Vec<String>),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }
}

/// Validate a row against every column of the schema, collecting all errors.
///
/// Cells under headers the schema does not know are ignored. A schema column
/// missing from the sheet reads as an empty cell.
pub fn validate_row(
    schema: &SheetSchema,
    headers: &HeaderMap,
    cells: &[RawCell],
    reference_date: NaiveDate,
) -> ValidationOutcome {
    let mut fields = Fields::new();
    let mut errors = Vec::new();

    for column in &schema.columns {
        let raw = headers
            .index_of(&column.header)
            .and_then(|i| cells.get(i))
            .unwrap_or(&MISSING);

        match check_column(column, raw, reference_date) {
            Ok(Some(value)) => {
                fields.insert(column.field.clone(), value);
            }
            Ok(None) => {}
            Err(message) => errors.push(message),
        }
    }

    if errors.is_empty() {
        ValidationOutcome::Valid(fields)
    } else {
        ValidationOutcome::Invalid(errors)
    }
}

/// At most one error per column.
fn check_column(
    column: &ColumnSchema,
    raw: &RawCell,
    reference_date: NaiveDate,
) -> Result<Option<FieldValue>, String> {
    let value = normalize(column, raw).map_err(|_| invalid_value(&column.header))?;

    match value {
        None if column.required => Err(format!("{} is required", column.header)),
        None => Ok(None),
        Some(v) => match &column.constraint {
            Some(c) if !check_constraint(c, &v, reference_date) => Err(invalid_value(&column.header)),
            _ => Ok(Some(v)),
        },
    }
}

fn invalid_value(header: &str) -> String {
    format!("Invalid {header} value")
}

/// Pure dispatch over the named constraint kinds.
pub fn check_constraint(constraint: &Constraint, value: &FieldValue, reference_date: NaiveDate) -> bool {
    match constraint {
        Constraint::PositiveNumber => matches!(value, FieldValue::Number(n) if *n > 0.0),
        Constraint::ValidDate => matches!(value, FieldValue::Date(_)),
        Constraint::DateInCurrentMonth => match value {
            FieldValue::Date(d) => {
                d.year() == reference_date.year() && d.month() == reference_date.month()
            }
            _ => false,
        },
        Constraint::OneOf { values } => value
            .as_str()
            .is_some_and(|s| values.iter().any(|v| v == s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnKind, SchemaRegistry};
    use chrono::{TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 3, 20).unwrap()
    }

    fn default_headers() -> HeaderMap {
        HeaderMap::from_cells(&[
            RawCell::Text("Name".into()),
            RawCell::Text("Amount".into()),
            RawCell::Text("Date".into()),
            RawCell::Text("Verified".into()),
        ])
    }

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.into())
    }

    #[test]
    fn valid_row_stages_every_field() {
        let reg = SchemaRegistry::builtin();
        let cells = [text("Acme"), RawCell::Number(100.0), RawCell::Number(45000.0), text("Yes")];
        let outcome = validate_row(reg.resolve("Default"), &default_headers(), &cells, today());

        let ValidationOutcome::Valid(fields) = outcome else {
            panic!("expected valid outcome");
        };
        assert_eq!(fields.len(), 4);
        assert_eq!(fields["name"], FieldValue::Text("Acme".into()));
        assert_eq!(fields["amount"], FieldValue::Number(100.0));
        assert_eq!(
            fields["date"],
            FieldValue::Date(Utc.with_ymd_and_hms(2023, 3, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(fields["verified"], FieldValue::Text("Yes".into()));
    }

    #[test]
    fn every_failing_column_is_reported() {
        let reg = SchemaRegistry::builtin();
        let cells = [text(""), RawCell::Number(-5.0), RawCell::Number(45000.0), text("Maybe")];
        let outcome = validate_row(reg.resolve("Default"), &default_headers(), &cells, today());
        assert_eq!(
            outcome,
            ValidationOutcome::Invalid(vec![
                "Name is required".into(),
                "Invalid Amount value".into(),
                "Invalid Verified value".into(),
            ])
        );
    }

    #[test]
    fn all_four_columns_failing_yield_four_errors() {
        let reg = SchemaRegistry::builtin();
        let cells = [RawCell::Empty, text("zero"), text("someday"), RawCell::Number(1.0)];
        let ValidationOutcome::Invalid(errors) =
            validate_row(reg.resolve("Default"), &default_headers(), &cells, today())
        else {
            panic!("expected invalid outcome");
        };
        assert_eq!(errors.len(), 4);
        assert_eq!(errors[2], "Invalid Date value");
    }

    #[test]
    fn zero_amount_is_invalid() {
        let reg = SchemaRegistry::builtin();
        let cells = [text("Acme"), RawCell::Number(0.0), RawCell::Number(45000.0), text("No")];
        let outcome = validate_row(reg.resolve("Default"), &default_headers(), &cells, today());
        assert_eq!(outcome, ValidationOutcome::Invalid(vec!["Invalid Amount value".into()]));
    }

    #[test]
    fn missing_schema_column_reads_as_empty() {
        let reg = SchemaRegistry::builtin();
        let headers = HeaderMap::from_cells(&[text("Name"), text("Amount"), text("Date")]);
        let cells = [text("Acme"), RawCell::Number(10.0), RawCell::Number(45000.0)];
        let outcome = validate_row(reg.resolve("Default"), &headers, &cells, today());
        assert_eq!(outcome, ValidationOutcome::Invalid(vec!["Verified is required".into()]));
    }

    #[test]
    fn short_rows_read_trailing_cells_as_empty() {
        let reg = SchemaRegistry::builtin();
        let cells = [text("Acme"), RawCell::Number(10.0)];
        let outcome = validate_row(reg.resolve("Default"), &default_headers(), &cells, today());
        assert_eq!(
            outcome,
            ValidationOutcome::Invalid(vec!["Date is required".into(), "Verified is required".into()])
        );
    }

    #[test]
    fn extra_columns_are_ignored() {
        let reg = SchemaRegistry::builtin();
        let headers = HeaderMap::from_cells(&[
            text("Notes"),
            text("Name"),
            text("Amount"),
            text("Date"),
            text("Verified"),
        ]);
        let cells = [text("ignore me"), text("Acme"), RawCell::Number(1.0), RawCell::Number(45000.0), RawCell::Bool(false)];
        let ValidationOutcome::Valid(fields) = validate_row(reg.resolve("Default"), &headers, &cells, today()) else {
            panic!("expected valid outcome");
        };
        assert!(!fields.contains_key("Notes"));
        assert!(!fields.contains_key("notes"));
        assert_eq!(fields["verified"], FieldValue::Text("No".into()));
    }

    #[test]
    fn unparseable_date_reports_once() {
        let reg = SchemaRegistry::builtin();
        let cells = [text("Acme"), RawCell::Number(1.0), text("not a date"), text("Yes")];
        let outcome = validate_row(reg.resolve("Default"), &default_headers(), &cells, today());
        assert_eq!(outcome, ValidationOutcome::Invalid(vec!["Invalid Date value".into()]));
    }

    #[test]
    fn optional_missing_values_are_not_staged() {
        let schema = SheetSchema {
            columns: vec![
                ColumnSchema::new("Name", "name", ColumnKind::PlainText).required(),
                ColumnSchema::new("Note", "note", ColumnKind::PlainText)
                    .with_constraint(Constraint::OneOf { values: vec!["x".into()] }),
            ],
        };
        let headers = HeaderMap::from_cells(&[text("Name"), text("Note")]);
        let ValidationOutcome::Valid(fields) = validate_row(&schema, &headers, &[text("Acme")], today()) else {
            panic!("expected valid outcome");
        };
        assert_eq!(fields.len(), 1);
        assert!(!fields.contains_key("note"));
    }

    #[test]
    fn current_month_constraint_uses_reference_date() {
        let march = FieldValue::Date(Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap());
        let april = FieldValue::Date(Utc.with_ymd_and_hms(2023, 4, 1, 0, 0, 0).unwrap());
        let last_year = FieldValue::Date(Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap());
        let c = Constraint::DateInCurrentMonth;
        assert!(check_constraint(&c, &march, today()));
        assert!(!check_constraint(&c, &april, today()));
        assert!(!check_constraint(&c, &last_year, today()));
        assert!(!check_constraint(&c, &FieldValue::Text("2023-03-01".into()), today()));
    }

    #[test]
    fn positive_number_rejects_text_and_negatives() {
        let c = Constraint::PositiveNumber;
        assert!(check_constraint(&c, &FieldValue::Number(0.01), today()));
        assert!(!check_constraint(&c, &FieldValue::Number(-1.0), today()));
        assert!(!check_constraint(&c, &FieldValue::Text("100".into()), today()));
    }
}
