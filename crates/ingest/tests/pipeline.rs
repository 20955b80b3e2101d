use chrono::{NaiveDate, Utc};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use serde_json::json;

use sheetgate_ingest::model::{MESSAGE_ALL_VALID, MESSAGE_WITH_ERRORS};
use sheetgate_ingest::{FieldValue, IngestError, Pipeline, SchemaRegistry};

const DEFAULT_HEADER: [&str; 4] = ["Name", "Amount", "Date", "Verified"];
const INVOICE_HEADER: [&str; 4] = ["Name", "InvoiceDate", "Amount", "Status"];

fn serial_for(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    (date - epoch).num_days() as f64 + 25569.0
}

fn write_header(ws: &mut Worksheet, header: &[&str]) {
    for (col, title) in header.iter().enumerate() {
        ws.write_string(0, col as u16, *title).unwrap();
    }
}

fn to_bytes(mut wb: Workbook) -> Vec<u8> {
    wb.save_to_buffer().unwrap()
}

fn pipeline() -> Pipeline {
    Pipeline::new(SchemaRegistry::builtin())
}

// -------------------------------------------------------------------------
// Single sheet
// -------------------------------------------------------------------------

#[test]
fn valid_default_row_with_todays_serial() {
    let today = Utc::now().date_naive();
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Default").unwrap();
    write_header(ws, &DEFAULT_HEADER);
    ws.write_string(1, 0, "Acme").unwrap();
    ws.write_number(1, 1, 100).unwrap();
    ws.write_number(1, 2, serial_for(today)).unwrap();
    ws.write_string(1, 3, "Yes").unwrap();

    let result = pipeline().process(&to_bytes(wb)).unwrap();

    assert!(result.errors.is_empty());
    assert_eq!(result.message, MESSAGE_ALL_VALID);
    let expected_date = format!("{}T00:00:00.000Z", today.format("%Y-%m-%d"));
    assert_eq!(
        serde_json::to_value(&result.valid_data).unwrap(),
        json!([{
            "sheetName": "Default",
            "name": "Acme",
            "amount": 100,
            "date": expected_date,
            "verified": "Yes"
        }])
    );
}

#[test]
fn date_formatted_cells_decode_like_plain_serials() {
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Default").unwrap();
    write_header(ws, &DEFAULT_HEADER);
    ws.write_string(1, 0, "Acme").unwrap();
    ws.write_number(1, 1, 12.5).unwrap();
    ws.write_number_with_format(1, 2, 45000.0, &date_format).unwrap();
    ws.write_boolean(1, 3, true).unwrap();

    let result = pipeline().process(&to_bytes(wb)).unwrap();

    assert!(result.errors.is_empty());
    let record = &result.valid_data[0];
    let date = record.get("date").and_then(FieldValue::as_date).unwrap();
    assert_eq!(date.date_naive(), NaiveDate::from_ymd_opt(2023, 3, 15).unwrap());
    assert_eq!(record.get("verified"), Some(&FieldValue::Text("Yes".into())));
    assert_eq!(record.get("amount"), Some(&FieldValue::Number(12.5)));
}

#[test]
fn invalid_default_row_reports_three_errors() {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Default").unwrap();
    write_header(ws, &DEFAULT_HEADER);
    // Name left blank
    ws.write_number(1, 1, -5).unwrap();
    ws.write_number(1, 2, 45000).unwrap();
    ws.write_string(1, 3, "Maybe").unwrap();

    let result = pipeline().process(&to_bytes(wb)).unwrap();

    assert!(result.valid_data.is_empty());
    assert_eq!(result.message, MESSAGE_WITH_ERRORS);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].sheet, "Default");
    assert_eq!(result.errors[0].errors[0].row, 2);
    assert_eq!(
        result.errors[0].errors[0].errors,
        vec!["Name is required", "Invalid Amount value", "Invalid Verified value"]
    );
}

#[test]
fn string_dates_are_parsed() {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Default").unwrap();
    write_header(ws, &DEFAULT_HEADER);
    ws.write_string(1, 0, "Acme").unwrap();
    ws.write_number(1, 1, 1).unwrap();
    ws.write_string(1, 2, "2024-02-29 13:45:00").unwrap();
    ws.write_string(1, 3, "No").unwrap();
    ws.write_string(2, 0, "Beta").unwrap();
    ws.write_number(2, 1, 1).unwrap();
    ws.write_string(2, 2, "31/31/2024").unwrap();
    ws.write_string(2, 3, "No").unwrap();

    let result = pipeline().process(&to_bytes(wb)).unwrap();

    assert_eq!(result.valid_data.len(), 1);
    assert_eq!(
        serde_json::to_value(result.valid_data[0].get("date")).unwrap(),
        json!("2024-02-29T13:45:00.000Z")
    );
    assert_eq!(result.errors[0].errors[0].row, 3);
    assert_eq!(result.errors[0].errors[0].errors, vec!["Invalid Date value"]);
}

#[test]
fn unknown_sheet_uses_default_schema() {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("March Ledger").unwrap();
    write_header(ws, &DEFAULT_HEADER);
    ws.write_string(1, 0, "Acme").unwrap();
    ws.write_number(1, 1, 5).unwrap();
    ws.write_number(1, 2, 45000).unwrap();
    ws.write_string(1, 3, "Yes").unwrap();

    let result = pipeline().process(&to_bytes(wb)).unwrap();

    assert!(result.errors.is_empty());
    assert_eq!(result.valid_data[0].sheet_name, "March Ledger");
    assert!(result.valid_data[0].get("verified").is_some());
}

// -------------------------------------------------------------------------
// Multiple sheets
// -------------------------------------------------------------------------

#[test]
fn sheets_are_validated_in_isolation() {
    let mut wb = Workbook::new();

    let ws = wb.add_worksheet();
    ws.set_name("Default").unwrap();
    write_header(ws, &DEFAULT_HEADER);
    ws.write_string(1, 0, "Acme").unwrap();
    ws.write_number(1, 1, 0).unwrap();
    ws.write_number(1, 2, 45000).unwrap();
    ws.write_string(1, 3, "Yes").unwrap();

    let ws = wb.add_worksheet();
    ws.set_name("Invoices").unwrap();
    write_header(ws, &INVOICE_HEADER);
    ws.write_string(1, 0, "Globex").unwrap();
    ws.write_number(1, 1, 45001).unwrap();
    ws.write_number(1, 2, 250).unwrap();
    ws.write_string(1, 3, "Paid").unwrap();
    ws.write_string(2, 0, "Initech").unwrap();
    ws.write_string(2, 1, "2023-03-17").unwrap();
    ws.write_number(2, 2, 75.25).unwrap();
    ws.write_string(2, 3, "Pending").unwrap();

    let result = pipeline().process(&to_bytes(wb)).unwrap();

    assert_eq!(result.valid_data.len(), 2);
    assert!(result.valid_data.iter().all(|r| r.sheet_name == "Invoices"));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].sheet, "Default");
    assert_eq!(result.errors[0].errors[0].errors, vec!["Invalid Amount value"]);

    let json = serde_json::to_value(&result.valid_data[0]).unwrap();
    assert_eq!(json["invoiceDate"], "2023-03-16T00:00:00.000Z");
    assert_eq!(json["status"], "Paid");
    assert!(json.get("date").is_none());
}

#[test]
fn valid_data_follows_workbook_sheet_order() {
    let mut wb = Workbook::new();
    for name in ["Zeta", "Alpha"] {
        let ws = wb.add_worksheet();
        ws.set_name(name).unwrap();
        write_header(ws, &DEFAULT_HEADER);
        ws.write_string(1, 0, name).unwrap();
        ws.write_number(1, 1, 1).unwrap();
        ws.write_number(1, 2, 45000).unwrap();
        ws.write_string(1, 3, "No").unwrap();
    }

    let result = pipeline().process(&to_bytes(wb)).unwrap();

    let sheets: Vec<_> = result.valid_data.iter().map(|r| r.sheet_name.as_str()).collect();
    assert_eq!(sheets, vec!["Zeta", "Alpha"]);
}

#[test]
fn every_data_row_is_classified_exactly_once() {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    write_header(ws, &DEFAULT_HEADER);
    for i in 1..=20u32 {
        ws.write_string(i, 0, format!("row{i}")).unwrap();
        // Every third amount is negative
        let amount = if i % 3 == 0 { -1.0 } else { i as f64 };
        ws.write_number(i, 1, amount).unwrap();
        ws.write_number(i, 2, 45000).unwrap();
        ws.write_boolean(i, 3, i % 2 == 0).unwrap();
    }

    let result = pipeline().process(&to_bytes(wb)).unwrap();

    assert_eq!(result.valid_data.len() + result.rejected_rows(), 20);
    assert_eq!(result.rejected_rows(), 6);
    let rejected: Vec<u32> = result.errors[0].errors.iter().map(|e| e.row).collect();
    assert_eq!(rejected, vec![4, 7, 10, 13, 16, 19]);
}

#[test]
fn header_only_and_empty_sheets_are_not_errors() {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Default").unwrap();
    write_header(ws, &DEFAULT_HEADER);
    wb.add_worksheet().set_name("Blank").unwrap();

    let result = pipeline().process(&to_bytes(wb)).unwrap();

    assert!(result.valid_data.is_empty());
    assert!(result.errors.is_empty());
    assert_eq!(result.message, MESSAGE_ALL_VALID);
}

#[test]
fn header_on_second_row_is_not_a_header() {
    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    ws.set_name("Default").unwrap();
    for (col, title) in DEFAULT_HEADER.iter().enumerate() {
        ws.write_string(1, col as u16, *title).unwrap();
    }
    ws.write_string(2, 0, "Acme").unwrap();
    ws.write_number(2, 1, 100).unwrap();
    ws.write_number(2, 2, 45000.0).unwrap();
    ws.write_string(2, 3, "Yes").unwrap();

    let result = pipeline().process(&to_bytes(wb)).unwrap();

    assert!(result.valid_data.is_empty());
    let rows: Vec<u32> = result.errors[0].errors.iter().map(|e| e.row).collect();
    assert_eq!(rows, vec![2, 3]);
    assert!(result.errors[0].errors[1]
        .errors
        .iter()
        .all(|e| e.ends_with("is required")));
}

// -------------------------------------------------------------------------
// Schema variations
// -------------------------------------------------------------------------

#[test]
fn current_month_policy_from_schema_file() {
    let registry = SchemaRegistry::from_toml(
        r#"
[[sheets.Default.columns]]
header = "Name"
field = "name"
kind = "text"
required = true

[[sheets.Default.columns]]
header = "Date"
field = "date"
kind = "date"
required = true
constraint = { rule = "date_in_current_month" }
"#,
    )
    .unwrap();
    let pipeline = Pipeline::new(registry).with_reference_date(NaiveDate::from_ymd_opt(2023, 3, 31).unwrap());

    let mut wb = Workbook::new();
    let ws = wb.add_worksheet();
    write_header(ws, &["Name", "Date"]);
    ws.write_string(1, 0, "in march").unwrap();
    ws.write_number(1, 1, 45000).unwrap();
    ws.write_string(2, 0, "in april").unwrap();
    ws.write_number(2, 1, 45017).unwrap();

    let result = pipeline.process(&to_bytes(wb)).unwrap();

    assert_eq!(result.valid_data.len(), 1);
    assert_eq!(result.valid_data[0].get("name"), Some(&FieldValue::Text("in march".into())));
    assert_eq!(result.errors[0].errors[0].row, 3);
    assert_eq!(result.errors[0].errors[0].errors, vec!["Invalid Date value"]);
}

// -------------------------------------------------------------------------
// Malformed input
// -------------------------------------------------------------------------

#[test]
fn garbage_bytes_are_malformed() {
    let err = pipeline().process(b"definitely not a workbook").unwrap_err();
    assert!(matches!(err, IngestError::MalformedWorkbook(_)));
}

#[test]
fn empty_buffer_is_malformed() {
    let err = pipeline().process(&[]).unwrap_err();
    assert!(err.to_string().starts_with("malformed workbook"));
}
