// Display formatting shared by the XLSX and CSV exporters.

use chrono::{DateTime, Utc};
use sheetgate_ingest::{FieldValue, NormalizedRecord};

/// Column titles of the export sheet, in order.
pub const EXPORT_HEADER: [&str; 4] = ["Name", "Amount", "Date", "Verified"];

/// One exported line, every cell already rendered as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub name: String,
    pub amount: String,
    pub date: String,
    pub verified: String,
}

impl ExportRow {
    /// Missing fields render as empty cells.
    pub fn from_record(record: &NormalizedRecord) -> Self {
        Self {
            name: record.get("name").map(ToString::to_string).unwrap_or_default(),
            amount: match record.get("amount") {
                Some(FieldValue::Number(n)) => format_amount(*n),
                Some(other) => other.to_string(),
                None => String::new(),
            },
            date: match record.get("date") {
                Some(FieldValue::Date(d)) => format_date(d),
                Some(other) => other.to_string(),
                None => String::new(),
            },
            verified: record.get("verified").map(ToString::to_string).unwrap_or_default(),
        }
    }

    pub fn cells(&self) -> [&str; 4] {
        [&self.name, &self.amount, &self.date, &self.verified]
    }
}

/// `DD-MM-YYYY`.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Two decimals with Indian digit grouping: `1234567.891` -> `12,34,567.89`.
///
/// The last three integer digits form one group, the rest are grouped in pairs.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let grouped = if int_part.len() <= 3 {
        int_part.to_string()
    } else {
        let (head, tail) = int_part.split_at(int_part.len() - 3);
        let mut pairs: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            pairs.push(&head[start..end]);
            end = start;
        }
        pairs.reverse();
        format!("{},{}", pairs.join(","), tail)
    };

    // "-0.00" would be noise
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}
