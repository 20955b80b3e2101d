use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sheetgate_ingest::model::Fields;
use sheetgate_ingest::{FieldValue, NormalizedRecord};

/// A record as persisted: the normalized record plus its store identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: String,
    #[serde(flatten)]
    pub record: NormalizedRecord,
    /// RFC 3339 insertion timestamp.
    pub inserted_at: String,
}

/// One page of records, newest `date` first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub data: Vec<StoredRecord>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub message: String,
    pub imported: usize,
    pub skipped: usize,
    pub inserted_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// On-disk body
// ---------------------------------------------------------------------------

/// Field value as written to the `body` column. Tagged, so a text field that
/// happens to look like a date reloads as text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub(crate) enum StoredValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Date(DateTime<Utc>),
}

impl From<&FieldValue> for StoredValue {
    fn from(value: &FieldValue) -> Self {
        match value {
            FieldValue::Text(s) => StoredValue::Text(s.clone()),
            FieldValue::Number(n) => StoredValue::Number(*n),
            FieldValue::Bool(b) => StoredValue::Bool(*b),
            FieldValue::Date(d) => StoredValue::Date(*d),
        }
    }
}

impl From<StoredValue> for FieldValue {
    fn from(value: StoredValue) -> Self {
        match value {
            StoredValue::Text(s) => FieldValue::Text(s),
            StoredValue::Number(n) => FieldValue::Number(n),
            StoredValue::Bool(b) => FieldValue::Bool(b),
            StoredValue::Date(d) => FieldValue::Date(d),
        }
    }
}

pub(crate) type StoredBody = BTreeMap<String, StoredValue>;

pub(crate) fn encode_body(fields: &Fields) -> StoredBody {
    fields.iter().map(|(k, v)| (k.clone(), v.into())).collect()
}

pub(crate) fn decode_body(body: StoredBody) -> Fields {
    body.into_iter().map(|(k, v)| (k, v.into())).collect()
}
