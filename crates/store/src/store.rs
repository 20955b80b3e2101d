// SQLite-backed record store

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{params, Connection};
use tracing::{debug, info};
use uuid::Uuid;

use sheetgate_ingest::{FieldValue, NormalizedRecord};

use crate::error::StoreError;
use crate::model::{decode_body, encode_body, ImportSummary, Page, StoredBody, StoredRecord};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    id TEXT PRIMARY KEY,
    sheet_name TEXT NOT NULL,
    sort_date TEXT,               -- ISO 8601 `date` field, NULL when absent
    body TEXT NOT NULL,           -- JSON object of typed field values
    inserted_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS records_sort_date ON records (sort_date);
"#;

/// Field whose value orders listings (newest first).
const SORT_FIELD: &str = "date";

// NULL sort dates sort lowest, so DESC puts undated records last.
// rowid keeps insertion order among equal dates.
const SELECT_PAGE: &str = "SELECT id, sheet_name, body, inserted_at FROM records \
     ORDER BY sort_date DESC, rowid ASC LIMIT ?1 OFFSET ?2";

const SELECT_ALL: &str = "SELECT id, sheet_name, body, inserted_at FROM records ORDER BY rowid ASC";

pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert all records in one transaction. An empty batch is rejected.
    pub fn insert_many(&mut self, records: &[NormalizedRecord]) -> Result<ImportSummary, StoreError> {
        if records.is_empty() {
            return Err(StoreError::NoData);
        }

        let inserted_at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let mut inserted_ids = Vec::with_capacity(records.len());

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO records (id, sheet_name, sort_date, body, inserted_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;

            for record in records {
                let id = Uuid::new_v4().to_string();
                let body = serde_json::to_string(&encode_body(&record.fields))?;
                let sort_date = record
                    .get(SORT_FIELD)
                    .and_then(FieldValue::as_date)
                    .map(|d| FieldValue::iso_date(&d));

                stmt.execute(params![id, record.sheet_name, sort_date, body, inserted_at])?;
                inserted_ids.push(id);
            }
        }
        tx.commit()?;

        let imported = inserted_ids.len();
        info!(imported, "records imported");

        Ok(ImportSummary {
            message: format!("Successfully imported {imported} rows"),
            imported,
            skipped: records.len() - imported,
            inserted_ids,
        })
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    /// One page of records ordered by `date`, newest first.
    ///
    /// `page` is 1-based; `page` and `limit` below 1 are treated as 1.
    pub fn page(&self, page: u32, limit: u32) -> Result<Page, StoreError> {
        let page = page.max(1);
        let limit = limit.max(1);
        let total = self.count()?;
        let offset = u64::from(page - 1) * u64::from(limit);

        let data = self.query(SELECT_PAGE, params![i64::from(limit), offset as i64])?;
        debug!(page, limit, returned = data.len(), total, "page loaded");

        Ok(Page {
            data,
            current_page: page,
            total_pages: total.div_ceil(u64::from(limit)) as u32,
            total,
        })
    }

    /// Every record in insertion order.
    pub fn all(&self) -> Result<Vec<StoredRecord>, StoreError> {
        self.query(SELECT_ALL, [])
    }

    /// Delete by id. Returns whether a record was removed; a well-formed id that
    /// matches nothing is not an error.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let id = Uuid::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))?;
        let removed = self
            .conn
            .execute("DELETE FROM records WHERE id = ?1", params![id.to_string()])?;
        debug!(%id, removed, "delete");
        Ok(removed > 0)
    }

    fn query(&self, sql: &str, args: impl rusqlite::Params) -> Result<Vec<StoredRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(args, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, sheet_name, body, inserted_at)| {
                let body: StoredBody = serde_json::from_str(&body)?;
                Ok(StoredRecord {
                    id,
                    record: NormalizedRecord {
                        sheet_name,
                        fields: decode_body(body),
                    },
                    inserted_at,
                })
            })
            .collect()
    }
}
