use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored body could not be encoded or decoded.
    #[error("record encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// The id is not in the store's id format.
    #[error("invalid record id '{0}'")]
    InvalidId(String),

    #[error("no valid data to import")]
    NoData,
}
