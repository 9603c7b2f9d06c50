use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("could not find Facebook activity data in {0}; select a valid Facebook data export folder")]
    NoActivityRoot(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}
