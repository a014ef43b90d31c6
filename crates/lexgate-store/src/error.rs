use thiserror::Error;

/// Failure of a single index backend call.
///
/// The router never surfaces these to callers: a failing level is recorded
/// in the audit trail and counted as zero hits.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("index {index} unavailable: {reason}")]
    Unavailable { index: String, reason: String },

    #[error("corpus schema mismatch: {0}")]
    Schema(String),

    #[error("parquet file not found: {0}")]
    ParquetNotFound(std::path::PathBuf),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "parquet")]
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[cfg(feature = "http")]
    #[error("index server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("{0}")]
    Other(String),
}
