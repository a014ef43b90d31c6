//! Storage layer: index backends (Arrow corpus, remote HTTP) and the
//! hierarchical router that walks the jurisdiction fallback chain.

mod backend;
mod corpus;
mod error;
mod router;

#[cfg(feature = "http")]
mod remote;

pub use backend::IndexBackend;
pub use corpus::CorpusIndex;
pub use error::StoreError;
pub use router::{HierarchicalRouter, RouterConfig};

#[cfg(feature = "http")]
pub use remote::RemoteIndex;

use std::path::Path;

use arrow::record_batch::RecordBatch;
use lexgate_core::CorpusDocument;
use tracing::info;

/// Read a Parquet file into Arrow RecordBatches.
#[cfg(feature = "parquet")]
pub fn read_parquet(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    if !path.exists() {
        return Err(StoreError::ParquetNotFound(path.to_path_buf()));
    }
    let file = std::fs::File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let batches: Result<Vec<RecordBatch>, _> = reader.collect();
    Ok(batches?)
}

/// Load a corpus from disk: `.parquet` files are read through Arrow (with
/// the `parquet` feature), anything else as a JSON array of documents.
pub fn load_corpus(path: &Path) -> Result<CorpusIndex, StoreError> {
    let is_parquet = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("parquet"));

    let index = if is_parquet {
        CorpusIndex::from_batches(parquet_batches(path)?)?
    } else {
        let raw = std::fs::read_to_string(path)?;
        let docs: Vec<CorpusDocument> = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Schema(format!("{}: {e}", path.display())))?;
        CorpusIndex::from_documents(&docs)?
    };

    info!(path = %path.display(), documents = index.len(), "corpus loaded");
    Ok(index)
}

#[cfg(feature = "parquet")]
fn parquet_batches(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    read_parquet(path)
}

#[cfg(not(feature = "parquet"))]
fn parquet_batches(path: &Path) -> Result<Vec<RecordBatch>, StoreError> {
    Err(StoreError::Other(format!(
        "{} is a Parquet file but parquet support is not compiled in",
        path.display()
    )))
}
