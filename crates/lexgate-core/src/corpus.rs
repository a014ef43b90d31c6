//! Corpus documents exchanged with index backends.

use serde::{Deserialize, Serialize};

/// One searchable unit of legal text (typically a single article).
///
/// Loaded from JSON or Parquet and stored as a row of the
/// [`corpus_schema`](crate::schema::corpus::corpus_schema) Arrow schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub id: String,
    /// Index identifier the document belongs to (e.g. `es-an-boja`).
    pub index: String,
    pub jurisdiction: String,
    /// Citation label, e.g. "BOJA núm. 58, Ley 7/2021".
    pub source_label: String,
    /// Hierarchy rank label (`constitutional`, `code`, `statute`, `regulation`).
    #[serde(default)]
    pub hierarchy: Option<String>,
    /// Pinpoint within the source, e.g. "12".
    #[serde(default)]
    pub article: Option<String>,
    pub text: String,
}
