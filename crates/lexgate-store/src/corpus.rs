//! In-memory corpus index over Arrow record batches.
//!
//! Documents follow [`corpus_schema`]. Rows are grouped by their `index`
//! column at construction; a search scores each row of the requested index by
//! the share of query tokens that appear in its text (accent- and
//! case-insensitive) and returns the best rows as hits.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, LargeStringArray, StringArray};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use lexgate_core::schema::corpus::{self, corpus_schema};
use lexgate_core::text::tokens;
use lexgate_core::types::meta;
use lexgate_core::{CorpusDocument, IndexHandle, RetrievalHit};
use tracing::{debug, info};

use crate::{IndexBackend, StoreError};

const REQUIRED_COLUMNS: &[&str] = &[
    corpus::ID,
    corpus::INDEX,
    corpus::JURISDICTION,
    corpus::SOURCE_LABEL,
    corpus::TEXT,
];

/// Location of one document row.
#[derive(Debug, Clone, Copy)]
struct RowRef {
    batch: usize,
    row: usize,
}

/// Arrow-backed corpus searchable by index id.
pub struct CorpusIndex {
    batches: Vec<RecordBatch>,
    rows_by_index: HashMap<String, Vec<RowRef>>,
}

impl CorpusIndex {
    /// Build from record batches with the corpus columns (Utf8 or LargeUtf8).
    pub fn from_batches(batches: Vec<RecordBatch>) -> Result<Self, StoreError> {
        let mut rows_by_index: HashMap<String, Vec<RowRef>> = HashMap::new();

        for (b, batch) in batches.iter().enumerate() {
            for name in REQUIRED_COLUMNS {
                if batch.column_by_name(name).is_none() {
                    return Err(StoreError::Schema(format!("missing '{name}' column")));
                }
            }
            let index_col = column(batch, corpus::INDEX)?;
            for row in 0..batch.num_rows() {
                let index = get_string(index_col.as_ref(), row)
                    .ok_or_else(|| StoreError::Schema(format!("null index at row {row}")))?;
                rows_by_index
                    .entry(index)
                    .or_default()
                    .push(RowRef { batch: b, row });
            }
        }

        let total: usize = batches.iter().map(|b| b.num_rows()).sum();
        info!(
            documents = total,
            indices = rows_by_index.len(),
            "corpus index ready"
        );
        Ok(Self {
            batches,
            rows_by_index,
        })
    }

    /// Build from deserialized documents.
    pub fn from_documents(docs: &[CorpusDocument]) -> Result<Self, StoreError> {
        if docs.is_empty() {
            return Self::from_batches(Vec::new());
        }
        let strings = |f: fn(&CorpusDocument) -> &str| -> ArrayRef {
            Arc::new(StringArray::from(docs.iter().map(f).collect::<Vec<_>>()))
        };
        let optional = |f: fn(&CorpusDocument) -> Option<&str>| -> ArrayRef {
            Arc::new(StringArray::from(docs.iter().map(f).collect::<Vec<_>>()))
        };

        let batch = RecordBatch::try_new(
            Arc::new(corpus_schema()),
            vec![
                strings(|d| d.id.as_str()),
                strings(|d| d.index.as_str()),
                strings(|d| d.jurisdiction.as_str()),
                strings(|d| d.source_label.as_str()),
                optional(|d| d.hierarchy.as_deref()),
                optional(|d| d.article.as_deref()),
                strings(|d| d.text.as_str()),
            ],
        )?;
        Self::from_batches(vec![batch])
    }

    /// Underlying record batches, in load order.
    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    /// Index ids that hold at least one document, sorted.
    pub fn index_ids(&self) -> BTreeSet<&str> {
        self.rows_by_index.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.rows_by_index.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn score_rows(
        &self,
        rows: &[RowRef],
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievalHit>, StoreError> {
        let wanted = tokens(query);
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(f32, RowRef, String)> = Vec::new();
        for &r in rows {
            let batch = &self.batches[r.batch];
            let text = get_string(column(batch, corpus::TEXT)?.as_ref(), r.row).unwrap_or_default();
            let found = tokens(&text).intersection(&wanted).count();
            if found == 0 {
                continue;
            }
            let id = get_string(column(batch, corpus::ID)?.as_ref(), r.row).unwrap_or_default();
            scored.push((found as f32 / wanted.len() as f32, r, id));
        }

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.2.cmp(&b.2))
        });
        scored.truncate(limit);

        Ok(scored
            .into_iter()
            .map(|(score, r, id)| self.to_hit(r, id, score))
            .collect())
    }

    fn to_hit(&self, r: RowRef, id: String, score: f32) -> RetrievalHit {
        let batch = &self.batches[r.batch];
        let mut hit = RetrievalHit::new(id, score);
        for (column_name, key) in [
            (corpus::INDEX, meta::INDEX),
            (corpus::JURISDICTION, meta::JURISDICTION),
            (corpus::SOURCE_LABEL, meta::SOURCE_LABEL),
            (corpus::HIERARCHY, meta::HIERARCHY),
            (corpus::ARTICLE, meta::ARTICLE),
            (corpus::TEXT, meta::TEXT),
        ] {
            if let Some(col) = batch.column_by_name(column_name)
                && let Some(value) = get_string(col.as_ref(), r.row)
            {
                hit = hit.with_meta(key, value);
            }
        }
        hit
    }
}

#[async_trait]
impl IndexBackend for CorpusIndex {
    async fn search(
        &self,
        index: &IndexHandle,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievalHit>, StoreError> {
        let rows = self
            .rows_by_index
            .get(&index.id)
            .ok_or_else(|| StoreError::IndexNotFound(index.id.clone()))?;
        let hits = self.score_rows(rows, query, limit)?;
        debug!(index = %index.id, hits = hits.len(), "corpus search");
        Ok(hits)
    }
}

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef, StoreError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| StoreError::Schema(format!("missing '{name}' column")))
}

/// Extract a string value from an Arrow array (handles Utf8 and LargeUtf8).
fn get_string(col: &dyn Array, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(row).to_string())
        .or_else(|| {
            col.as_any()
                .downcast_ref::<LargeStringArray>()
                .map(|arr| arr.value(row).to_string())
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use arrow::datatypes::{DataType, Field, Schema};
    use lexgate_core::Registry;

    pub(crate) fn doc(id: &str, index: &str, jurisdiction: &str, text: &str) -> CorpusDocument {
        CorpusDocument {
            id: id.into(),
            index: index.into(),
            jurisdiction: jurisdiction.into(),
            source_label: format!("{index} / {id}"),
            hierarchy: Some("statute".into()),
            article: Some("12".into()),
            text: text.into(),
        }
    }

    fn handle(id: &str) -> IndexHandle {
        let registry = Registry::builtin().unwrap();
        let code = registry.resolve("ES-AN").unwrap();
        registry
            .chain(&code)
            .into_iter()
            .map(|(_, h)| h)
            .find(|h| h.id == id)
            .unwrap()
    }

    fn sample() -> CorpusIndex {
        CorpusIndex::from_documents(&[
            doc(
                "boja-1",
                "es-an-boja",
                "ES-AN",
                "El plazo para interponer recurso de alzada será de un mes.",
            ),
            doc(
                "boja-2",
                "es-an-boja",
                "ES-AN",
                "Las licencias de obra menor se resolverán en quince días.",
            ),
            doc(
                "boe-1",
                "es-boe",
                "ES",
                "El recurso de alzada podrá interponerse en el plazo de un mes.",
            ),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn search_scores_by_query_coverage() {
        let index = sample();
        let hits = index
            .search(&handle("es-an-boja"), "plazo recurso alzada", 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "boja-1");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert_eq!(hits[0].meta_str(meta::INDEX), Some("es-an-boja"));
        assert_eq!(hits[0].meta_str(meta::JURISDICTION), Some("ES-AN"));
        assert_eq!(hits[0].meta_str(meta::ARTICLE), Some("12"));
    }

    #[tokio::test]
    async fn search_is_scoped_to_the_index() {
        let index = sample();
        let hits = index
            .search(&handle("es-boe"), "licencias de obra", 10)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn results_sorted_and_limited() {
        let index = sample();
        let hits = index
            .search(&handle("es-an-boja"), "plazo licencias obra", 10)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "boja-2");
        assert!(hits[0].score > hits[1].score);

        let one = index
            .search(&handle("es-an-boja"), "plazo licencias obra", 1)
            .await
            .unwrap();
        assert_eq!(one.len(), 1);
    }

    #[tokio::test]
    async fn unknown_index_is_an_error() {
        let index = sample();
        let result = index.search(&handle("eu-eurlex"), "plazo", 10).await;
        assert!(matches!(result, Err(StoreError::IndexNotFound(id)) if id == "eu-eurlex"));
    }

    #[test]
    fn missing_column_rejected() {
        let schema = Schema::new(vec![Field::new("id", DataType::Utf8, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec!["a"])) as ArrayRef],
        )
        .unwrap();
        assert!(matches!(
            CorpusIndex::from_batches(vec![batch]),
            Err(StoreError::Schema(_))
        ));
    }

    #[test]
    fn index_ids_listed() {
        let index = sample();
        let ids: Vec<&str> = index.index_ids().into_iter().collect();
        assert_eq!(ids, vec!["es-an-boja", "es-boe"]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn empty_corpus() {
        let index = CorpusIndex::from_documents(&[]).unwrap();
        assert!(index.is_empty());
    }
}
