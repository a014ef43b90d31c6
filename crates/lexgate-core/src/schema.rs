/// Arrow schema definitions for the searchable legal corpus.
pub mod corpus {
    use arrow::datatypes::{DataType, Field, Schema};

    pub const ID: &str = "id";
    pub const INDEX: &str = "index";
    pub const JURISDICTION: &str = "jurisdiction";
    pub const SOURCE_LABEL: &str = "source_label";
    pub const HIERARCHY: &str = "hierarchy";
    pub const ARTICLE: &str = "article";
    pub const TEXT: &str = "text";

    /// Schema for corpus documents, one row per article-level unit.
    pub fn corpus_schema() -> Schema {
        Schema::new(vec![
            Field::new(ID, DataType::Utf8, false),
            Field::new(INDEX, DataType::Utf8, false),
            Field::new(JURISDICTION, DataType::Utf8, false),
            Field::new(SOURCE_LABEL, DataType::Utf8, false),
            Field::new(HIERARCHY, DataType::Utf8, true),
            Field::new(ARTICLE, DataType::Utf8, true),
            Field::new(TEXT, DataType::Utf8, false),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::corpus;

    #[test]
    fn corpus_schema_has_expected_fields() {
        let schema = corpus::corpus_schema();
        assert_eq!(schema.fields().len(), 7);
        assert!(schema.field_with_name(corpus::TEXT).is_ok());
        assert!(schema.field_with_name(corpus::HIERARCHY).unwrap().is_nullable());
        assert!(!schema.field_with_name(corpus::INDEX).unwrap().is_nullable());
    }
}
