//! Per-request data model shared by every pipeline stage.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::jurisdiction::JurisdictionCode;

/// Metadata keys that index backends stamp on every hit.
pub mod meta {
    pub const INDEX: &str = "index";
    pub const JURISDICTION: &str = "jurisdiction";
    pub const SOURCE_LABEL: &str = "source_label";
    pub const HIERARCHY: &str = "hierarchy";
    pub const ARTICLE: &str = "article";
    pub const TEXT: &str = "text";
}

/// Output of the jurisdiction classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JurisdictionClassification {
    pub primary: JurisdictionCode,
    /// In `[0, 1]`. Below [`LOW_CONFIDENCE`] means the national default was used.
    pub confidence: f32,
    /// Other matched candidates, descending score.
    pub alternatives: Vec<(JurisdictionCode, f32)>,
}

/// Confidence under which a classification is a fallback, not a detection.
pub const LOW_CONFIDENCE: f32 = 0.5;

impl JurisdictionClassification {
    pub fn is_fallback(&self) -> bool {
        self.confidence < LOW_CONFIDENCE
    }
}

/// A single document returned by one index search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub id: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl RetrievalHit {
    pub fn new(id: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            score,
            metadata: BTreeMap::new(),
        }
    }

    /// Builder-style metadata insertion, used while a backend mints the hit.
    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// String-valued metadata entry, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }

    /// Position of this hit's source in the legal hierarchy.
    pub fn authority(&self) -> Authority {
        self.meta_str(meta::HIERARCHY)
            .map(Authority::parse)
            .unwrap_or(Authority::Unranked)
    }
}

/// Rank of a source in the legal hierarchy, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Authority {
    Constitutional,
    Code,
    Statute,
    Regulation,
    Unranked,
}

impl Authority {
    /// Parse a hierarchy label. Unknown labels are [`Authority::Unranked`].
    pub fn parse(label: &str) -> Self {
        match crate::text::fold(label.trim()).as_str() {
            "constitutional" | "constitution" | "constitucion" | "constitucional" => {
                Self::Constitutional
            }
            "code" | "codigo" | "organic_law" | "ley_organica" => Self::Code,
            "statute" | "law" | "ley" | "decree_law" | "decreto_ley" => Self::Statute,
            "regulation" | "reglamento" | "decree" | "decreto" | "order" | "orden" => {
                Self::Regulation
            }
            _ => Self::Unranked,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Constitutional => "constitutional",
            Self::Code => "code",
            Self::Statute => "statute",
            Self::Regulation => "regulation",
            Self::Unranked => "unranked",
        }
    }
}

/// What happened when the router consulted one index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LevelStatus {
    Searched { hits: usize },
    Failed { reason: String },
    TimedOut { after_ms: u64 },
}

/// One entry of the retrieval audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelOutcome {
    pub index: String,
    pub level: crate::registry::ChainLevel,
    #[serde(flatten)]
    pub status: LevelStatus,
}

/// Aggregated output of the hierarchical router.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RetrievalResult {
    /// Every index consulted, in the order consulted.
    pub jurisdictions_tried: Vec<String>,
    /// Hits from all attempted levels, concatenated in level order.
    pub hits: Vec<RetrievalHit>,
    /// Per-level detail matching `jurisdictions_tried` one-to-one.
    pub levels: Vec<LevelOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "ANSWER")]
    Answer,
    #[serde(rename = "REFUSE")]
    Refuse,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answer => "ANSWER",
            Self::Refuse => "REFUSE",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quantitative risk assessment for one query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    #[serde(skip)]
    pub decision: Decision,
    pub roh_bound: f64,
    pub information_budget: f64,
    pub isr_ratio: f64,
    pub rationale: String,
    pub certificate_id: String,
}

/// Result of checking a drafted answer against citation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationValidationResult {
    pub ok: bool,
    pub matched_patterns: Vec<String>,
}

impl CitationValidationResult {
    pub fn rejected() -> Self {
        Self {
            ok: false,
            matched_patterns: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_ordering_highest_first() {
        assert!(Authority::Constitutional < Authority::Code);
        assert!(Authority::Code < Authority::Statute);
        assert!(Authority::Statute < Authority::Regulation);
        assert!(Authority::Regulation < Authority::Unranked);
    }

    #[test]
    fn authority_parses_spanish_labels() {
        assert_eq!(Authority::parse("Constitución"), Authority::Constitutional);
        assert_eq!(Authority::parse("ley"), Authority::Statute);
        assert_eq!(Authority::parse("Reglamento"), Authority::Regulation);
        assert_eq!(Authority::parse("circular"), Authority::Unranked);
    }

    #[test]
    fn hit_authority_from_metadata() {
        let hit = RetrievalHit::new("doc-1", 0.7).with_meta(meta::HIERARCHY, "code");
        assert_eq!(hit.authority(), Authority::Code);
        assert_eq!(RetrievalHit::new("doc-2", 0.7).authority(), Authority::Unranked);
    }

    #[test]
    fn risk_metrics_serialise_camel_case() {
        let assessment = RiskAssessment {
            decision: Decision::Refuse,
            roh_bound: 0.95,
            information_budget: 0.0,
            isr_ratio: 0.0,
            rationale: "REFUSE: no evidence".into(),
            certificate_id: "cert-00".into(),
        };
        let json = serde_json::to_value(&assessment).unwrap();
        assert_eq!(json["rohBound"], 0.95);
        assert_eq!(json["certificateId"], "cert-00");
        assert!(json.get("decision").is_none());
    }
}
