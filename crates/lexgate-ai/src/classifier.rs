//! Heuristic jurisdiction classification for legal queries.
//!
//! Three independent signal families scan the query (and the optional hint)
//! and each vote for a registered jurisdiction with a family weight:
//!
//! - official bulletin mentions ("BOJA", "Diari Oficial de la Generalitat de Catalunya")
//! - place names ("Sevilla", "Euskadi")
//! - explicit codes ("ES-AN")
//!
//! Votes are combined by keeping the best score per code and sorting; the top
//! entry is the primary classification and the rest are alternatives. With no
//! votes the registry's national default is returned at low confidence.
//! Adding a jurisdiction is a registry entry, not a code change.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use lexgate_core::jurisdiction::looks_like_code;
use lexgate_core::text::{contains_phrase, fold};
use lexgate_core::{JurisdictionClassification, JurisdictionCode, JurisdictionKind, Registry};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::ClassifyError;

/// Confidence of the national default when nothing matched.
pub const FALLBACK_CONFIDENCE: f32 = 0.4;

/// Confidence given to the owning country of an unregistered code hint.
pub const UNREGISTERED_HINT_CONFIDENCE: f32 = 0.45;

/// Confidence of a hint naming a registered code.
const REGISTERED_HINT_CONFIDENCE: f32 = 1.0;

/// Bonus added to free-text signals found in the explicit hint.
const HINT_BONUS: f32 = 0.05;

static CODE_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z]{2}(?:-[A-Z0-9]{1,3})?\b").expect("code mention regex is valid")
});

/// A heuristic signal family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalFamily {
    Bulletin,
    Place,
    Code,
}

impl SignalFamily {
    /// Families in evaluation order.
    pub const ALL: [SignalFamily; 3] = [Self::Bulletin, Self::Place, Self::Code];

    /// Vote weight. Sub-national matches outrank national ones so that
    /// "Sevilla, España" lands on Andalucía.
    pub fn weight(&self, kind: JurisdictionKind) -> f32 {
        let national = kind != JurisdictionKind::SubNational;
        match (self, national) {
            (Self::Code, _) => 0.95,
            (Self::Bulletin, false) => 0.9,
            (Self::Bulletin, true) => 0.85,
            (Self::Place, false) => 0.7,
            (Self::Place, true) => 0.6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bulletin => "bulletin",
            Self::Place => "place",
            Self::Code => "code",
        }
    }

    /// Registered codes this family finds in `raw` text.
    fn matches(&self, registry: &Registry, raw: &str, folded: &str) -> Vec<JurisdictionCode> {
        match self {
            Self::Bulletin => registry
                .jurisdictions()
                .filter(|j| {
                    j.source.as_ref().is_some_and(|s| {
                        contains_phrase(folded, &fold(&s.name))
                            || s
                                .abbreviation
                                .as_ref()
                                .is_some_and(|a| contains_phrase(folded, &fold(a)))
                    })
                })
                .map(|j| j.code.clone())
                .collect(),
            Self::Place => registry
                .jurisdictions()
                .filter(|j| {
                    std::iter::once(&j.name)
                        .chain(j.places.iter())
                        .any(|p| contains_phrase(folded, &fold(p)))
                })
                .map(|j| j.code.clone())
                .collect(),
            Self::Code => CODE_MENTION
                .find_iter(raw)
                .filter(|m| m.as_str().contains('-') || !in_caps_run(raw, m.start(), m.end()))
                .filter_map(|m| registry.resolve(m.as_str()))
                .filter(|c| c.kind() != JurisdictionKind::Global)
                .collect(),
        }
    }
}

/// Whether the bare token at `start..end` sits next to another all-caps
/// word, as in a shouted query ("¿CUÁL ES EL PLAZO?"), where "ES" is prose.
fn in_caps_run(raw: &str, start: usize, end: usize) -> bool {
    let before = raw[..start].split_whitespace().next_back();
    let after = raw[end..].split_whitespace().next();
    before.is_some_and(is_caps_word) || after.is_some_and(is_caps_word)
}

fn is_caps_word(word: &str) -> bool {
    let letters: Vec<char> = word.chars().filter(|c| c.is_alphabetic()).collect();
    letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
}

/// One family's vote for one jurisdiction.
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub code: JurisdictionCode,
    pub score: f32,
    pub family: &'static str,
}

/// Stateless classifier over the shared registry.
pub struct JurisdictionClassifier {
    registry: Arc<Registry>,
}

impl JurisdictionClassifier {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Classify a query, optionally steered by an explicit hint.
    ///
    /// Fails only on an empty or whitespace-only query.
    pub fn classify(
        &self,
        query: &str,
        hint: Option<&str>,
    ) -> Result<JurisdictionClassification, ClassifyError> {
        if query.trim().is_empty() {
            return Err(ClassifyError::EmptyQuery);
        }

        let mut votes = self.hint_votes(hint);
        votes.extend(self.text_votes(query, 0.0));

        for vote in &votes {
            debug!(code = %vote.code, score = vote.score, family = vote.family, "jurisdiction vote");
        }

        let classification = self.combine(votes);
        info!(
            primary = %classification.primary,
            confidence = classification.confidence,
            alternatives = classification.alternatives.len(),
            fallback = classification.is_fallback(),
            "query classified"
        );
        Ok(classification)
    }

    /// Votes from all signal families over `text`.
    pub fn text_votes(&self, text: &str, bonus: f32) -> Vec<Vote> {
        let folded = fold(text);
        let mut votes = Vec::new();
        for family in SignalFamily::ALL {
            for code in family.matches(&self.registry, text, &folded) {
                let score = (family.weight(code.kind()) + bonus).min(1.0);
                votes.push(Vote {
                    code,
                    score,
                    family: family.as_str(),
                });
            }
        }
        votes
    }

    fn hint_votes(&self, hint: Option<&str>) -> Vec<Vote> {
        let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) else {
            return Vec::new();
        };

        if let Some(code) = self.registry.resolve(hint) {
            return vec![Vote {
                code,
                score: REGISTERED_HINT_CONFIDENCE,
                family: "hint",
            }];
        }

        if looks_like_code(hint) {
            warn!(hint, "hint names an unregistered jurisdiction code");
            let country = hint.split('-').next().unwrap_or_default();
            return self
                .registry
                .resolve(country)
                .map(|code| Vote {
                    code,
                    score: UNREGISTERED_HINT_CONFIDENCE,
                    family: "hint",
                })
                .into_iter()
                .collect();
        }

        self.text_votes(hint, HINT_BONUS)
    }

    fn combine(&self, votes: Vec<Vote>) -> JurisdictionClassification {
        let mut best: BTreeMap<JurisdictionCode, f32> = BTreeMap::new();
        for vote in votes {
            let entry = best.entry(vote.code).or_insert(0.0);
            if vote.score > *entry {
                *entry = vote.score;
            }
        }

        let mut ranked: Vec<(JurisdictionCode, f32)> = best.into_iter().collect();
        // Stable sort over code-ordered input: ties resolve by code.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let mut ranked = ranked.into_iter();
        match ranked.next() {
            Some((primary, confidence)) => JurisdictionClassification {
                primary,
                confidence: confidence.clamp(0.0, 1.0),
                alternatives: ranked.collect(),
            },
            None => JurisdictionClassification {
                primary: self.registry.default_national().clone(),
                confidence: FALLBACK_CONFIDENCE,
                alternatives: Vec::new(),
            },
        }
    }
}
