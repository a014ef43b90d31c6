//! Final response assembly.
//!
//! A REFUSE assessment becomes a refusal carrying the rationale; the draft is
//! never looked at. An ANSWER assessment is only honoured when the draft
//! passes citation validation for the classified jurisdiction, otherwise it
//! is downgraded to a citation refusal.

use std::sync::Arc;

use lexgate_core::jurisdiction::GLOBAL;
use lexgate_core::types::meta;
use lexgate_core::{
    CitationValidationResult, CitationValidator, Decision, JurisdictionCode, RetrievalHit,
    RiskAssessment,
};
use serde::Serialize;
use tracing::info;

/// Why a query was not answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefusalKind {
    /// The evidence gate said REFUSE.
    Risk,
    /// The evidence gate said ANSWER but the draft failed citation rules.
    Citation,
}

/// One supporting source for an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub source_label: String,
    pub jurisdiction: String,
    pub relevance: f32,
}

/// Wire shape of a pipeline response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "decision")]
pub enum FinalResponse {
    #[serde(rename = "ANSWER", rename_all = "camelCase")]
    Answer {
        answer: String,
        citations: Vec<Citation>,
        risk_metrics: RiskAssessment,
        #[serde(skip)]
        validation: CitationValidationResult,
    },
    #[serde(rename = "REFUSE", rename_all = "camelCase")]
    Refuse {
        reason: String,
        refusal: RefusalKind,
        risk_metrics: RiskAssessment,
    },
}

impl FinalResponse {
    pub fn decision(&self) -> Decision {
        match self {
            Self::Answer { .. } => Decision::Answer,
            Self::Refuse { .. } => Decision::Refuse,
        }
    }

    pub fn risk_metrics(&self) -> &RiskAssessment {
        match self {
            Self::Answer { risk_metrics, .. } | Self::Refuse { risk_metrics, .. } => risk_metrics,
        }
    }

    pub fn refusal(&self) -> Option<RefusalKind> {
        match self {
            Self::Answer { .. } => None,
            Self::Refuse { refusal, .. } => Some(*refusal),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub struct AnswerAssembler {
    validator: Arc<CitationValidator>,
    relevance_floor: f32,
}

impl AnswerAssembler {
    pub fn new(validator: Arc<CitationValidator>, relevance_floor: f32) -> Self {
        Self {
            validator,
            relevance_floor,
        }
    }

    pub fn assemble(
        &self,
        assessment: &RiskAssessment,
        hits: &[RetrievalHit],
        draft: &str,
        jurisdiction: &JurisdictionCode,
    ) -> FinalResponse {
        if assessment.decision == Decision::Refuse {
            return FinalResponse::Refuse {
                reason: assessment.rationale.clone(),
                refusal: RefusalKind::Risk,
                risk_metrics: assessment.clone(),
            };
        }

        let validation = self.validator.validate(draft, jurisdiction);
        if !validation.ok {
            info!(
                jurisdiction = %jurisdiction,
                certificate = %assessment.certificate_id,
                "draft failed citation validation, downgrading to refusal"
            );
            return FinalResponse::Refuse {
                reason: citation_reason(jurisdiction, self.validator.has_specific_rule(jurisdiction)),
                refusal: RefusalKind::Citation,
                risk_metrics: assessment.clone(),
            };
        }

        let citations = hits
            .iter()
            .filter(|h| h.score > self.relevance_floor)
            .map(|h| Citation {
                source_label: h
                    .meta_str(meta::SOURCE_LABEL)
                    .unwrap_or(h.id.as_str())
                    .to_string(),
                jurisdiction: h.meta_str(meta::JURISDICTION).unwrap_or(GLOBAL).to_string(),
                relevance: h.score,
            })
            .collect();

        FinalResponse::Answer {
            answer: draft.to_string(),
            citations,
            risk_metrics: assessment.clone(),
            validation,
        }
    }
}

fn citation_reason(jurisdiction: &JurisdictionCode, specific: bool) -> String {
    if specific {
        format!(
            "citation non-compliant for {jurisdiction}: the answer must name the official \
             bulletin and give an article, chapter or section"
        )
    } else {
        format!(
            "citation non-compliant for {jurisdiction}: the answer must give an article, \
             chapter or section, or a numbered law or decree"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexgate_core::Registry;

    fn assessment(decision: Decision) -> RiskAssessment {
        RiskAssessment {
            decision,
            roh_bound: 0.05,
            information_budget: 4.2,
            isr_ratio: 1.68,
            rationale: format!("{decision}: test rationale"),
            certificate_id: "rc-test".into(),
        }
    }

    fn setup() -> (Registry, AnswerAssembler) {
        let registry = Registry::builtin().unwrap();
        let validator = Arc::new(CitationValidator::from_registry(&registry).unwrap());
        (registry, AnswerAssembler::new(validator, 0.5))
    }

    fn hits() -> Vec<RetrievalHit> {
        vec![
            RetrievalHit::new("boja-12", 0.8)
                .with_meta(meta::JURISDICTION, "ES-AN")
                .with_meta(meta::SOURCE_LABEL, "BOJA núm. 58, Ley 7/2021"),
            RetrievalHit::new("boe-21", 0.4).with_meta(meta::JURISDICTION, "ES"),
        ]
    }

    const GOOD_DRAFT: &str =
        "Según el BOJA, Ley 7/2021, Art. 12, el plazo para resolver es de tres meses.";

    #[test]
    fn refuse_skips_validation_and_citations() {
        let (registry, asm) = setup();
        let code = registry.resolve("ES-AN").unwrap();
        let response = asm.assemble(&assessment(Decision::Refuse), &hits(), GOOD_DRAFT, &code);
        assert_eq!(response.refusal(), Some(RefusalKind::Risk));
        let FinalResponse::Refuse { reason, .. } = &response else {
            panic!("expected refusal");
        };
        assert_eq!(reason, "REFUSE: test rationale");
    }

    #[test]
    fn compliant_answer_lists_hits_above_floor() {
        let (registry, asm) = setup();
        let code = registry.resolve("ES-AN").unwrap();
        let response = asm.assemble(&assessment(Decision::Answer), &hits(), GOOD_DRAFT, &code);
        let FinalResponse::Answer {
            citations,
            validation,
            ..
        } = &response
        else {
            panic!("expected answer, got {response:?}");
        };
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].source_label, "BOJA núm. 58, Ley 7/2021");
        assert_eq!(citations[0].jurisdiction, "ES-AN");
        assert!(validation.matched_patterns.contains(&"source:BOJA".to_string()));
    }

    #[test]
    fn missing_locator_downgrades_to_citation_refusal() {
        let (registry, asm) = setup();
        let code = registry.resolve("ES-AN").unwrap();
        let draft = "Según el BOJA, el plazo para resolver es de tres meses desde la solicitud.";
        let response = asm.assemble(&assessment(Decision::Answer), &hits(), draft, &code);
        assert_eq!(response.refusal(), Some(RefusalKind::Citation));
        assert_eq!(response.decision(), Decision::Refuse);
    }

    #[test]
    fn answer_json_shape() {
        let (registry, asm) = setup();
        let code = registry.resolve("ES-AN").unwrap();
        let response = asm.assemble(&assessment(Decision::Answer), &hits(), GOOD_DRAFT, &code);
        let json: serde_json::Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
        assert_eq!(json["decision"], "ANSWER");
        assert_eq!(json["citations"][0]["sourceLabel"], "BOJA núm. 58, Ley 7/2021");
        assert_eq!(json["riskMetrics"]["certificateId"], "rc-test");
        assert!(json.get("validation").is_none());
    }

    #[test]
    fn refusal_json_shape() {
        let (registry, asm) = setup();
        let code = registry.resolve("ES-AN").unwrap();
        let response = asm.assemble(&assessment(Decision::Refuse), &[], "", &code);
        let json: serde_json::Value = serde_json::from_str(&response.to_json().unwrap()).unwrap();
        assert_eq!(json["decision"], "REFUSE");
        assert_eq!(json["refusal"], "risk");
        assert_eq!(json["riskMetrics"]["isrRatio"], 1.68);
        assert!(json.get("citations").is_none());
    }
}
