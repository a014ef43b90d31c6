//! End-to-end query pipeline.
//!
//! `RECEIVED → CLASSIFIED → RETRIEVED → RISK_ASSESSED → {ANSWERED,
//! REFUSED_RISK, REFUSED_CITATION}`. Stages run strictly in sequence; every
//! transition is stamped into the request's audit trail. The only shared
//! state is the read-only registry and validator, so one `Pipeline` serves
//! any number of concurrent requests.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lexgate_ai::{JurisdictionClassifier, RiskConfig, RiskEngine, RiskSignalDetector};
use lexgate_core::{
    CitationValidator, Decision, JurisdictionClassification, Registry, RetrievalResult,
    ValidatorConfig,
};
use lexgate_store::{HierarchicalRouter, IndexBackend, RouterConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assembler::{AnswerAssembler, FinalResponse, RefusalKind};
use crate::drafter::{Drafter, ExtractiveDrafter};
use crate::error::PipelineError;

/// Incoming question.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub jurisdiction_hint: Option<String>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            jurisdiction_hint: None,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.jurisdiction_hint = Some(hint.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Received,
    Classified,
    Retrieved,
    RiskAssessed,
    Answered,
    RefusedRisk,
    RefusedCitation,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "RECEIVED",
            Self::Classified => "CLASSIFIED",
            Self::Retrieved => "RETRIEVED",
            Self::RiskAssessed => "RISK_ASSESSED",
            Self::Answered => "ANSWERED",
            Self::RefusedRisk => "REFUSED_RISK",
            Self::RefusedCitation => "REFUSED_CITATION",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Answered | Self::RefusedRisk | Self::RefusedCitation
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pipeline-side audit entry with a host timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub state: PipelineState,
    pub resource: String,
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

/// Everything one request produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub response: FinalResponse,
    pub classification: JurisdictionClassification,
    pub retrieval: RetrievalResult,
    pub risk_signals: Vec<&'static str>,
    pub audit: Vec<AuditRecord>,
}

impl PipelineOutcome {
    /// Terminal state reached.
    pub fn state(&self) -> PipelineState {
        match self.response.refusal() {
            None => PipelineState::Answered,
            Some(RefusalKind::Risk) => PipelineState::RefusedRisk,
            Some(RefusalKind::Citation) => PipelineState::RefusedCitation,
        }
    }
}

/// Tunables for every stage.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub router: RouterConfig,
    pub risk: RiskConfig,
    pub validator: ValidatorConfig,
}

pub struct Pipeline {
    classifier: JurisdictionClassifier,
    router: HierarchicalRouter,
    detector: RiskSignalDetector,
    engine: RiskEngine,
    assembler: AnswerAssembler,
    drafter: Arc<dyn Drafter>,
}

impl Pipeline {
    /// Wire every stage over the shared registry. Fails only when the
    /// citation rules cannot be built from the registry.
    pub fn new(
        registry: Arc<Registry>,
        backend: Arc<dyn IndexBackend>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        let floor = config.risk.relevance_floor;
        let validator = Arc::new(CitationValidator::with_config(&registry, config.validator)?);
        Ok(Self {
            classifier: JurisdictionClassifier::new(Arc::clone(&registry)),
            router: HierarchicalRouter::with_config(Arc::clone(&registry), backend, config.router),
            detector: RiskSignalDetector,
            engine: RiskEngine::new(config.risk),
            assembler: AnswerAssembler::new(validator, floor),
            drafter: Arc::new(ExtractiveDrafter::new(registry, floor)),
        })
    }

    /// Replace the built-in extractive drafter.
    pub fn with_drafter(mut self, drafter: Arc<dyn Drafter>) -> Self {
        self.drafter = drafter;
        self
    }

    pub fn classifier(&self) -> &JurisdictionClassifier {
        &self.classifier
    }

    /// Run one request through every stage.
    ///
    /// Only an empty query is an error; refusals come back as `Ok`.
    pub async fn answer(&self, request: &QueryRequest) -> Result<PipelineOutcome, PipelineError> {
        let mut audit = Vec::new();
        let hint = request.jurisdiction_hint.as_deref();
        record(
            &mut audit,
            PipelineState::Received,
            "request",
            format!("{} chars, hint {}", request.query.chars().count(), hint.unwrap_or("none")),
        );

        let classification = match self.classifier.classify(&request.query, hint) {
            Ok(c) => c,
            Err(e) => {
                warn!(outcome = "invalid_input", error = %e, "request rejected");
                return Err(e.into());
            }
        };
        let jurisdiction = classification.primary.clone();
        record(
            &mut audit,
            PipelineState::Classified,
            jurisdiction.as_str(),
            format!(
                "confidence {:.2}, {} alternatives{}",
                classification.confidence,
                classification.alternatives.len(),
                if classification.is_fallback() { ", fallback" } else { "" }
            ),
        );

        let retrieval = self.router.retrieve(&request.query, &jurisdiction).await;
        record(
            &mut audit,
            PipelineState::Retrieved,
            jurisdiction.as_str(),
            format!(
                "{} hits from {}",
                retrieval.hits.len(),
                retrieval.jurisdictions_tried.join(" -> ")
            ),
        );

        let signals = self.detector.detect(&request.query);
        let assessment = self
            .engine
            .assess(&request.query, &retrieval.hits, &signals, Utc::now());
        record(
            &mut audit,
            PipelineState::RiskAssessed,
            &assessment.certificate_id,
            assessment.rationale.clone(),
        );

        let draft = if assessment.decision == Decision::Answer {
            match self.drafter.draft(&request.query, &retrieval.hits).await {
                Ok(draft) => draft,
                Err(e) => {
                    warn!(certificate = %assessment.certificate_id, error = %e, "drafter failed");
                    String::new()
                }
            }
        } else {
            String::new()
        };

        let response = self
            .assembler
            .assemble(&assessment, &retrieval.hits, &draft, &jurisdiction);

        let mut outcome = PipelineOutcome {
            response,
            classification,
            retrieval,
            risk_signals: signals.iter().map(|s| s.label).collect(),
            audit,
        };
        let state = outcome.state();
        record(
            &mut outcome.audit,
            state,
            &assessment.certificate_id,
            outcome.response.decision().to_string(),
        );

        match state {
            PipelineState::Answered => info!(
                outcome = "answered",
                jurisdiction = %jurisdiction,
                certificate = %assessment.certificate_id,
                "query answered"
            ),
            PipelineState::RefusedCitation => info!(
                outcome = "refused_citation",
                jurisdiction = %jurisdiction,
                certificate = %assessment.certificate_id,
                "query refused"
            ),
            _ => info!(
                outcome = "refused_risk",
                jurisdiction = %jurisdiction,
                certificate = %assessment.certificate_id,
                "query refused"
            ),
        }
        Ok(outcome)
    }
}

fn record(audit: &mut Vec<AuditRecord>, state: PipelineState, resource: &str, detail: String) {
    tracing::debug!(state = %state, resource, "pipeline transition");
    audit.push(AuditRecord {
        state,
        resource: resource.to_string(),
        detail,
        timestamp: Utc::now(),
    });
}
