//! Risk-gated answer decisions.
//!
//! Converts retrieval hits into three numbers and a hard AND-gate:
//!
//! - **information budget** (nats): grows with hit count, summed relevance,
//!   and the legal-hierarchy authority of each hit; risk signals subtract.
//! - **ISR**: budget over the minimum-evidence baseline; 0 with no hits.
//! - **RoH bound**: `roh_max * exp(-budget / roh_decay)` plus risk-signal
//!   increments, clamped to `[roh_min, roh_max]`.
//!
//! ANSWER requires ISR ≥ threshold, RoH ≤ ceiling, and one hit above the
//! relevance floor. Coefficients live in [`RiskConfig`].

use chrono::{DateTime, SecondsFormat, Utc};
use lexgate_core::text::fold;
use lexgate_core::{Authority, Decision, RetrievalHit, RiskAssessment};
use ring::digest::{SHA256, digest};
use tracing::info;

use crate::signals::DomainSignal;

/// Tunable coefficients and gate thresholds.
#[derive(Debug, Clone)]
pub struct RiskConfig {
    pub count_weight: f64,
    pub relevance_weight: f64,
    pub authority_weight: f64,
    /// Budget at which ISR reaches 1.0.
    pub min_evidence_budget: f64,
    pub roh_min: f64,
    pub roh_max: f64,
    pub roh_decay: f64,
    pub isr_threshold: f64,
    pub roh_ceiling: f64,
    /// At least one hit must score strictly above this.
    pub relevance_floor: f32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            count_weight: 1.0,
            relevance_weight: 2.0,
            authority_weight: 1.0,
            min_evidence_budget: 2.5,
            roh_min: 0.01,
            roh_max: 0.95,
            roh_decay: 1.2,
            isr_threshold: 1.0,
            roh_ceiling: 0.12,
            relevance_floor: 0.5,
        }
    }
}

/// Authority bonus per hit, scaled by its relevance.
fn authority_bonus(authority: Authority) -> f64 {
    match authority {
        Authority::Constitutional => 1.0,
        Authority::Code => 0.75,
        Authority::Statute => 0.5,
        Authority::Regulation => 0.25,
        Authority::Unranked => 0.0,
    }
}

/// Intermediate numbers behind a decision.
#[derive(Debug, Clone, PartialEq)]
pub struct EvidenceMetrics {
    pub hit_count: usize,
    pub mean_relevance: f64,
    pub max_relevance: f64,
    pub information_budget: f64,
    pub isr_ratio: f64,
    pub roh_bound: f64,
}

/// Which gates a set of metrics failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateFailures {
    pub isr: bool,
    pub roh: bool,
    pub relevance_floor: bool,
}

impl GateFailures {
    pub fn any(&self) -> bool {
        self.isr || self.roh || self.relevance_floor
    }

    fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.isr {
            labels.push("isr");
        }
        if self.roh {
            labels.push("roh_bound");
        }
        if self.relevance_floor {
            labels.push("relevance_floor");
        }
        labels
    }
}

pub struct RiskEngine {
    config: RiskConfig,
}

impl Default for RiskEngine {
    fn default() -> Self {
        Self::new(RiskConfig::default())
    }
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Pure fold over the hits and signals.
    pub fn metrics(&self, hits: &[RetrievalHit], signals: &[DomainSignal]) -> EvidenceMetrics {
        let c = &self.config;
        let relevances: Vec<f64> = hits.iter().map(|h| relevance(h.score)).collect();
        let n = relevances.len();
        let sum: f64 = relevances.iter().sum();
        let mean = if n == 0 { 0.0 } else { sum / n as f64 };
        let max = relevances.iter().copied().fold(0.0, f64::max);

        let authority: f64 = hits
            .iter()
            .zip(&relevances)
            .map(|(hit, r)| authority_bonus(hit.authority()) * r)
            .sum();
        let penalty: f64 = signals.iter().map(|s| s.budget_penalty).sum();

        let raw = c.count_weight * (n as f64).ln_1p()
            + c.relevance_weight * n as f64 * mean
            + c.authority_weight * authority;
        let budget = (raw - penalty).max(0.0);

        let isr = if n == 0 || c.min_evidence_budget <= 0.0 {
            0.0
        } else {
            budget / c.min_evidence_budget
        };

        let increment: f64 = signals.iter().map(|s| s.roh_increment).sum();
        let roh = (c.roh_max * (-budget / c.roh_decay).exp() + increment).clamp(c.roh_min, c.roh_max);

        EvidenceMetrics {
            hit_count: n,
            mean_relevance: mean,
            max_relevance: max,
            information_budget: budget,
            isr_ratio: isr,
            roh_bound: roh,
        }
    }

    pub fn gates(&self, metrics: &EvidenceMetrics) -> GateFailures {
        let c = &self.config;
        GateFailures {
            isr: metrics.isr_ratio < c.isr_threshold,
            roh: metrics.roh_bound > c.roh_ceiling,
            relevance_floor: metrics.max_relevance <= f64::from(c.relevance_floor),
        }
    }

    /// Assess the evidence for `query` and issue a certificate stamped `issued_at`.
    pub fn assess(
        &self,
        query: &str,
        hits: &[RetrievalHit],
        signals: &[DomainSignal],
        issued_at: DateTime<Utc>,
    ) -> RiskAssessment {
        let metrics = self.metrics(hits, signals);
        let failures = self.gates(&metrics);
        let decision = if failures.any() {
            Decision::Refuse
        } else {
            Decision::Answer
        };

        let rationale = self.rationale(decision, &metrics, &failures, signals);
        let certificate_id = certificate_id(decision, query, issued_at);

        info!(
            decision = %decision,
            hits = metrics.hit_count,
            budget = metrics.information_budget,
            isr = metrics.isr_ratio,
            roh = metrics.roh_bound,
            certificate = %certificate_id,
            "risk assessed"
        );

        RiskAssessment {
            decision,
            roh_bound: metrics.roh_bound,
            information_budget: metrics.information_budget,
            isr_ratio: metrics.isr_ratio,
            rationale,
            certificate_id,
        }
    }

    fn rationale(
        &self,
        decision: Decision,
        m: &EvidenceMetrics,
        failures: &GateFailures,
        signals: &[DomainSignal],
    ) -> String {
        let c = &self.config;
        let mut out = format!(
            "{decision}: {} hits, mean relevance {:.3}, max {:.3}; information budget {:.3} nats; \
             ISR {:.3} (needs >= {:.3}); RoH bound {:.3} (ceiling {:.3})",
            m.hit_count,
            m.mean_relevance,
            m.max_relevance,
            m.information_budget,
            m.isr_ratio,
            c.isr_threshold,
            m.roh_bound,
            c.roh_ceiling,
        );
        if !signals.is_empty() {
            let labels: Vec<&str> = signals.iter().map(|s| s.label).collect();
            out.push_str(&format!("; risk signals: {}", labels.join(", ")));
        }
        if failures.any() {
            out.push_str(&format!("; failed gates: {}", failures.labels().join(", ")));
        }
        out
    }
}

/// Scores outside `[0, 1]` (or NaN) are clamped so they cannot inflate the budget.
fn relevance(score: f32) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        f64::from(score.clamp(0.0, 1.0))
    }
}

/// Audit handle for a decision: hash of the decision, a query fingerprint, and
/// the issue time. The query itself is never embedded.
pub fn certificate_id(decision: Decision, query: &str, issued_at: DateTime<Utc>) -> String {
    let fingerprint = sha256_hex(fold(query.trim()).as_bytes());
    let material = format!(
        "{}|{}|{}",
        decision.as_str(),
        &fingerprint[..16],
        issued_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    let hash = sha256_hex(material.as_bytes());
    format!("rc-{}", &hash[..32])
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(digest(&SHA256, bytes).as_ref())
}
