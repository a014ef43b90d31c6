//! Detection of high-risk compliance phrasing in queries.
//!
//! A query asking how to evade taxes or operate without a licence needs more
//! evidence before an answer is allowed. Each detected signal carries a
//! penalty on the information budget and an increment on the RoH bound.

use lexgate_core::text::{contains_phrase, fold};

/// One detected risk signal.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainSignal {
    pub label: &'static str,
    /// Subtracted from the information budget (nats).
    pub budget_penalty: f64,
    /// Added to the RoH bound before clamping.
    pub roh_increment: f64,
}

struct SignalRule {
    label: &'static str,
    phrases: &'static [&'static str],
    budget_penalty: f64,
    roh_increment: f64,
}

/// Rules in detection order. Phrases are written pre-folded.
const RULES: &[SignalRule] = &[
    SignalRule {
        label: "tax_evasion",
        phrases: &[
            "evadir impuestos",
            "evasion fiscal",
            "defraudar a hacienda",
            "no declarar ingresos",
            "evade taxes",
            "tax evasion",
        ],
        budget_penalty: 1.5,
        roh_increment: 0.10,
    },
    SignalRule {
        label: "money_laundering",
        phrases: &[
            "blanquear dinero",
            "blanqueo de capitales",
            "launder money",
            "money laundering",
        ],
        budget_penalty: 2.0,
        roh_increment: 0.15,
    },
    SignalRule {
        label: "unlicensed_activity",
        phrases: &[
            "sin licencia",
            "sin permiso",
            "without a licence",
            "without a license",
            "unlicensed",
        ],
        budget_penalty: 0.75,
        roh_increment: 0.05,
    },
    SignalRule {
        label: "inspection_avoidance",
        phrases: &[
            "evitar una inspeccion",
            "evitar la inspeccion",
            "esquivar la inspeccion",
            "ocultar a la inspeccion",
            "avoid an inspection",
            "avoid inspection",
        ],
        budget_penalty: 1.0,
        roh_increment: 0.08,
    },
];

/// Stateless phrase-rule detector.
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskSignalDetector;

impl RiskSignalDetector {
    /// Signals present in `query`, at most one per rule, in rule order.
    pub fn detect(&self, query: &str) -> Vec<DomainSignal> {
        let folded = fold(query);
        RULES
            .iter()
            .filter(|rule| rule.phrases.iter().any(|p| contains_phrase(&folded, p)))
            .map(|rule| DomainSignal {
                label: rule.label,
                budget_penalty: rule.budget_penalty,
                roh_increment: rule.roh_increment,
            })
            .collect()
    }
}
