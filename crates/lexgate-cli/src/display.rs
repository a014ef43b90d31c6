//! Vertical card display for pipeline results and registry contents.

use lexgate_core::{
    CitationValidationResult, JurisdictionClassification, LevelStatus, Registry, RetrievalResult,
};
use lexgate_host::{FinalResponse, PipelineOutcome};

const MAX_ANSWER_CHARS: usize = 600;

// ── Public API ──

/// Print a pipeline outcome as a card grouped by stage.
pub fn print_outcome_card(outcome: &PipelineOutcome) {
    println!("=== {} ===", outcome.state());
    println!();

    print_classification(&outcome.classification);
    print_retrieval(&outcome.retrieval);

    let metrics = outcome.response.risk_metrics();
    println!("Risk");
    println!("  {:<22} {:.3} nats", "information budget", metrics.information_budget);
    println!("  {:<22} {:.3}", "ISR", metrics.isr_ratio);
    println!("  {:<22} {:.3}", "RoH bound", metrics.roh_bound);
    if !outcome.risk_signals.is_empty() {
        println!("  {:<22} {}", "risk signals", outcome.risk_signals.join(", "));
    }
    println!("  {:<22} {}", "certificate", metrics.certificate_id);
    println!();

    match &outcome.response {
        FinalResponse::Answer {
            answer,
            citations,
            validation,
            ..
        } => {
            println!("Answer");
            for line in truncate(answer, MAX_ANSWER_CHARS).lines() {
                println!("  {line}");
            }
            println!();
            println!("Citations ({}):", citations.len());
            for c in citations {
                println!("  {:<10} {:.2}  {}", c.jurisdiction, c.relevance, c.source_label);
            }
            println!("  {:<22} {}", "matched patterns", validation.matched_patterns.join(", "));
        }
        FinalResponse::Refuse {
            reason, refusal, ..
        } => {
            println!("Refusal ({refusal:?})");
            println!("  {reason}");
        }
    }
    println!();

    println!("Audit");
    for record in &outcome.audit {
        println!(
            "  {}  {:<16} {:<24} {}",
            record.timestamp.format("%H:%M:%S%.3f"),
            record.state.as_str(),
            record.resource,
            truncate(&record.detail, 80)
        );
    }
}

pub fn print_classification(c: &JurisdictionClassification) {
    println!("Classification");
    println!("  {:<22} {}", "primary", c.primary);
    println!(
        "  {:<22} {:.2}{}",
        "confidence",
        c.confidence,
        if c.is_fallback() { " (fallback)" } else { "" }
    );
    if !c.alternatives.is_empty() {
        let alts: Vec<String> = c
            .alternatives
            .iter()
            .map(|(code, score)| format!("{code} {score:.2}"))
            .collect();
        println!("  {:<22} {}", "alternatives", alts.join(", "));
    }
    println!();
}

pub fn print_validation(jurisdiction: &str, specific: bool, v: &CitationValidationResult) {
    println!("Citation check ({jurisdiction}, {} rule)", if specific { "specific" } else { "generic" });
    println!("  {:<22} {}", "ok", if v.ok { "yes" } else { "no" });
    if !v.matched_patterns.is_empty() {
        println!("  {:<22} {}", "matched", v.matched_patterns.join(", "));
    }
}

/// Print every registered jurisdiction with its retrieval chain.
pub fn print_registry(registry: &Registry) {
    println!("=== {} jurisdictions ===", registry.len());
    println!("  {:<22} {}", "default national", registry.default_national());
    println!("  {:<22} {}", "cross-border", registry.cross_border().id);
    println!("  {:<22} {}", "global", registry.global().id);
    println!();

    for j in registry.jurisdictions() {
        let source = j
            .source
            .as_ref()
            .map(|s| s.short_label().to_string())
            .unwrap_or_else(|| "-".into());
        println!("{:<8} {:<28} source: {source}", j.code.as_str(), j.name);
        let chain: Vec<String> = registry
            .chain(&j.code)
            .into_iter()
            .map(|(level, handle)| format!("{}:{}", level.as_str(), handle.id))
            .collect();
        println!("  chain: {}", chain.join(" -> "));
    }
}

// ── Section rendering ──

fn print_retrieval(r: &RetrievalResult) {
    println!("Retrieval ({} hits)", r.hits.len());
    for level in &r.levels {
        let status = match &level.status {
            LevelStatus::Searched { hits } => format!("{hits} hits"),
            LevelStatus::Failed { reason } => format!("failed: {reason}"),
            LevelStatus::TimedOut { after_ms } => format!("timed out after {after_ms} ms"),
        };
        println!("  {:<14} {:<20} {}", level.level.as_str(), level.index, status);
    }
    println!();
}

// ── Helpers ──

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("según", 10), "según");
        assert_eq!(truncate("áéíóúáéíóú", 6), "áéí...");
    }
}
