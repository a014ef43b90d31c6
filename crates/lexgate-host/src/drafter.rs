//! Draft generation collaborator.
//!
//! The language-generation step lives outside this workspace; the pipeline
//! only needs `draft(query, hits) -> text`. [`ExtractiveDrafter`] is the
//! built-in stand-in: it quotes the strongest hits with their official
//! source and article so the draft can pass citation validation.

use std::sync::Arc;

use async_trait::async_trait;
use lexgate_core::types::meta;
use lexgate_core::{Registry, RetrievalHit};

#[async_trait]
pub trait Drafter: Send + Sync {
    async fn draft(&self, query: &str, hits: &[RetrievalHit]) -> anyhow::Result<String>;
}

/// Composes an answer from hit text, most relevant first.
pub struct ExtractiveDrafter {
    registry: Arc<Registry>,
    relevance_floor: f32,
    max_passages: usize,
}

impl ExtractiveDrafter {
    pub fn new(registry: Arc<Registry>, relevance_floor: f32) -> Self {
        Self {
            registry,
            relevance_floor,
            max_passages: 3,
        }
    }

    pub fn with_max_passages(mut self, max_passages: usize) -> Self {
        self.max_passages = max_passages.max(1);
        self
    }

    fn passage(&self, hit: &RetrievalHit) -> Option<String> {
        let text = hit.meta_str(meta::TEXT)?.trim();
        if text.is_empty() {
            return None;
        }

        let source = hit
            .meta_str(meta::JURISDICTION)
            .and_then(|raw| self.registry.resolve(raw))
            .and_then(|code| self.registry.source_for(&code))
            .map(|s| match &s.abbreviation {
                Some(abbr) => format!("{} ({abbr})", s.name),
                None => s.name.clone(),
            });
        let label = hit.meta_str(meta::SOURCE_LABEL);

        let mut cite = match (source, label) {
            (Some(source), Some(label)) => format!("{source}, {label}"),
            (Some(source), None) => source,
            (None, Some(label)) => label.to_string(),
            (None, None) => hit.id.clone(),
        };
        if let Some(article) = hit.meta_str(meta::ARTICLE) {
            cite.push_str(&format!(", Art. {article}"));
        }
        Some(format!("Según {cite}: {text}"))
    }
}

#[async_trait]
impl Drafter for ExtractiveDrafter {
    async fn draft(&self, _query: &str, hits: &[RetrievalHit]) -> anyhow::Result<String> {
        let mut ranked: Vec<&RetrievalHit> = hits
            .iter()
            .filter(|h| h.score > self.relevance_floor)
            .collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        let passages: Vec<String> = ranked
            .into_iter()
            .filter_map(|h| self.passage(h))
            .take(self.max_passages)
            .collect();
        if passages.is_empty() {
            anyhow::bail!("no hit above relevance floor {} carries text", self.relevance_floor);
        }
        Ok(passages.join("\n"))
    }
}
