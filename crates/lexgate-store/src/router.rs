//! Hierarchical retrieval across the jurisdiction fallback chain.
//!
//! For a classified jurisdiction the router consults, in order: the
//! sub-national index (when registered), the national index, the designated
//! cross-border reference index, and the global index. Each level is a
//! separate backend call under a timeout. A failed or timed-out level is
//! recorded in the audit trail and contributes zero hits; the chain carries
//! on regardless.
//!
//! Hits are concatenated in level order with no cross-level re-ranking.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use lexgate_core::{
    ChainLevel, IndexHandle, JurisdictionCode, LevelOutcome, LevelStatus, Registry, RetrievalHit,
    RetrievalResult,
};
use tracing::{info, warn};

use crate::IndexBackend;

#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Budget for a single level's backend call.
    pub level_timeout: Duration,
    /// Maximum hits kept from one level.
    pub limit_per_level: usize,
    /// Stop after the first level that yields a hit scoring at least this.
    /// Sequential mode only.
    pub early_exit: Option<f32>,
    /// Search every level concurrently and merge in level order.
    pub parallel: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            level_timeout: Duration::from_secs(2),
            limit_per_level: 10,
            early_exit: None,
            parallel: false,
        }
    }
}

pub struct HierarchicalRouter {
    registry: Arc<Registry>,
    backend: Arc<dyn IndexBackend>,
    config: RouterConfig,
}

impl HierarchicalRouter {
    pub fn new(registry: Arc<Registry>, backend: Arc<dyn IndexBackend>) -> Self {
        Self::with_config(registry, backend, RouterConfig::default())
    }

    pub fn with_config(
        registry: Arc<Registry>,
        backend: Arc<dyn IndexBackend>,
        config: RouterConfig,
    ) -> Self {
        Self {
            registry,
            backend,
            config,
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Search the fallback chain for `jurisdiction`. Never fails.
    pub async fn retrieve(&self, query: &str, jurisdiction: &JurisdictionCode) -> RetrievalResult {
        let chain = self.registry.chain(jurisdiction);

        let levels: Vec<(LevelOutcome, Vec<RetrievalHit>)> = if self.config.parallel {
            join_all(
                chain
                    .iter()
                    .map(|(level, handle)| self.search_level(*level, handle, query)),
            )
            .await
        } else {
            let mut done = Vec::with_capacity(chain.len());
            for (level, handle) in &chain {
                let (outcome, hits) = self.search_level(*level, handle, query).await;
                let exit = self
                    .config
                    .early_exit
                    .is_some_and(|threshold| hits.iter().any(|h| h.score >= threshold));
                done.push((outcome, hits));
                if exit {
                    info!(index = %handle.id, "early exit: level met relevance threshold");
                    break;
                }
            }
            done
        };

        let mut result = RetrievalResult::default();
        for (outcome, hits) in levels {
            result.jurisdictions_tried.push(outcome.index.clone());
            result.levels.push(outcome);
            result.hits.extend(hits);
        }

        info!(
            jurisdiction = %jurisdiction,
            tried = ?result.jurisdictions_tried,
            hits = result.hits.len(),
            "retrieval complete"
        );
        result
    }

    async fn search_level(
        &self,
        level: ChainLevel,
        handle: &IndexHandle,
        query: &str,
    ) -> (LevelOutcome, Vec<RetrievalHit>) {
        let call = self
            .backend
            .search(handle, query, self.config.limit_per_level);
        let (status, hits) = match tokio::time::timeout(self.config.level_timeout, call).await {
            Ok(Ok(mut hits)) => {
                hits.truncate(self.config.limit_per_level);
                (LevelStatus::Searched { hits: hits.len() }, hits)
            }
            Ok(Err(e)) => {
                warn!(index = %handle.id, level = level.as_str(), error = %e, "index unavailable, continuing chain");
                (
                    LevelStatus::Failed {
                        reason: e.to_string(),
                    },
                    Vec::new(),
                )
            }
            Err(_) => {
                let after_ms = self.config.level_timeout.as_millis() as u64;
                warn!(index = %handle.id, level = level.as_str(), after_ms, "index timed out, continuing chain");
                (LevelStatus::TimedOut { after_ms }, Vec::new())
            }
        };

        (
            LevelOutcome {
                index: handle.id.clone(),
                level,
                status,
            },
            hits,
        )
    }
}
