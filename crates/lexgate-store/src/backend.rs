//! The seam between the router and whatever actually stores documents.

use async_trait::async_trait;
use lexgate_core::{IndexHandle, RetrievalHit};

use crate::StoreError;

/// A searchable document backend.
///
/// `search` must be idempotent and side-effect-free. Implementations stamp
/// `index` and `jurisdiction` metadata on every hit they mint so downstream
/// stages can attribute evidence without consulting the router.
#[async_trait]
pub trait IndexBackend: Send + Sync {
    async fn search(
        &self,
        index: &IndexHandle,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievalHit>, StoreError>;
}
