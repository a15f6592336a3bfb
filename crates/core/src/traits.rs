use crate::error::Result;
use crate::models::{RetrievedChunk, VectorRecord};
use async_trait::async_trait;

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Whether the backing service has enough configuration to be queried.
    /// Callers check this up front to degrade gracefully instead of failing
    /// mid-request.
    fn is_configured(&self) -> bool;

    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize>;

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>>;
}
