use crate::error::{PipelineError, Result};
use crate::models::{RetrievedChunk, VectorRecord};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use std::sync::RwLock;

/// In-process cosine-similarity index. Backs single-process sessions where no
/// remote vector database is configured, and the test suite.
#[derive(Default)]
pub struct MemoryVectorIndex {
    records: RwLock<Vec<VectorRecord>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .map(|records| records.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn cosine_similarity(left: &[f32], right: &[f32]) -> f64 {
    let dot: f64 = left
        .iter()
        .zip(right)
        .map(|(a, b)| f64::from(*a) * f64::from(*b))
        .sum();
    let norm_left: f64 = left.iter().map(|a| f64::from(*a).powi(2)).sum::<f64>().sqrt();
    let norm_right: f64 = right
        .iter()
        .map(|b| f64::from(*b).powi(2))
        .sum::<f64>()
        .sqrt();

    if norm_left == 0.0 || norm_right == 0.0 {
        return 0.0;
    }

    dot / (norm_left * norm_right)
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    fn is_configured(&self) -> bool {
        true
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        let mut stored = self
            .records
            .write()
            .map_err(|_| PipelineError::IndexUnavailable("index lock poisoned".to_string()))?;

        for record in records {
            match stored
                .iter_mut()
                .find(|existing| existing.record_id == record.record_id)
            {
                Some(existing) => *existing = record.clone(),
                None => stored.push(record.clone()),
            }
        }

        Ok(records.len())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>> {
        let stored = self
            .records
            .read()
            .map_err(|_| PipelineError::IndexUnavailable("index lock poisoned".to_string()))?;

        let mut scored: Vec<RetrievedChunk> = stored
            .iter()
            .filter(|record| {
                document_id.map_or(true, |wanted| record.metadata.document_id == wanted)
            })
            .map(|record| RetrievedChunk {
                metadata: record.metadata.clone(),
                score: cosine_similarity(&record.vector, vector),
            })
            .collect();

        // Stable sort keeps insertion order for tied scores.
        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(top_k);

        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryVectorIndex;
    use crate::models::{ChunkMetadata, VectorRecord};
    use crate::traits::VectorIndex;

    fn record(record_id: &str, document_id: &str, vector: Vec<f32>) -> VectorRecord {
        VectorRecord {
            record_id: record_id.to_string(),
            vector,
            metadata: ChunkMetadata {
                text: format!("text for {record_id}"),
                filename: "doc.pdf".to_string(),
                document_id: document_id.to_string(),
            },
        }
    }

    #[tokio::test]
    async fn query_respects_top_k() {
        let index = MemoryVectorIndex::new();
        let records: Vec<VectorRecord> = (0..10)
            .map(|i| record(&format!("rec-{i}"), "doc-1", vec![1.0, i as f32]))
            .collect();
        index.upsert(&records).await.unwrap();

        let hits = index.query(&[1.0, 0.5], 3, None).await.unwrap();
        assert_eq!(hits.len(), 3);

        let all = index.query(&[1.0, 0.5], 100, None).await.unwrap();
        assert_eq!(all.len(), 10);
    }

    #[tokio::test]
    async fn filtered_query_only_returns_the_requested_document() {
        let index = MemoryVectorIndex::new();
        index
            .upsert(&[
                record("rec-a", "doc-a", vec![1.0, 0.0]),
                record("rec-b", "doc-b", vec![1.0, 0.1]),
                record("rec-c", "doc-a", vec![0.9, 0.0]),
            ])
            .await
            .unwrap();

        let hits = index.query(&[1.0, 0.0], 10, Some("doc-a")).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|hit| hit.metadata.document_id == "doc-a"));
    }

    #[tokio::test]
    async fn results_are_ordered_by_descending_similarity() {
        let index = MemoryVectorIndex::new();
        index
            .upsert(&[
                record("far", "doc-1", vec![0.0, 1.0]),
                record("near", "doc-1", vec![1.0, 0.0]),
                record("middle", "doc-1", vec![1.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = index.query(&[1.0, 0.0], 3, None).await.unwrap();
        let order: Vec<&str> = hits
            .iter()
            .map(|hit| hit.metadata.text.as_str())
            .collect();
        assert_eq!(
            order,
            vec!["text for near", "text for middle", "text for far"]
        );
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[tokio::test]
    async fn upsert_replaces_records_with_the_same_id() {
        let index = MemoryVectorIndex::new();
        index
            .upsert(&[record("rec-1", "doc-1", vec![1.0, 0.0])])
            .await
            .unwrap();
        index
            .upsert(&[record("rec-1", "doc-2", vec![0.0, 1.0])])
            .await
            .unwrap();

        assert_eq!(index.len(), 1);
        let hits = index.query(&[0.0, 1.0], 1, None).await.unwrap();
        assert_eq!(hits[0].metadata.document_id, "doc-2");
    }

    #[tokio::test]
    async fn empty_upsert_returns_zero() {
        let index = MemoryVectorIndex::new();
        assert_eq!(index.upsert(&[]).await.unwrap(), 0);
        assert!(index.is_empty());
    }
}
