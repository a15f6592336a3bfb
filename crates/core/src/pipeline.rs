use crate::chunking::{chunk_text, ChunkingConfig};
use crate::embedding::Embedder;
use crate::error::{PipelineError, Result};
use crate::extract::TextExtractor;
use crate::generation::TextGenerator;
use crate::models::{
    Answer, ChunkMetadata, ComparisonReport, Document, DocumentRef, DocumentView,
    IngestionOptions, IngestionReceipt, VectorRecord,
};
use crate::store::DocumentStore;
use crate::synthesis::Synthesizer;
use crate::traits::VectorIndex;
use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub const DEFAULT_TOP_K: usize = 5;

/// Drives the document-to-answer pipeline. Ingestion is a linear sequence of
/// steps; the first failing step aborts the run and nothing reaches the
/// document store.
pub struct DocumentPipeline<X, E, V, G>
where
    X: TextExtractor,
    E: Embedder,
    V: VectorIndex,
    G: TextGenerator,
{
    extractor: X,
    embedder: E,
    index: V,
    synthesizer: Synthesizer<G>,
    store: Arc<DocumentStore>,
    options: IngestionOptions,
}

impl<X, E, V, G> DocumentPipeline<X, E, V, G>
where
    X: TextExtractor,
    E: Embedder,
    V: VectorIndex,
    G: TextGenerator,
{
    pub fn new(
        extractor: X,
        embedder: E,
        index: V,
        generator: G,
        store: Arc<DocumentStore>,
        options: IngestionOptions,
    ) -> Self {
        Self {
            extractor,
            embedder,
            index,
            synthesizer: Synthesizer::new(generator),
            store,
            options,
        }
    }

    pub async fn ingest(&self, bytes: &[u8], filename: &str) -> Result<IngestionReceipt> {
        let full_text = self.extractor.extract(bytes)?;
        info!(filename, chars = full_text.len(), "extracted document text");

        let chunks = chunk_text(&full_text, ChunkingConfig::from(self.options))?;
        info!(filename, chunk_count = chunks.len(), "chunked document");

        let document_id = Uuid::new_v4().to_string();
        let records = self
            .embed_chunks(&chunks, filename, &document_id)
            .await?;

        let written = self.index.upsert(&records).await?;
        info!(filename, written, "indexed chunk vectors");

        let analysis = self.synthesizer.summarize(&full_text).await?;
        if analysis.is_degraded() {
            warn!(filename, "summary was not well-formed json, storing degraded summary");
        }
        let (summary, key_points) = analysis.into_parts();

        let document = Document {
            document_id,
            filename: filename.to_string(),
            uploaded_at: Utc::now(),
            size_bytes: bytes.len() as u64,
            checksum: digest_bytes(bytes),
            summary,
            key_points,
            full_text,
        };
        let view = document.view();
        self.store.save(document);
        info!(filename, document_id = %view.document_id, "stored document");

        Ok(IngestionReceipt {
            document: view,
            chunk_count: chunks.len(),
        })
    }

    async fn embed_chunks(
        &self,
        chunks: &[String],
        filename: &str,
        document_id: &str,
    ) -> Result<Vec<VectorRecord>> {
        let embeddings: Vec<Vec<f32>> = stream::iter(chunks.iter())
            .map(|chunk| self.embedder.embed(chunk))
            .buffered(self.options.embed_concurrency.max(1))
            .try_collect()
            .await?;

        Ok(chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, vector)| VectorRecord {
                record_id: Uuid::new_v4().to_string(),
                vector,
                metadata: ChunkMetadata {
                    text: chunk.clone(),
                    filename: filename.to_string(),
                    document_id: document_id.to_string(),
                },
            })
            .collect())
    }

    pub async fn ask(
        &self,
        question: &str,
        document_id: Option<&str>,
        top_k: usize,
    ) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(PipelineError::InvalidArgument(
                "question is empty".to_string(),
            ));
        }

        if !self.index.is_configured() {
            return Err(PipelineError::IndexUnavailable(
                "vector index is not configured".to_string(),
            ));
        }

        let query_vector = self.embedder.embed(question).await?;
        let hits = self.index.query(&query_vector, top_k, document_id).await?;
        info!(hit_count = hits.len(), "retrieved context for question");

        let answer = self.synthesizer.answer(question, &hits).await?;
        Ok(Answer {
            answer,
            sources: hits.len(),
        })
    }

    pub async fn compare(
        &self,
        document_id_a: &str,
        document_id_b: &str,
    ) -> Result<ComparisonReport> {
        let document_a = self
            .store
            .get_by_id(document_id_a)
            .ok_or_else(|| PipelineError::NotFound(document_id_a.to_string()))?;
        let document_b = self
            .store
            .get_by_id(document_id_b)
            .ok_or_else(|| PipelineError::NotFound(document_id_b.to_string()))?;

        let analysis = self
            .synthesizer
            .compare(
                &document_a.filename,
                &document_a.full_text,
                &document_b.filename,
                &document_b.full_text,
            )
            .await?;

        Ok(ComparisonReport {
            document_a: DocumentRef {
                document_id: document_a.document_id,
                filename: document_a.filename,
            },
            document_b: DocumentRef {
                document_id: document_b.document_id,
                filename: document_b.filename,
            },
            analysis,
        })
    }

    pub fn documents(&self) -> Vec<DocumentView> {
        self.store.get_all().iter().map(Document::view).collect()
    }

    pub fn document(&self, document_id: &str) -> Result<Document> {
        self.store
            .get_by_id(document_id)
            .ok_or_else(|| PipelineError::NotFound(document_id.to_string()))
    }

    pub fn delete_document(&self, document_id: &str) -> bool {
        self.store.delete(document_id)
    }
}

fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
