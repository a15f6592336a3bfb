use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub document_id: String,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub checksum: String,
    pub summary: String,
    pub key_points: Vec<String>,
    pub full_text: String,
}

impl Document {
    pub fn view(&self) -> DocumentView {
        DocumentView {
            document_id: self.document_id.clone(),
            filename: self.filename.clone(),
            uploaded_at: self.uploaded_at,
            size_bytes: self.size_bytes,
            summary: self.summary.clone(),
            key_points: self.key_points.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentView {
    pub document_id: String,
    pub filename: String,
    pub uploaded_at: DateTime<Utc>,
    pub size_bytes: u64,
    pub summary: String,
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReceipt {
    pub document: DocumentView,
    pub chunk_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub text: String,
    pub filename: String,
    pub document_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub record_id: String,
    pub vector: Vec<f32>,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub metadata: ChunkMetadata,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub sources: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRef {
    pub document_id: String,
    pub filename: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub document_a: DocumentRef,
    pub document_b: DocumentRef,
    pub analysis: String,
}

#[derive(Debug, Clone, Copy)]
pub struct IngestionOptions {
    pub chunk_chars: usize,
    pub overlap_chars: usize,
    pub embed_concurrency: usize,
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            chunk_chars: 1_000,
            overlap_chars: 200,
            embed_concurrency: 8,
        }
    }
}
