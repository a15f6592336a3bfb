use crate::error::{PipelineError, Result};
use crate::models::{ChunkMetadata, RetrievedChunk, VectorRecord};
use crate::traits::VectorIndex;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};

pub struct QdrantIndex {
    endpoint: String,
    collection: String,
    api_key: Option<String>,
    vector_size: usize,
    client: Client,
}

impl QdrantIndex {
    pub fn new(
        endpoint: impl Into<String>,
        collection: impl Into<String>,
        api_key: Option<String>,
        vector_size: usize,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            collection: collection.into(),
            api_key,
            vector_size,
            client: Client::new(),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(api_key) if !api_key.trim().is_empty() => {
                builder.header("api-key", api_key.trim())
            }
            _ => builder,
        }
    }

    pub async fn ensure_collection(&self) -> Result<()> {
        if !self.is_configured() {
            return Err(PipelineError::IndexUnavailable(
                "vector index is not configured".to_string(),
            ));
        }

        let response = self
            .authorized(self.client.put(format!(
                "{}/collections/{}",
                self.endpoint, self.collection
            )))
            .json(&json!({
                "vectors": {
                    "size": self.vector_size,
                    "distance": "Cosine",
                }
            }))
            .send()
            .await
            .map_err(|error| PipelineError::IndexUnavailable(error.to_string()))?;

        // Conflict means the collection already exists.
        if response.status().is_success() || response.status() == StatusCode::CONFLICT {
            return Ok(());
        }

        Err(PipelineError::IndexUnavailable(format!(
            "qdrant collection setup returned {}",
            response.status()
        )))
    }
}

pub(crate) fn document_filter(document_id: &str) -> Value {
    json!({
        "must": [
            {"key": "document_id", "match": {"value": document_id}}
        ]
    })
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    fn is_configured(&self) -> bool {
        !self.endpoint.trim().is_empty() && !self.collection.trim().is_empty()
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        if !self.is_configured() {
            return Err(PipelineError::IndexUnavailable(
                "vector index is not configured".to_string(),
            ));
        }

        let points = records
            .iter()
            .map(|record| {
                if record.vector.len() != self.vector_size {
                    return Err(PipelineError::IndexUnavailable(format!(
                        "record vector dimension {} does not match collection size {}",
                        record.vector.len(),
                        self.vector_size
                    )));
                }

                Ok(json!({
                    "id": record.record_id,
                    "vector": record.vector,
                    "payload": {
                        "text": record.metadata.text,
                        "filename": record.metadata.filename,
                        "document_id": record.metadata.document_id,
                    },
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        let response = self
            .authorized(self.client.put(format!(
                "{}/collections/{}/points?wait=true",
                self.endpoint, self.collection
            )))
            .json(&json!({ "points": points }))
            .send()
            .await
            .map_err(|error| PipelineError::IndexUnavailable(error.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::IndexUnavailable(format!(
                "qdrant upsert returned {}",
                response.status()
            )));
        }

        Ok(records.len())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>> {
        if !self.is_configured() {
            return Err(PipelineError::IndexUnavailable(
                "vector index is not configured".to_string(),
            ));
        }

        if vector.len() != self.vector_size {
            return Err(PipelineError::IndexUnavailable(format!(
                "query vector dimension {} does not match collection size {}",
                vector.len(),
                self.vector_size
            )));
        }

        let mut body = json!({
            "vector": vector,
            "limit": top_k,
            "with_payload": true,
        });
        if let Some(document_id) = document_id {
            body["filter"] = document_filter(document_id);
        }

        let response = self
            .authorized(self.client.post(format!(
                "{}/collections/{}/points/search",
                self.endpoint, self.collection
            )))
            .json(&body)
            .send()
            .await
            .map_err(|error| PipelineError::IndexUnavailable(error.to_string()))?;

        if !response.status().is_success() {
            return Err(PipelineError::IndexUnavailable(format!(
                "qdrant search returned {}",
                response.status()
            )));
        }

        let parsed: Value = response
            .json()
            .await
            .map_err(|error| PipelineError::IndexUnavailable(error.to_string()))?;

        let hits = parsed
            .pointer("/result")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut result = Vec::new();
        for hit in hits {
            let text = hit
                .pointer("/payload/text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let filename = hit
                .pointer("/payload/filename")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let document_id = hit
                .pointer("/payload/document_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0);

            result.push(RetrievedChunk {
                metadata: ChunkMetadata {
                    text,
                    filename,
                    document_id,
                },
                score,
            });
        }

        Ok(result)
    }
}
