use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("embedding provider unavailable: {0}")]
    EmbeddingUnavailable(String),

    #[error("vector index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("generation provider unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
