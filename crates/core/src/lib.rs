pub mod chunking;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod models;
pub mod pipeline;
pub mod store;
pub mod stores;
pub mod synthesis;
pub mod traits;

pub use chunking::{chunk_text, ChunkingConfig};
pub use embedding::{
    CharCodeEmbedder, Embedder, VoyageEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_VOYAGE_ENDPOINT,
};
pub use error::{PipelineError, Result};
pub use extract::{discover_pdf_files, LopdfExtractor, TextExtractor};
pub use generation::{
    AnthropicGenerator, TextGenerator, DEFAULT_ANTHROPIC_ENDPOINT, DEFAULT_GENERATION_MODEL,
};
pub use models::{
    Answer, ChunkMetadata, ComparisonReport, Document, DocumentRef, DocumentView,
    IngestionOptions, IngestionReceipt, RetrievedChunk, VectorRecord,
};
pub use pipeline::{DocumentPipeline, DEFAULT_TOP_K};
pub use store::DocumentStore;
pub use stores::{MemoryVectorIndex, QdrantIndex};
pub use synthesis::{DocumentAnalysis, Synthesizer, NO_CONTEXT_ANSWER};
pub use traits::VectorIndex;
