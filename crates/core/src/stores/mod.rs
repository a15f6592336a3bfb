pub mod memory;
pub mod qdrant;

pub use memory::MemoryVectorIndex;
pub use qdrant::QdrantIndex;
