use async_trait::async_trait;
use chrono::Utc;
use clap::{Parser, Subcommand};
use compliance_qa_core::{
    discover_pdf_files, AnthropicGenerator, CharCodeEmbedder, DocumentPipeline, DocumentStore,
    Embedder, IngestionOptions, IngestionReceipt, LopdfExtractor, MemoryVectorIndex,
    PipelineError, QdrantIndex, Result, RetrievedChunk, VectorIndex, VectorRecord,
    VoyageEmbedder, DEFAULT_ANTHROPIC_ENDPOINT, DEFAULT_EMBEDDING_DIMENSIONS,
    DEFAULT_GENERATION_MODEL, DEFAULT_VOYAGE_ENDPOINT,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "compliance-qa", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Qdrant base URL; leave empty to keep vectors in process memory.
    #[arg(long, env = "QDRANT_URL", default_value = "")]
    qdrant_url: String,

    /// Qdrant collection name.
    #[arg(long, env = "QDRANT_COLLECTION", default_value = "compliance_chunks")]
    qdrant_collection: String,

    /// Qdrant API key.
    #[arg(long, env = "QDRANT_API_KEY")]
    qdrant_api_key: Option<String>,

    /// Anthropic API key used for summaries, answers and comparisons.
    #[arg(long, env = "ANTHROPIC_API_KEY", default_value = "")]
    anthropic_api_key: String,

    /// Generation model identifier.
    #[arg(long, env = "ANTHROPIC_MODEL", default_value = DEFAULT_GENERATION_MODEL)]
    anthropic_model: String,

    /// Voyage API key; without it a deterministic local embedder is used.
    #[arg(long, env = "VOYAGE_API_KEY", default_value = "")]
    voyage_api_key: String,

    /// Voyage embedding model.
    #[arg(long, env = "VOYAGE_MODEL", default_value = "voyage-2")]
    voyage_model: String,

    /// Chunk window size in characters.
    #[arg(long, default_value = "1000")]
    chunk_chars: usize,

    /// Overlap between consecutive chunks in characters.
    #[arg(long, default_value = "200")]
    overlap_chars: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest PDF files and print their generated summaries.
    Ingest {
        /// PDF file to ingest; repeatable.
        #[arg(long)]
        file: Vec<PathBuf>,

        /// Folder scanned recursively for PDFs.
        #[arg(long)]
        folder: Option<PathBuf>,
    },
    /// Answer a question from passages retrieved out of the index.
    Ask {
        /// The question to answer.
        #[arg(long)]
        question: String,

        /// Restrict retrieval to one ingested document.
        #[arg(long)]
        doc_id: Option<String>,

        /// PDF files ingested before asking; repeatable.
        #[arg(long)]
        file: Vec<PathBuf>,

        /// Number of passages to retrieve.
        #[arg(long, default_value = "5")]
        top_k: usize,
    },
    /// Run a gap analysis between two PDFs.
    Compare {
        /// Baseline document.
        #[arg(long)]
        file_a: PathBuf,

        /// Document to compare against the baseline.
        #[arg(long)]
        file_b: PathBuf,
    },
}

enum AnyEmbedder {
    Remote(VoyageEmbedder),
    Local(CharCodeEmbedder),
}

#[async_trait]
impl Embedder for AnyEmbedder {
    fn dimensions(&self) -> usize {
        match self {
            AnyEmbedder::Remote(embedder) => embedder.dimensions(),
            AnyEmbedder::Local(embedder) => embedder.dimensions(),
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match self {
            AnyEmbedder::Remote(embedder) => embedder.embed(text).await,
            AnyEmbedder::Local(embedder) => embedder.embed(text).await,
        }
    }
}

enum AnyIndex {
    Remote(QdrantIndex),
    Memory(MemoryVectorIndex),
}

impl AnyIndex {
    async fn prepare(&self) -> Result<()> {
        match self {
            AnyIndex::Remote(index) => index.ensure_collection().await,
            AnyIndex::Memory(_) => Ok(()),
        }
    }
}

#[async_trait]
impl VectorIndex for AnyIndex {
    fn is_configured(&self) -> bool {
        match self {
            AnyIndex::Remote(index) => index.is_configured(),
            AnyIndex::Memory(index) => index.is_configured(),
        }
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<usize> {
        match self {
            AnyIndex::Remote(index) => index.upsert(records).await,
            AnyIndex::Memory(index) => index.upsert(records).await,
        }
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>> {
        match self {
            AnyIndex::Remote(index) => index.query(vector, top_k, document_id).await,
            AnyIndex::Memory(index) => index.query(vector, top_k, document_id).await,
        }
    }
}

type Pipeline = DocumentPipeline<LopdfExtractor, AnyEmbedder, AnyIndex, AnthropicGenerator>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let embedder = if cli.voyage_api_key.trim().is_empty() {
        AnyEmbedder::Local(CharCodeEmbedder::default())
    } else {
        AnyEmbedder::Remote(VoyageEmbedder::new(
            DEFAULT_VOYAGE_ENDPOINT,
            &cli.voyage_api_key,
            &cli.voyage_model,
            DEFAULT_EMBEDDING_DIMENSIONS,
        ))
    };

    let index = if cli.qdrant_url.trim().is_empty() {
        AnyIndex::Memory(MemoryVectorIndex::new())
    } else {
        AnyIndex::Remote(QdrantIndex::new(
            &cli.qdrant_url,
            &cli.qdrant_collection,
            cli.qdrant_api_key.clone(),
            embedder.dimensions(),
        ))
    };
    index.prepare().await?;

    let generator = AnthropicGenerator::new(
        DEFAULT_ANTHROPIC_ENDPOINT,
        &cli.anthropic_api_key,
        &cli.anthropic_model,
    );

    let options = IngestionOptions {
        chunk_chars: cli.chunk_chars,
        overlap_chars: cli.overlap_chars,
        ..Default::default()
    };

    let pipeline = DocumentPipeline::new(
        LopdfExtractor,
        embedder,
        index,
        generator,
        Arc::new(DocumentStore::new()),
        options,
    );

    info!(started_at = %Utc::now().to_rfc3339(), "compliance-qa boot");

    match cli.command {
        Command::Ingest { file, folder } => {
            let files = collect_files(file, folder)?;
            ingest_files(&pipeline, &files).await?;

            for view in pipeline.documents() {
                println!(
                    "{} {} ({} bytes, uploaded {})",
                    view.document_id,
                    view.filename,
                    view.size_bytes,
                    view.uploaded_at.to_rfc3339()
                );
            }
        }
        Command::Ask {
            question,
            doc_id,
            file,
            top_k,
        } => {
            if !file.is_empty() {
                ingest_files(&pipeline, &file).await?;
            }

            match pipeline.ask(&question, doc_id.as_deref(), top_k).await {
                Ok(answer) => {
                    println!("{}", answer.answer);
                    println!("sources: {}", answer.sources);
                }
                Err(PipelineError::IndexUnavailable(reason)) => {
                    println!("vector search unavailable: {reason}");
                }
                Err(error) => return Err(error.into()),
            }
        }
        Command::Compare { file_a, file_b } => {
            let receipt_a = ingest_file(&pipeline, &file_a).await?;
            let receipt_b = ingest_file(&pipeline, &file_b).await?;

            let report = pipeline
                .compare(
                    &receipt_a.document.document_id,
                    &receipt_b.document.document_id,
                )
                .await?;

            println!(
                "comparing {} against {}",
                report.document_a.filename, report.document_b.filename
            );
            println!("{}", report.analysis);
        }
    }

    Ok(())
}

fn collect_files(files: Vec<PathBuf>, folder: Option<PathBuf>) -> anyhow::Result<Vec<PathBuf>> {
    let mut all = files;

    if let Some(folder) = folder {
        all.extend(discover_pdf_files(&folder));
    }

    if all.is_empty() {
        anyhow::bail!("nothing to ingest: pass --file and/or --folder");
    }

    Ok(all)
}

async fn ingest_files(pipeline: &Pipeline, files: &[PathBuf]) -> anyhow::Result<()> {
    let mut skipped = 0usize;

    for path in files {
        match ingest_file(pipeline, path).await {
            Ok(receipt) => print_receipt(&receipt),
            Err(error) => {
                warn!(path = %path.display(), reason = %error, "skipped pdf");
                skipped += 1;
            }
        }
    }

    if skipped == files.len() {
        anyhow::bail!("all {} file(s) were skipped", skipped);
    }
    if skipped > 0 {
        println!("{skipped} file(s) skipped");
    }

    Ok(())
}

async fn ingest_file(pipeline: &Pipeline, path: &PathBuf) -> anyhow::Result<IngestionReceipt> {
    let bytes = fs::read(path)?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow::anyhow!("path has no file name: {}", path.display()))?;

    let receipt = pipeline.ingest(&bytes, filename).await?;
    Ok(receipt)
}

fn print_receipt(receipt: &IngestionReceipt) {
    println!(
        "{} ingested as {} ({} chunks)",
        receipt.document.filename, receipt.document.document_id, receipt.chunk_count
    );
    println!("  summary: {}", receipt.document.summary);
    for point in &receipt.document.key_points {
        println!("  - {point}");
    }
}
