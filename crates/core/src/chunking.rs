use crate::error::{PipelineError, Result};
use crate::models::IngestionOptions;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub chunk_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_chars: 1_000,
            overlap_chars: 200,
        }
    }
}

impl From<IngestionOptions> for ChunkingConfig {
    fn from(value: IngestionOptions) -> Self {
        Self {
            chunk_chars: value.chunk_chars,
            overlap_chars: value.overlap_chars,
        }
    }
}

/// Splits text into fixed-size windows of `chunk_chars` characters where
/// consecutive windows share `overlap_chars` characters at the boundary.
/// Offsets count characters, so multi-byte text never splits mid-character.
pub fn chunk_text(text: &str, config: ChunkingConfig) -> Result<Vec<String>> {
    if config.chunk_chars == 0 {
        return Err(PipelineError::InvalidChunkConfig(
            "chunk size must be positive".to_string(),
        ));
    }

    // Rejecting overlap >= chunk size keeps the step at least 1.
    if config.overlap_chars >= config.chunk_chars {
        return Err(PipelineError::InvalidChunkConfig(format!(
            "overlap {} must be smaller than chunk size {}",
            config.overlap_chars, config.chunk_chars
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    if chars.len() <= config.chunk_chars {
        return Ok(vec![text.to_string()]);
    }

    let step = config.chunk_chars - config.overlap_chars;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + config.chunk_chars).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += step;
    }

    Ok(chunks)
}
