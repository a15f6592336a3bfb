use crate::error::Result;
use crate::generation::TextGenerator;
use crate::models::RetrievedChunk;
use serde::Deserialize;

pub const NO_CONTEXT_ANSWER: &str = "I couldn't find relevant information to answer your question. Please try rephrasing or ensure the document has been uploaded.";

const SUMMARY_INPUT_CHARS: usize = 8_000;
const COMPARE_INPUT_CHARS: usize = 6_000;
const FALLBACK_SUMMARY_CHARS: usize = 200;
const FALLBACK_KEY_POINT: &str = "Analysis pending";

/// Outcome of a summarization call. `Degraded` means the model replied but
/// not with parseable JSON; the upload still succeeds with a truncated
/// summary and a placeholder key point.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentAnalysis {
    Parsed {
        summary: String,
        key_points: Vec<String>,
    },
    Degraded {
        summary: String,
        key_points: Vec<String>,
    },
}

impl DocumentAnalysis {
    pub fn is_degraded(&self) -> bool {
        matches!(self, DocumentAnalysis::Degraded { .. })
    }

    pub fn into_parts(self) -> (String, Vec<String>) {
        match self {
            DocumentAnalysis::Parsed {
                summary,
                key_points,
            }
            | DocumentAnalysis::Degraded {
                summary,
                key_points,
            } => (summary, key_points),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    summary: String,
    #[serde(rename = "keyPoints")]
    key_points: Vec<String>,
}

pub struct Synthesizer<G: TextGenerator> {
    generator: G,
}

impl<G: TextGenerator> Synthesizer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub async fn summarize(&self, full_text: &str) -> Result<DocumentAnalysis> {
        let raw = self.generator.generate(&summary_prompt(full_text)).await?;
        Ok(parse_analysis(&raw))
    }

    pub async fn answer(&self, question: &str, context: &[RetrievedChunk]) -> Result<String> {
        let passages: Vec<&str> = context
            .iter()
            .map(|hit| hit.metadata.text.as_str())
            .filter(|text| !text.trim().is_empty())
            .collect();

        if passages.is_empty() {
            return Ok(NO_CONTEXT_ANSWER.to_string());
        }

        self.generator
            .generate(&answer_prompt(question, &passages))
            .await
    }

    pub async fn compare(
        &self,
        filename_a: &str,
        text_a: &str,
        filename_b: &str,
        text_b: &str,
    ) -> Result<String> {
        self.generator
            .generate(&compare_prompt(filename_a, text_a, filename_b, text_b))
            .await
    }
}

fn parse_analysis(raw: &str) -> DocumentAnalysis {
    match serde_json::from_str::<AnalysisPayload>(raw.trim()) {
        Ok(payload) => DocumentAnalysis::Parsed {
            summary: payload.summary,
            key_points: payload.key_points,
        },
        Err(_) => DocumentAnalysis::Degraded {
            summary: truncate_chars(raw, FALLBACK_SUMMARY_CHARS).to_string(),
            key_points: vec![FALLBACK_KEY_POINT.to_string()],
        },
    }
}

/// Truncates to at most `max_chars` characters without splitting a
/// multi-byte character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

fn summary_prompt(full_text: &str) -> String {
    format!(
        r#"You are a compliance document analyst. Analyze the following document and provide:
1. A concise summary (2-3 sentences)
2. 5-7 key points or requirements

Document:
{}

Format your response as JSON:
{{
  "summary": "your summary here",
  "keyPoints": ["point 1", "point 2", ...]
}}"#,
        truncate_chars(full_text, SUMMARY_INPUT_CHARS)
    )
}

fn answer_prompt(question: &str, passages: &[&str]) -> String {
    format!(
        r#"You are a compliance assistant specialized in analyzing workplace safety and compliance documents.

Context from the documents:
{}

Question: {}

Instructions:
- Answer ONLY based on the context provided above
- Be specific and cite relevant information from the context
- If the context doesn't contain enough information to answer, say so clearly
- Use clear, professional language
- Format your response in a structured way with bullet points if appropriate

Answer:"#,
        passages.join("\n\n"),
        question
    )
}

fn compare_prompt(filename_a: &str, text_a: &str, filename_b: &str, text_b: &str) -> String {
    format!(
        r#"You are a compliance gap analysis expert. Compare these two compliance documents and provide a detailed gap analysis.

Document A: {}
{}

Document B: {}
{}

Provide a comprehensive analysis in the following format:
1. **Missing Requirements**: List requirements present in Document B but missing in Document A
2. **Compliance Gaps**: Identify areas where Document A falls short of Document B's standards
3. **Key Differences**: Highlight major differences in approach or standards
4. **Recommendations**: Suggest specific actions to close identified gaps

Be specific and cite relevant sections where possible."#,
        filename_a,
        truncate_chars(text_a, COMPARE_INPUT_CHARS),
        filename_b,
        truncate_chars(text_b, COMPARE_INPUT_CHARS)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::models::ChunkMetadata;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeGenerator {
        response: String,
        calls: AtomicUsize,
        last_prompt: Mutex<Option<String>>,
    }

    impl FakeGenerator {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn last_prompt(&self) -> Option<String> {
            self.last_prompt.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> crate::error::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            Ok(self.response.clone())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> crate::error::Result<String> {
            Err(PipelineError::GenerationUnavailable(
                "provider down".to_string(),
            ))
        }
    }

    fn hit(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            metadata: ChunkMetadata {
                text: text.to_string(),
                filename: "doc.pdf".to_string(),
                document_id: "doc-1".to_string(),
            },
            score: 0.9,
        }
    }

    #[tokio::test]
    async fn well_formed_analysis_is_parsed() {
        let generator = FakeGenerator::new(
            r#"{"summary": "Covers ladder safety.", "keyPoints": ["Inspect ladders", "Report damage"]}"#,
        );
        let synthesizer = Synthesizer::new(generator);

        let analysis = synthesizer.summarize("full document text").await.unwrap();
        assert_eq!(
            analysis,
            DocumentAnalysis::Parsed {
                summary: "Covers ladder safety.".to_string(),
                key_points: vec!["Inspect ladders".to_string(), "Report damage".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn malformed_analysis_falls_back_to_degraded() {
        let raw: String = "The document describes ".repeat(20);
        let generator = FakeGenerator::new(&raw);
        let synthesizer = Synthesizer::new(generator);

        let analysis = synthesizer.summarize("full document text").await.unwrap();
        assert!(analysis.is_degraded());

        let (summary, key_points) = analysis.into_parts();
        assert_eq!(summary.chars().count(), 200);
        assert!(raw.starts_with(&summary));
        assert_eq!(key_points, vec!["Analysis pending".to_string()]);
    }

    #[tokio::test]
    async fn generation_failure_during_summarize_propagates() {
        let synthesizer = Synthesizer::new(FailingGenerator);
        let result = synthesizer.summarize("full document text").await;
        assert!(matches!(
            result,
            Err(PipelineError::GenerationUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn empty_context_answer_skips_generation() {
        let generator = FakeGenerator::new("should never be used");
        let synthesizer = Synthesizer::new(generator);

        let answer = synthesizer.answer("What is required?", &[]).await.unwrap();
        assert_eq!(answer, NO_CONTEXT_ANSWER);
        assert_eq!(synthesizer.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn blank_context_also_short_circuits() {
        let generator = FakeGenerator::new("should never be used");
        let synthesizer = Synthesizer::new(generator);

        let answer = synthesizer
            .answer("What is required?", &[hit("   "), hit("")])
            .await
            .unwrap();
        assert_eq!(answer, NO_CONTEXT_ANSWER);
        assert_eq!(synthesizer.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn answer_prompt_embeds_context_and_question() {
        let generator = FakeGenerator::new("Hard hats are mandatory on site.");
        let synthesizer = Synthesizer::new(generator);

        let answer = synthesizer
            .answer(
                "Are hard hats required?",
                &[hit("Section 3: hard hats must be worn in work areas.")],
            )
            .await
            .unwrap();

        assert_eq!(answer, "Hard hats are mandatory on site.");
        let prompt = synthesizer.generator.last_prompt().unwrap();
        assert!(prompt.contains("Section 3: hard hats must be worn in work areas."));
        assert!(prompt.contains("Question: Are hard hats required?"));
        assert!(prompt.contains("Answer ONLY based on the context"));
    }

    #[tokio::test]
    async fn compare_prompt_names_both_files_and_truncates() {
        let generator = FakeGenerator::new("analysis");
        let synthesizer = Synthesizer::new(generator);

        let text_a = "a".repeat(7_000);
        let text_b = "b".repeat(500);
        synthesizer
            .compare("policy-2024.pdf", &text_a, "policy-2025.pdf", &text_b)
            .await
            .unwrap();

        let prompt = synthesizer.generator.last_prompt().unwrap();
        assert!(prompt.contains("Document A: policy-2024.pdf"));
        assert!(prompt.contains("Document B: policy-2025.pdf"));
        assert!(prompt.contains(&"a".repeat(6_000)));
        assert!(!prompt.contains(&"a".repeat(6_001)));
    }

    #[test]
    fn truncation_respects_character_boundaries() {
        let text = "überall käse";
        assert_eq!(truncate_chars(text, 6), "überal");
        assert_eq!(truncate_chars(text, 100), text);
    }
}
