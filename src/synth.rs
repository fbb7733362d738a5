//! Answer synthesis from retrieved context

use crate::error::{Error, Result};
use crate::generate::Generator;
use crate::retrieve::RetrievalResult;
use tracing::info;

/// Separator placed between chunk texts in the prompt context
pub const CONTEXT_SEPARATOR: &str = "\n---\n";

const INSTRUCTIONS: &str = r#"CRITICAL INSTRUCTIONS:
- Use only information explicitly stated in the context
- Synthesize insights across multiple sources when present
- Compare and contrast different approaches between entrepreneurs
- Provide specific examples and quotes
- If the context lacks information to answer fully, acknowledge what's missing

CRITICAL: DO NOT ADD ANY SOURCE REFERENCES, CITATIONS, OR SOURCES SECTIONS IN YOUR ANSWER
- Do not write [Source: Name] or similar markers
- Do not include a "Sources:" section at the end
- Do not mention sources at all in your response
- Sources are provided separately below your response"#;

/// Render the grounded prompt for `question` over `results`, in rank order
pub fn build_prompt(question: &str, results: &[RetrievalResult]) -> String {
    let context = results
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    format!(
        "You are analyzing entrepreneur biographies and podcast transcripts. \
         Answer the question using ONLY the context provided below.\n\n\
         Context from {} source(s):\n{}\n\n\
         Question: {}\n\n\
         {}\n\n\
         Answer:",
        results.len(),
        context,
        question,
        INSTRUCTIONS
    )
}

/// Produces answers grounded in retrieved chunks
pub struct Synthesizer {
    generator: Box<dyn Generator>,
}

impl Synthesizer {
    pub fn new(generator: Box<dyn Generator>) -> Self {
        Self { generator }
    }

    pub async fn synthesize(&self, question: &str, results: &[RetrievalResult]) -> Result<String> {
        if results.is_empty() {
            return Err(Error::Validation(
                "Cannot synthesize an answer without context".to_string(),
            ));
        }

        let prompt = build_prompt(question, results);
        info!(
            "Generating answer with {} from {} chunks",
            self.generator.model_name(),
            results.len()
        );
        let answer = self.generator.generate(&prompt).await?;
        Ok(answer.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::payload;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records the last prompt and answers with a fixed string
    struct RecordingGenerator {
        last_prompt: Mutex<Option<String>>,
    }

    #[async_trait]
    impl Generator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            Ok("  Both built in-house.\n".to_string())
        }

        fn model_name(&self) -> &str {
            "recording"
        }
    }

    struct SharedGenerator(std::sync::Arc<RecordingGenerator>);

    #[async_trait]
    impl Generator for SharedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.0.generate(prompt).await
        }

        fn model_name(&self) -> &str {
            self.0.model_name()
        }
    }

    fn result(text: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            text: text.to_string(),
            payload: payload("elon.md", "Elon Musk", 0),
            score,
        }
    }

    #[test]
    fn test_prompt_contains_context_in_order() {
        let prompt = build_prompt(
            "How did they integrate?",
            &[result("First chunk.", 0.9), result("Second chunk.", 0.8)],
        );
        assert!(prompt.contains("Context from 2 source(s):\nFirst chunk.\n---\nSecond chunk.\n"));
        assert!(prompt.contains("Question: How did they integrate?"));
        assert!(prompt.contains("DO NOT ADD ANY SOURCE REFERENCES"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn test_prompt_keeps_braces_verbatim() {
        let prompt = build_prompt("{context}?", &[result("literal {question} text", 0.5)]);
        assert!(prompt.contains("literal {question} text"));
        assert!(prompt.contains("Question: {context}?"));
    }

    #[tokio::test]
    async fn test_synthesize_trims_answer() {
        let generator = std::sync::Arc::new(RecordingGenerator {
            last_prompt: Mutex::new(None),
        });
        let synthesizer = Synthesizer::new(Box::new(SharedGenerator(generator.clone())));
        let answer = synthesizer
            .synthesize("Q?", &[result("Rockets.", 0.7)])
            .await
            .unwrap();
        assert_eq!(answer, "Both built in-house.");

        let prompt = generator.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Context from 1 source(s):\nRockets.\n"));
    }

    #[tokio::test]
    async fn test_synthesize_requires_context() {
        let synthesizer = Synthesizer::new(Box::new(RecordingGenerator {
            last_prompt: Mutex::new(None),
        }));
        let err = synthesizer.synthesize("Q?", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
