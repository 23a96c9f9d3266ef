use ns_core::{Error, Result, SummaryModel};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_MAX_LENGTH: usize = 150;
const FALLBACK_SENTENCES: usize = 3;
// Rough characters-per-word estimate used to bound the fallback prefix.
const CHARS_PER_WORD: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMethod {
    OpenAi,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub summary: String,
    pub method: SummaryMethod,
}

/// Summarizes article text with the configured model, degrading to a
/// deterministic truncation summarizer on any model failure. Only blank
/// input is a hard error.
pub struct SummarizeService {
    model: Option<Arc<dyn SummaryModel>>,
}

impl SummarizeService {
    pub fn new(model: Option<Arc<dyn SummaryModel>>) -> Self {
        Self { model }
    }

    pub async fn summarize(&self, text: &str, max_length: Option<usize>) -> Result<Summary> {
        let max_length = max_length.unwrap_or(DEFAULT_MAX_LENGTH);
        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }

        if let Some(model) = &self.model {
            match model.summarize(text, max_length).await {
                Ok(summary) => {
                    info!("✨ Summary generated with {}", model.name());
                    return Ok(Summary {
                        summary,
                        method: SummaryMethod::OpenAi,
                    });
                }
                Err(e) => warn!("Model summarization failed, using fallback: {}", e),
            }
        }

        Ok(Summary {
            summary: fallback_summary(text, max_length),
            method: SummaryMethod::Fallback,
        })
    }
}

/// First three sentence fragments of a character-bounded prefix, rejoined
/// with periods. Can cut mid-sentence when no period appears early enough;
/// the result is always non-empty for non-empty input.
pub fn fallback_summary(text: &str, max_length: usize) -> String {
    let prefix: String = text.chars().take(max_length * CHARS_PER_WORD).collect();
    let joined = prefix
        .split('.')
        .take(FALLBACK_SENTENCES)
        .collect::<Vec<_>>()
        .join(".");
    format!("{}.", joined.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedModel {
        reply: Result<String>,
    }

    #[async_trait]
    impl SummaryModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn summarize(&self, _text: &str, _max_length: usize) -> Result<String> {
            match &self.reply {
                Ok(s) => Ok(s.clone()),
                Err(_) => Err(Error::ModelUnavailable("scripted failure".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_empty_input_is_a_hard_error() {
        let service = SummarizeService::new(None);
        assert!(matches!(
            service.summarize("  ", None).await,
            Err(Error::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_no_credential_uses_fallback() {
        let service = SummarizeService::new(None);
        let text = "First sentence. Second sentence. Third sentence. Fourth sentence.";
        let result = service.summarize(text, Some(150)).await.unwrap();

        assert_eq!(result.method, SummaryMethod::Fallback);
        assert_eq!(
            result.summary,
            "First sentence. Second sentence. Third sentence."
        );
    }

    #[tokio::test]
    async fn test_model_failure_degrades_to_fallback() {
        let model = Arc::new(FixedModel {
            reply: Err(Error::ModelUnavailable("down".to_string())),
        });
        let service = SummarizeService::new(Some(model));
        let result = service.summarize("One. Two. Three.", None).await.unwrap();
        assert_eq!(result.method, SummaryMethod::Fallback);
        assert!(!result.summary.is_empty());
    }

    #[tokio::test]
    async fn test_model_success_is_returned_verbatim() {
        let model = Arc::new(FixedModel {
            reply: Ok("A crisp model summary.".to_string()),
        });
        let service = SummarizeService::new(Some(model));
        let result = service.summarize("Some long article text.", None).await.unwrap();
        assert_eq!(result.method, SummaryMethod::OpenAi);
        assert_eq!(result.summary, "A crisp model summary.");
    }

    #[test]
    fn test_fallback_is_bounded() {
        let text = "x".repeat(5000);
        let summary = fallback_summary(&text, 150);
        // Bounded by the character prefix plus the trailing period.
        assert!(summary.len() <= 150 * 4 + 1);
        assert!(summary.ends_with('.'));
    }

    #[test]
    fn test_fallback_without_periods_truncates_mid_sentence() {
        let summary = fallback_summary("no periods here at all", 2);
        assert_eq!(summary, "no perio.");
    }
}
