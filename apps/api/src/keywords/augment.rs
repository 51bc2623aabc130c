//! Keyword augmentation: optional extra keyword suggestions from an external source.
//!
//! The pipeline never depends on a suggestion arriving. Every call is bounded by a
//! timeout and every failure collapses into `Augmentation::Unavailable`, after which
//! ranking proceeds on the heuristic candidates alone.
//!
//! `AppState` holds an `Arc<dyn KeywordAugmenter>`, chosen at startup from config.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::keywords::prompts::{augment_system_prompt, build_augment_prompt};
use crate::llm_client::{strip_json_fences, LlmClient};

// ────────────────────────────────────────────────────────────────────────────
// Outcome types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AugmentationUnavailable {
    #[error("no augmentation source is configured")]
    NotConfigured,

    #[error("augmentation source did not answer within {after_secs}s")]
    TimedOut { after_secs: u64 },

    #[error("augmentation source failed: {0}")]
    Failed(String),

    #[error("augmentation source returned no keywords")]
    Empty,
}

/// Result of one augmentation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Augmentation {
    Suggested(Vec<String>),
    Unavailable(AugmentationUnavailable),
}

impl Augmentation {
    /// Suggested phrases, or an empty slice when the source was unavailable.
    pub fn suggestions(&self) -> &[String] {
        match self {
            Augmentation::Suggested(keywords) => keywords,
            Augmentation::Unavailable(_) => &[],
        }
    }
}

/// What happened to augmentation during an analysis, as reported to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AugmentationStatus {
    /// Switched off for this invocation.
    Disabled,
    /// Switched on, but there was no text to augment.
    Skipped,
    Applied { suggested: usize },
    Unavailable { reason: String },
}

impl From<&Augmentation> for AugmentationStatus {
    fn from(augmentation: &Augmentation) -> Self {
        match augmentation {
            Augmentation::Suggested(keywords) => AugmentationStatus::Applied {
                suggested: keywords.len(),
            },
            Augmentation::Unavailable(reason) => AugmentationStatus::Unavailable {
                reason: reason.to_string(),
            },
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct AugmentationRequest<'a> {
    pub job_text: &'a str,
    /// Passed along for reference only.
    pub resume_text: Option<&'a str>,
    pub max_keywords: usize,
}

/// A source of extra keyword suggestions. Implement this to swap backends
/// without touching the pipeline or handlers.
#[async_trait]
pub trait KeywordAugmenter: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    async fn suggest(
        &self,
        request: &AugmentationRequest<'_>,
    ) -> Result<Vec<String>, AugmentationUnavailable>;
}

// ────────────────────────────────────────────────────────────────────────────
// Backends
// ────────────────────────────────────────────────────────────────────────────

/// Used when no API key is configured.
pub struct DisabledAugmenter;

#[async_trait]
impl KeywordAugmenter for DisabledAugmenter {
    fn name(&self) -> &'static str {
        "disabled"
    }

    async fn suggest(
        &self,
        _request: &AugmentationRequest<'_>,
    ) -> Result<Vec<String>, AugmentationUnavailable> {
        Err(AugmentationUnavailable::NotConfigured)
    }
}

/// Asks the language model for a `{"keywords": [...]}` object.
pub struct LlmKeywordAugmenter {
    llm: LlmClient,
}

impl LlmKeywordAugmenter {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl KeywordAugmenter for LlmKeywordAugmenter {
    fn name(&self) -> &'static str {
        "llm"
    }

    async fn suggest(
        &self,
        request: &AugmentationRequest<'_>,
    ) -> Result<Vec<String>, AugmentationUnavailable> {
        let prompt =
            build_augment_prompt(request.job_text, request.resume_text, request.max_keywords);
        let text = self
            .llm
            .complete(&prompt, &augment_system_prompt())
            .await
            .map_err(|e| AugmentationUnavailable::Failed(e.to_string()))?;

        let keywords = parse_suggestions(&text, request.max_keywords);
        debug!("LLM suggested {} keywords", keywords.len());
        if keywords.is_empty() {
            return Err(AugmentationUnavailable::Empty);
        }
        Ok(keywords)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Parsing
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SuggestionPayload {
    #[serde(default)]
    keywords: Vec<serde_json::Value>,
}

/// Parses model output into at most `max_keywords` phrases.
///
/// Accepts the JSON object form; anything else is split on commas and newlines
/// with list bullets trimmed. Duplicates are removed case-insensitively, first
/// occurrence wins.
pub fn parse_suggestions(text: &str, max_keywords: usize) -> Vec<String> {
    let body = strip_json_fences(text);

    let raw: Vec<String> = match serde_json::from_str::<SuggestionPayload>(body) {
        Ok(payload) => payload
            .keywords
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect(),
        Err(_) => body
            .split(|c: char| c == '\n' || c == ',')
            .map(|chunk| {
                chunk
                    .trim_matches(|c: char| matches!(c, ' ' | '\t' | '-' | '•' | '*'))
                    .to_string()
            })
            .filter(|s| s.chars().count() > 1)
            .collect(),
    };

    let mut seen = HashSet::new();
    raw.into_iter()
        .filter(|keyword| seen.insert(keyword.to_lowercase()))
        .take(max_keywords)
        .collect()
}

/// Runs one bounded augmentation call. Never fails.
pub async fn augment(
    augmenter: &dyn KeywordAugmenter,
    request: &AugmentationRequest<'_>,
    timeout: Duration,
) -> Augmentation {
    let outcome = match tokio::time::timeout(timeout, augmenter.suggest(request)).await {
        Ok(Ok(keywords)) if keywords.is_empty() => {
            Augmentation::Unavailable(AugmentationUnavailable::Empty)
        }
        Ok(Ok(keywords)) => Augmentation::Suggested(keywords),
        Ok(Err(reason)) => Augmentation::Unavailable(reason),
        Err(_) => Augmentation::Unavailable(AugmentationUnavailable::TimedOut {
            after_secs: timeout.as_secs(),
        }),
    };

    match &outcome {
        Augmentation::Unavailable(AugmentationUnavailable::NotConfigured) => {
            debug!(backend = augmenter.name(), "augmentation not configured")
        }
        Augmentation::Unavailable(reason) => {
            warn!(backend = augmenter.name(), "augmentation unavailable: {}", reason)
        }
        Augmentation::Suggested(keywords) => {
            debug!(
                backend = augmenter.name(),
                "augmentation suggested {} keywords",
                keywords.len()
            )
        }
    }
    outcome
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Returns a fixed list.
    pub(crate) struct FixedAugmenter(pub Vec<&'static str>);

    #[async_trait]
    impl KeywordAugmenter for FixedAugmenter {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn suggest(
            &self,
            _request: &AugmentationRequest<'_>,
        ) -> Result<Vec<String>, AugmentationUnavailable> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    /// Never answers within any reasonable timeout.
    pub(crate) struct StalledAugmenter;

    #[async_trait]
    impl KeywordAugmenter for StalledAugmenter {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn suggest(
            &self,
            _request: &AugmentationRequest<'_>,
        ) -> Result<Vec<String>, AugmentationUnavailable> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec!["late".to_string()])
        }
    }

    struct FailingAugmenter;

    #[async_trait]
    impl KeywordAugmenter for FailingAugmenter {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn suggest(
            &self,
            _request: &AugmentationRequest<'_>,
        ) -> Result<Vec<String>, AugmentationUnavailable> {
            Err(AugmentationUnavailable::Failed("503 from upstream".to_string()))
        }
    }

    fn request() -> AugmentationRequest<'static> {
        AugmentationRequest {
            job_text: "Rust engineer with Kafka",
            resume_text: None,
            max_keywords: 10,
        }
    }

    #[test]
    fn test_parse_json_payload() {
        let text = r#"{"keywords": ["Kubernetes", " gRPC ", "", 42, "kubernetes"]}"#;
        assert_eq!(parse_suggestions(text, 10), vec!["Kubernetes", "gRPC"]);
    }

    #[test]
    fn test_parse_fenced_json_payload() {
        let text = "```json\n{\"keywords\": [\"terraform\", \"aws\"]}\n```";
        assert_eq!(parse_suggestions(text, 10), vec!["terraform", "aws"]);
    }

    #[test]
    fn test_parse_falls_back_to_list_splitting() {
        let text = "- Kafka\n• stream processing, x\n* Kafka\n\tflink";
        assert_eq!(
            parse_suggestions(text, 10),
            vec!["Kafka", "stream processing", "flink"]
        );
    }

    #[test]
    fn test_parse_respects_limit() {
        let text = r#"{"keywords": ["a1", "b2", "c3", "d4"]}"#;
        assert_eq!(parse_suggestions(text, 2), vec!["a1", "b2"]);
        assert!(parse_suggestions(text, 0).is_empty());
    }

    #[tokio::test]
    async fn test_disabled_source_reports_not_configured() {
        let outcome = augment(&DisabledAugmenter, &request(), Duration::from_secs(1)).await;
        assert_eq!(
            outcome,
            Augmentation::Unavailable(AugmentationUnavailable::NotConfigured)
        );
        assert!(outcome.suggestions().is_empty());
    }

    #[tokio::test]
    async fn test_failure_is_carried_as_unavailable() {
        let outcome = augment(&FailingAugmenter, &request(), Duration::from_secs(1)).await;
        assert!(matches!(
            outcome,
            Augmentation::Unavailable(AugmentationUnavailable::Failed(ref msg)) if msg.contains("503")
        ));
    }

    #[tokio::test]
    async fn test_empty_suggestions_are_unavailable() {
        let outcome = augment(&FixedAugmenter(vec![]), &request(), Duration::from_secs(1)).await;
        assert_eq!(
            outcome,
            Augmentation::Unavailable(AugmentationUnavailable::Empty)
        );
    }

    #[tokio::test]
    async fn test_suggestions_pass_through() {
        let outcome = augment(
            &FixedAugmenter(vec!["kafka", "flink"]),
            &request(),
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(outcome.suggestions(), ["kafka", "flink"]);
        assert_eq!(
            AugmentationStatus::from(&outcome),
            AugmentationStatus::Applied { suggested: 2 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_source_times_out() {
        let outcome = augment(&StalledAugmenter, &request(), Duration::from_secs(20)).await;
        assert_eq!(
            outcome,
            Augmentation::Unavailable(AugmentationUnavailable::TimedOut { after_secs: 20 })
        );
        let status = serde_json::to_value(AugmentationStatus::from(&outcome)).unwrap();
        assert_eq!(status["status"], "unavailable");
        assert!(status["reason"].as_str().unwrap().contains("20s"));
    }
}
