//! Keyword pipeline: tokenize → rank → match → select, with optional augmentation.
//!
//! The synchronous core (`extract_keywords`, `analyze_gap`) has no suspension
//! points and no shared mutable state. `KeywordPipeline` wraps it with the one
//! async step, the bounded augmentation call, and tags every run with an
//! `analysis_id` for logs and responses.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::keywords::augment::{
    augment, AugmentationRequest, AugmentationStatus, KeywordAugmenter,
};
use crate::keywords::coverage::CoverageResult;
use crate::keywords::gap::{analyze_gap, GapAnalysis, GapSet};
use crate::keywords::ranker::{rank_candidates, CandidateSource, RankedKeywordList};
use crate::keywords::settings::{KeywordError, KeywordSettings};
use crate::keywords::tokenizer::tokenize;

/// Ranked keywords of `raw_text`, heuristics only. Deterministic for fixed input
/// and settings; an empty text yields an empty list.
pub fn extract_keywords(
    raw_text: &str,
    settings: &KeywordSettings,
) -> Result<RankedKeywordList, KeywordError> {
    extract_keywords_with_suggestions(raw_text, &[], settings)
}

/// Ranked keywords of `raw_text` with external suggestions merged into the pool.
pub fn extract_keywords_with_suggestions(
    raw_text: &str,
    suggestions: &[String],
    settings: &KeywordSettings,
) -> Result<RankedKeywordList, KeywordError> {
    settings.validate()?;
    let stream = tokenize(raw_text, &settings.stopwords);
    Ok(rank_candidates(&stream, suggestions, settings))
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordExtraction {
    pub analysis_id: Uuid,
    pub keywords: RankedKeywordList,
    pub augmentation: AugmentationStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordAnalysis {
    pub analysis_id: Uuid,
    pub keywords: RankedKeywordList,
    pub coverage: CoverageResult,
    pub coverage_ratio: f64,
    /// Plain keyword strings, rank-ordered, ready for injection.
    pub gap: GapSet,
    pub augmentation: AugmentationStatus,
}

/// Shared across requests. Per-request configuration travels in `KeywordSettings`.
#[derive(Clone)]
pub struct KeywordPipeline {
    augmenter: Arc<dyn KeywordAugmenter>,
    augmentation_timeout: Duration,
}

impl KeywordPipeline {
    pub fn new(augmenter: Arc<dyn KeywordAugmenter>, augmentation_timeout: Duration) -> Self {
        Self {
            augmenter,
            augmentation_timeout,
        }
    }

    pub async fn extract(
        &self,
        job_text: &str,
        settings: &KeywordSettings,
    ) -> Result<KeywordExtraction, KeywordError> {
        settings.validate()?;
        let analysis_id = Uuid::new_v4();

        async {
            let (suggestions, augmentation) = self.suggestions(job_text, None, settings).await;
            let keywords = ranked_keywords(job_text, &suggestions, settings)?;
            log_candidate_counts(&keywords, suggestions.len());

            Ok::<_, KeywordError>(KeywordExtraction {
                analysis_id,
                keywords,
                augmentation,
            })
        }
        .instrument(info_span!("keyword_extraction", %analysis_id))
        .await
    }

    /// Full gap analysis of `job_text` against `resume_text`.
    pub async fn analyze(
        &self,
        job_text: &str,
        resume_text: &str,
        settings: &KeywordSettings,
    ) -> Result<KeywordAnalysis, KeywordError> {
        settings.validate()?;
        let analysis_id = Uuid::new_v4();

        async {
            let (suggestions, augmentation) = self
                .suggestions(job_text, Some(resume_text), settings)
                .await;
            let keywords = ranked_keywords(job_text, &suggestions, settings)?;
            log_candidate_counts(&keywords, suggestions.len());

            let GapAnalysis { coverage, gap } =
                analyze_gap(&keywords, resume_text, settings.max_missing);
            info!(
                covered = coverage.covered.len(),
                missing = coverage.missing.len(),
                selected = gap.len(),
                "Gap analysis complete"
            );

            Ok::<_, KeywordError>(KeywordAnalysis {
                analysis_id,
                coverage_ratio: coverage.coverage_ratio(),
                keywords,
                coverage,
                gap,
                augmentation,
            })
        }
        .instrument(info_span!("keyword_analysis", %analysis_id))
        .await
    }

    /// Suggestions to merge plus the status to report. Never fails.
    async fn suggestions(
        &self,
        job_text: &str,
        resume_text: Option<&str>,
        settings: &KeywordSettings,
    ) -> (Vec<String>, AugmentationStatus) {
        if !settings.use_external_augmentation {
            return (Vec::new(), AugmentationStatus::Disabled);
        }
        if job_text.trim().is_empty() {
            return (Vec::new(), AugmentationStatus::Skipped);
        }

        let request = AugmentationRequest {
            job_text,
            resume_text,
            max_keywords: settings.max_missing.saturating_mul(2).max(1),
        };
        let outcome = augment(self.augmenter.as_ref(), &request, self.augmentation_timeout).await;
        (
            outcome.suggestions().to_vec(),
            AugmentationStatus::from(&outcome),
        )
    }
}

/// Heuristic ranking, with suggestions merged when the source produced any.
fn ranked_keywords(
    job_text: &str,
    suggestions: &[String],
    settings: &KeywordSettings,
) -> Result<RankedKeywordList, KeywordError> {
    if suggestions.is_empty() {
        extract_keywords(job_text, settings)
    } else {
        extract_keywords_with_suggestions(job_text, suggestions, settings)
    }
}

fn log_candidate_counts(keywords: &RankedKeywordList, suggested: usize) {
    if keywords.is_empty() {
        info!(suggested, "No keyword candidates found");
        return;
    }
    let heuristic = keywords
        .iter()
        .filter(|c| c.source != CandidateSource::Augmented)
        .count();
    info!(
        heuristic,
        augmented = keywords.len() - heuristic,
        suggested,
        combined = keywords.len(),
        "Keyword candidates ranked"
    );
}
