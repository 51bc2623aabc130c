//! Axum route handlers for the Keywords API.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::keywords::pipeline::{KeywordAnalysis, KeywordExtraction};
use crate::keywords::settings::{bound_from_json, KeywordError, KeywordSettings, SettingsOverride};
use crate::state::AppState;
use crate::tailoring::fetch::{resolve_job_text, ResolvedJobText};
use crate::tailoring::inject::{build_hidden_block, inject_hidden_keywords, strip_hidden_block};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Bounds arrive as raw JSON so both `10` and `"10"` are accepted and anything
/// else is reported rather than silently defaulted.
#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    pub job_text: Option<String>,
    pub job_url: Option<String>,
    pub max_candidates: Option<Value>,
    pub use_external_augmentation: Option<bool>,
    pub collapse_subsumed: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub job_text: Option<String>,
    pub job_url: Option<String>,
    #[serde(default)]
    pub resume_text: String,
    pub max_candidates: Option<Value>,
    pub max_missing: Option<Value>,
    pub use_external_augmentation: Option<bool>,
    pub collapse_subsumed: Option<bool>,
    #[serde(default)]
    pub inject: bool,
}

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    #[serde(flatten)]
    pub extraction: KeywordExtraction,
    pub scraped_from_url: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct InjectionReport {
    pub hidden_block: String,
    pub updated_resume: String,
    pub modified: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub analysis: KeywordAnalysis,
    pub scraped_from_url: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injection: Option<InjectionReport>,
    pub warnings: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Shared request plumbing
// ────────────────────────────────────────────────────────────────────────────

/// Applies per-request overrides to the base settings.
pub(crate) fn request_settings(
    base: &KeywordSettings,
    max_candidates: Option<&Value>,
    max_missing: Option<&Value>,
    use_external_augmentation: Option<bool>,
    collapse_subsumed: Option<bool>,
) -> Result<KeywordSettings, KeywordError> {
    let overrides = SettingsOverride {
        max_candidates: max_candidates
            .map(|v| bound_from_json("max_candidates", v))
            .transpose()?,
        max_missing: max_missing
            .map(|v| bound_from_json("max_missing", v))
            .transpose()?,
        use_external_augmentation,
        collapse_subsumed,
    };
    Ok(base.with_overrides(&overrides))
}

/// Rejects requests that name no job source at all. A named but empty source
/// is valid and yields an empty result.
pub(crate) fn require_job_source(
    job_url: Option<&str>,
    job_text: Option<&str>,
) -> Result<(), AppError> {
    if job_url.is_none() && job_text.is_none() {
        return Err(AppError::Validation(
            "Provide a job description URL or paste the description text.".to_string(),
        ));
    }
    Ok(())
}

/// Runs the gap analysis and, when asked, injects the gap into the résumé.
/// A hidden block left by an earlier injection never counts as coverage.
pub(crate) async fn analyze_job(
    state: &AppState,
    job: ResolvedJobText,
    resume_text: &str,
    settings: &KeywordSettings,
    inject: bool,
) -> Result<AnalyzeResponse, AppError> {
    let ResolvedJobText {
        text,
        scraped_from_url,
        mut warnings,
    } = job;

    let visible_resume = strip_hidden_block(resume_text);
    let analysis = state
        .pipeline
        .analyze(&text, &visible_resume, settings)
        .await?;

    let injection = inject.then(|| {
        let keywords = analysis.gap.keywords();
        let generated_at = Utc::now();
        let injection = inject_hidden_keywords(resume_text, &keywords, generated_at);
        warnings.extend(injection.warnings.iter().cloned());
        InjectionReport {
            hidden_block: if analysis.gap.is_empty() {
                String::new()
            } else {
                build_hidden_block(&keywords, generated_at)
            },
            updated_resume: injection.updated,
            modified: injection.modified,
        }
    });

    info!(
        analysis_id = %analysis.analysis_id,
        ranked = analysis.keywords.len(),
        gap = analysis.gap.len(),
        injected = injection.is_some(),
        "Analysis request complete"
    );

    Ok(AnalyzeResponse {
        analysis,
        scraped_from_url,
        injection,
        warnings,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/keywords/extract
///
/// Ranked keywords of a job posting, fetched by URL or pasted.
pub async fn handle_extract(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> Result<Json<ExtractResponse>, AppError> {
    require_job_source(request.job_url.as_deref(), request.job_text.as_deref())?;
    let settings = request_settings(
        &state.settings,
        request.max_candidates.as_ref(),
        None,
        request.use_external_augmentation,
        request.collapse_subsumed,
    )?;

    let job = resolve_job_text(
        &state.fetcher,
        request.job_url.as_deref(),
        request.job_text.as_deref(),
    )
    .await;
    let extraction = state.pipeline.extract(&job.text, &settings).await?;

    Ok(Json(ExtractResponse {
        extraction,
        scraped_from_url: job.scraped_from_url,
        warnings: job.warnings,
    }))
}

/// POST /api/v1/keywords/analyze
///
/// Gap analysis of a job posting against résumé text, optionally injecting the gap.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    require_job_source(request.job_url.as_deref(), request.job_text.as_deref())?;
    let settings = request_settings(
        &state.settings,
        request.max_candidates.as_ref(),
        request.max_missing.as_ref(),
        request.use_external_augmentation,
        request.collapse_subsumed,
    )?;

    let job = resolve_job_text(
        &state.fetcher,
        request.job_url.as_deref(),
        request.job_text.as_deref(),
    )
    .await;
    let response = analyze_job(&state, job, &request.resume_text, &settings, request.inject).await?;
    Ok(Json(response))
}
