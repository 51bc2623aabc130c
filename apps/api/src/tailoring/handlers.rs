//! Axum route handlers for the Resumes API: multipart upload flows.

use axum::{
    extract::{multipart::Field, Multipart, State},
    Json,
};
use bytes::Bytes;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::keywords::handlers::{
    analyze_job, request_settings, require_job_source, AnalyzeResponse,
};
use crate::keywords::settings::{parse_bound, parse_flag};
use crate::state::AppState;
use crate::tailoring::fetch::resolve_job_text;
use crate::tailoring::verify::{
    extract_pdf_text, parse_keyword_list, verify_keywords, PdfVerification,
};

/// The heuristic pool is this many times the requested gap size.
const CANDIDATES_PER_TARGET: usize = 3;

pub const LATIN1_WARNING: &str =
    "Resume was decoded using latin-1 encoding. Consider saving as UTF-8 for best results.";

/// Decodes an uploaded text file as UTF-8, falling back to Latin-1.
/// Returns the text and whether the fallback was used.
pub fn decode_upload(bytes: &[u8]) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), false),
        Err(_) => (bytes.iter().map(|&b| char::from(b)).collect(), true),
    }
}

async fn field_bytes(field: Field<'_>) -> Result<Bytes, AppError> {
    field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))
}

async fn field_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))
}

async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))
}

#[derive(Debug, Default)]
struct TailorForm {
    resume: Option<Bytes>,
    job_url: Option<String>,
    job_description: Option<String>,
    keyword_target: Option<String>,
    use_ai_keywords: Option<String>,
}

#[derive(Debug, Default)]
struct VerifyForm {
    pdf: Option<Bytes>,
    keywords: Option<String>,
}

/// POST /api/v1/resumes/tailor
///
/// Multipart form: `resume` (.tex upload), `job_url`, `job_description`,
/// `keyword_target`, `use_ai_keywords`. Returns the gap analysis with the
/// gap injected into the résumé as a hidden block.
pub async fn handle_tailor(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut form = TailorForm::default();
    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "resume" => form.resume = Some(field_bytes(field).await?),
            "job_url" => form.job_url = Some(field_text(field).await?),
            "job_description" => form.job_description = Some(field_text(field).await?),
            "keyword_target" => form.keyword_target = Some(field_text(field).await?),
            "use_ai_keywords" => form.use_ai_keywords = Some(field_text(field).await?),
            other => warn!("Ignoring unknown multipart field '{other}'"),
        }
    }

    let resume_bytes = form.resume.ok_or_else(|| {
        AppError::Validation("Please upload your LaTeX resume (.tex file).".to_string())
    })?;
    if resume_bytes.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "Uploaded resume is empty.".to_string(),
        ));
    }
    require_job_source(form.job_url.as_deref(), form.job_description.as_deref())?;

    let keyword_target = form
        .keyword_target
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .map(|t| parse_bound("keyword_target", t))
        .transpose()?;
    let max_candidates = keyword_target.map(|t| {
        let pool = t.saturating_mul(CANDIDATES_PER_TARGET);
        Value::from(state.settings.max_candidates.max(pool))
    });
    let max_missing = keyword_target.map(Value::from);
    let settings = request_settings(
        &state.settings,
        max_candidates.as_ref(),
        max_missing.as_ref(),
        form.use_ai_keywords.as_deref().map(parse_flag),
        None,
    )?;

    let (resume_text, latin1) = decode_upload(&resume_bytes);

    let mut job = resolve_job_text(
        &state.fetcher,
        form.job_url.as_deref(),
        form.job_description.as_deref(),
    )
    .await;
    if latin1 {
        job.warnings.insert(0, LATIN1_WARNING.to_string());
    }

    let response = analyze_job(&state, job, &resume_text, &settings, true).await?;
    Ok(Json(response))
}

/// POST /api/v1/resumes/verify
///
/// Multipart form: `pdf` (compiled résumé) and `keywords` (comma or newline
/// separated). Reports which keywords the PDF's text layer contains.
pub async fn handle_verify(mut multipart: Multipart) -> Result<Json<PdfVerification>, AppError> {
    let mut form = VerifyForm::default();
    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "pdf" => form.pdf = Some(field_bytes(field).await?),
            "keywords" => form.keywords = Some(field_text(field).await?),
            other => warn!("Ignoring unknown multipart field '{other}'"),
        }
    }

    let pdf = form
        .pdf
        .ok_or_else(|| AppError::Validation("Please upload the compiled PDF.".to_string()))?;
    if pdf.is_empty() {
        return Err(AppError::UnprocessableEntity("Uploaded PDF is empty.".to_string()));
    }
    let keywords = parse_keyword_list(form.keywords.as_deref().unwrap_or_default());

    // PDF parsing is CPU-bound, and pdf-extract panics on some malformed files.
    let text = tokio::task::spawn_blocking(move || extract_pdf_text(&pdf))
        .await
        .map_err(|e| {
            if e.is_panic() {
                AppError::UnprocessableEntity("Could not read text from PDF.".to_string())
            } else {
                AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF extraction: {e}"))
            }
        })?
        .map_err(|e| AppError::UnprocessableEntity(e.to_string()))?;

    let verification = verify_keywords(&text, &keywords);
    info!(
        found = verification.found.len(),
        missing = verification.missing.len(),
        all_found = verification.all_found(),
        "PDF keyword verification complete"
    );
    Ok(Json(verification))
}
