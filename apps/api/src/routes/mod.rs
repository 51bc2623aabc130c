pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::keywords::handlers as keyword_handlers;
use crate::state::AppState;
use crate::tailoring::handlers as tailoring_handlers;

/// Uploads (résumé sources, compiled PDFs) are capped at 8 MB.
pub const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Keywords API
        .route(
            "/api/v1/keywords/extract",
            post(keyword_handlers::handle_extract),
        )
        .route(
            "/api/v1/keywords/analyze",
            post(keyword_handlers::handle_analyze),
        )
        // Resumes API
        .route(
            "/api/v1/resumes/tailor",
            post(tailoring_handlers::handle_tailor),
        )
        .route(
            "/api/v1/resumes/verify",
            post(tailoring_handlers::handle_verify),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
