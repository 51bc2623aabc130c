//! PDF verification: checks which keywords survive into a compiled résumé's text layer.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::keywords::coverage::DocumentIndex;
use crate::keywords::tokenizer::{normalize_phrase, PhraseKind};

const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("could not read text from PDF: {0}")]
    Extract(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfVerification {
    pub found: Vec<String>,
    pub missing: Vec<String>,
    pub text_chars: usize,
    pub text_preview: String,
}

impl PdfVerification {
    pub fn all_found(&self) -> bool {
        self.missing.is_empty()
    }
}

/// CPU-bound; run it on a blocking thread.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, VerifyError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| VerifyError::Extract(e.to_string()))
}

/// Splits a comma- or newline-separated keyword list, dropping blanks and
/// case-insensitive duplicates.
pub fn parse_keyword_list(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.split(|c: char| c == ',' || c == '\n')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .filter(|k| seen.insert(k.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Classifies `keywords` against extracted PDF text with the coverage matcher.
pub fn verify_keywords(text: &str, keywords: &[String]) -> PdfVerification {
    let index = DocumentIndex::new(text);
    let (found, missing): (Vec<String>, Vec<String>) =
        keywords.iter().cloned().partition(|keyword| {
            let normalized = normalize_phrase(keyword);
            let kind = match normalized.split(' ').count() {
                2 => PhraseKind::Bigram,
                _ => PhraseKind::Unigram,
            };
            !normalized.is_empty() && index.match_keyword(&normalized, kind).is_some()
        });

    debug!(found = found.len(), missing = missing.len(), "Verified PDF keywords");
    PdfVerification {
        found,
        missing,
        text_chars: text.chars().count(),
        text_preview: text.chars().take(PREVIEW_CHARS).collect(),
    }
}
