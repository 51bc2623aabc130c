//! Immutable per-invocation configuration for the keyword engine.
//!
//! Built once at startup from `Config`, held in `AppState` as `Arc<KeywordSettings>`,
//! and overridden per request by producing a new value.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::keywords::vocabulary::{DomainVocabulary, StopwordSet};

pub const DEFAULT_MAX_CANDIDATES: usize = 30;
pub const DEFAULT_MAX_MISSING: usize = 25;

/// The only failure the keyword engine reports. Malformed text is never an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KeywordError {
    #[error("Invalid configuration for '{field}': {reason}")]
    ConfigurationInvalid { field: &'static str, reason: String },
}

impl KeywordError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        KeywordError::ConfigurationInvalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Weights of the four ranking signals. Each signal is in [0, 1] before weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub frequency: f64,
    pub position: f64,
    /// Applied to bigrams as `phrase_length * frequency_signal`, i.e. a fixed
    /// multiplicative boost over a unigram of equal frequency.
    pub phrase_length: f64,
    pub dictionary: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            frequency: 0.45,
            position: 0.2,
            phrase_length: 0.15,
            dictionary: 0.2,
        }
    }
}

impl ScoringWeights {
    pub fn validate(&self) -> Result<(), KeywordError> {
        let all = [
            ("weights.frequency", self.frequency),
            ("weights.position", self.position),
            ("weights.phrase_length", self.phrase_length),
            ("weights.dictionary", self.dictionary),
        ];
        for (field, weight) in all {
            if !weight.is_finite() || weight < 0.0 {
                return Err(KeywordError::invalid(
                    field,
                    format!("must be a finite, non-negative number, got {weight}"),
                ));
            }
        }
        if all.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
            return Err(KeywordError::invalid(
                "weights",
                "at least one scoring weight must be positive",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct KeywordSettings {
    /// Bounds the ranker output.
    pub max_candidates: usize,
    /// Bounds the gap selector output.
    pub max_missing: usize,
    pub use_external_augmentation: bool,
    /// Drop unigrams already contained in a higher-ranked bigram.
    pub collapse_subsumed: bool,
    pub weights: ScoringWeights,
    pub stopwords: Arc<StopwordSet>,
    pub vocabulary: Arc<DomainVocabulary>,
}

impl Default for KeywordSettings {
    fn default() -> Self {
        Self {
            max_candidates: DEFAULT_MAX_CANDIDATES,
            max_missing: DEFAULT_MAX_MISSING,
            use_external_augmentation: false,
            collapse_subsumed: false,
            weights: ScoringWeights::default(),
            stopwords: Arc::new(StopwordSet::english()),
            vocabulary: Arc::new(DomainVocabulary::builtin()),
        }
    }
}

/// Per-request overrides. Unset fields keep the base settings.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverride {
    pub max_candidates: Option<usize>,
    pub max_missing: Option<usize>,
    pub use_external_augmentation: Option<bool>,
    pub collapse_subsumed: Option<bool>,
}

impl KeywordSettings {
    /// Returns new settings with `overrides` applied. The lexicons are shared, not copied.
    pub fn with_overrides(&self, overrides: &SettingsOverride) -> Self {
        Self {
            max_candidates: overrides.max_candidates.unwrap_or(self.max_candidates),
            max_missing: overrides.max_missing.unwrap_or(self.max_missing),
            use_external_augmentation: overrides
                .use_external_augmentation
                .unwrap_or(self.use_external_augmentation),
            collapse_subsumed: overrides.collapse_subsumed.unwrap_or(self.collapse_subsumed),
            weights: self.weights.clone(),
            stopwords: Arc::clone(&self.stopwords),
            vocabulary: Arc::clone(&self.vocabulary),
        }
    }

    pub fn validate(&self) -> Result<(), KeywordError> {
        self.weights.validate()
    }
}

/// Parses a bound (`max_candidates`, `max_missing`) from text.
/// Negative or non-numeric values fail fast; nothing is clamped.
pub fn parse_bound(field: &'static str, raw: &str) -> Result<usize, KeywordError> {
    let trimmed = raw.trim();
    let value: i64 = trimmed.parse().map_err(|_| {
        KeywordError::invalid(field, format!("must be a whole number, got '{trimmed}'"))
    })?;
    non_negative(field, value)
}

/// Parses a bound from a JSON request value: a number or a numeric string.
pub fn bound_from_json(field: &'static str, value: &Value) -> Result<usize, KeywordError> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(v) => non_negative(field, v),
            None if n.as_u64().is_some() => Err(KeywordError::invalid(field, "is too large")),
            None => Err(KeywordError::invalid(
                field,
                format!("must be a whole number, got {n}"),
            )),
        },
        Value::String(s) => parse_bound(field, s),
        other => Err(KeywordError::invalid(
            field,
            format!("must be a number, got {other}"),
        )),
    }
}

/// Accepts the usual truthy spellings: 1, true, yes, on.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_negative(field: &'static str, value: i64) -> Result<usize, KeywordError> {
    usize::try_from(value)
        .map_err(|_| KeywordError::invalid(field, format!("must not be negative, got {value}")))
}
