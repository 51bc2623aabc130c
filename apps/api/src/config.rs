use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::keywords::settings::{
    parse_bound, parse_flag, KeywordSettings, DEFAULT_MAX_CANDIDATES, DEFAULT_MAX_MISSING,
};
use crate::keywords::vocabulary::DomainVocabulary;

/// Application configuration loaded from environment variables.
/// Nothing is required; an invalid value fails startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Without a key, augmentation is reported unavailable.
    pub anthropic_api_key: Option<String>,
    pub max_candidates: usize,
    pub max_missing: usize,
    pub use_external_augmentation: bool,
    pub collapse_subsumed: bool,
    pub domain_vocabulary_path: Option<PathBuf>,
    pub fetch_timeout: Duration,
    pub augmentation_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            anthropic_api_key: None,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            max_missing: DEFAULT_MAX_MISSING,
            use_external_augmentation: false,
            collapse_subsumed: false,
            domain_vocabulary_path: None,
            fetch_timeout: Duration::from_secs(15),
            augmentation_timeout: Duration::from_secs(20),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        Ok(Config {
            port: match get("PORT") {
                Some(v) => v
                    .trim()
                    .parse::<u16>()
                    .context("PORT must be a valid port number")?,
                None => defaults.port,
            },
            rust_log: get("RUST_LOG").unwrap_or(defaults.rust_log),
            anthropic_api_key: get("ANTHROPIC_API_KEY").map(|k| k.trim().to_string()),
            max_candidates: match get("MAX_CANDIDATES") {
                Some(v) => parse_bound("max_candidates", &v).context("Invalid MAX_CANDIDATES")?,
                None => defaults.max_candidates,
            },
            max_missing: match get("MAX_MISSING") {
                Some(v) => parse_bound("max_missing", &v).context("Invalid MAX_MISSING")?,
                None => defaults.max_missing,
            },
            use_external_augmentation: get("USE_EXTERNAL_AUGMENTATION")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.use_external_augmentation),
            collapse_subsumed: get("COLLAPSE_SUBSUMED")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.collapse_subsumed),
            domain_vocabulary_path: get("DOMAIN_VOCABULARY_PATH").map(PathBuf::from),
            fetch_timeout: seconds(get("FETCH_TIMEOUT_SECS"), "FETCH_TIMEOUT_SECS")?
                .unwrap_or(defaults.fetch_timeout),
            augmentation_timeout: seconds(
                get("AUGMENTATION_TIMEOUT_SECS"),
                "AUGMENTATION_TIMEOUT_SECS",
            )?
            .unwrap_or(defaults.augmentation_timeout),
        })
    }

    /// Base keyword settings for every request, with the extra vocabulary file merged in.
    pub fn keyword_settings(&self) -> Result<KeywordSettings> {
        let mut settings = KeywordSettings {
            max_candidates: self.max_candidates,
            max_missing: self.max_missing,
            use_external_augmentation: self.use_external_augmentation,
            collapse_subsumed: self.collapse_subsumed,
            ..KeywordSettings::default()
        };

        if let Some(path) = &self.domain_vocabulary_path {
            let vocabulary: DomainVocabulary = settings.vocabulary.load_extra_terms(path)?;
            info!(
                "Domain vocabulary extended from {} ({} terms)",
                path.display(),
                vocabulary.len()
            );
            settings.vocabulary = Arc::new(vocabulary);
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn seconds(value: Option<String>, key: &str) -> Result<Option<Duration>> {
    value
        .map(|v| {
            v.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("{key} must be a whole number of seconds"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_candidates, 30);
        assert_eq!(config.max_missing, 25);
        assert!(config.anthropic_api_key.is_none());
        assert!(!config.use_external_augmentation);
        assert_eq!(config.augmentation_timeout, Duration::from_secs(20));
    }

    #[test]
    fn test_reads_overrides() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("MAX_MISSING", "10"),
            ("USE_EXTERNAL_AUGMENTATION", "yes"),
            ("ANTHROPIC_API_KEY", " sk-test "),
            ("FETCH_TIMEOUT_SECS", "5"),
            ("COLLAPSE_SUBSUMED", "true"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.max_missing, 10);
        assert!(config.use_external_augmentation);
        assert_eq!(config.anthropic_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.fetch_timeout, Duration::from_secs(5));
        assert!(config.collapse_subsumed);
        assert!(config.keyword_settings().unwrap().collapse_subsumed);
    }

    #[test]
    fn test_blank_key_counts_as_unset() {
        let config = config_from(&[("ANTHROPIC_API_KEY", "  ")]).unwrap();
        assert!(config.anthropic_api_key.is_none());
    }

    #[test]
    fn test_negative_bound_fails_startup() {
        let err = config_from(&[("MAX_CANDIDATES", "-5")]).unwrap_err();
        assert!(format!("{err:#}").contains("must not be negative"));
    }

    #[test]
    fn test_bad_timeout_fails_startup() {
        assert!(config_from(&[("AUGMENTATION_TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_keyword_settings_load_vocabulary_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# house terms\nzanzibar-lang\n\nquuxdb").unwrap();

        let config = Config {
            domain_vocabulary_path: Some(file.path().to_path_buf()),
            max_candidates: 12,
            ..Config::default()
        };
        let settings = config.keyword_settings().unwrap();
        assert_eq!(settings.max_candidates, 12);
        assert!(settings.vocabulary.contains("quuxdb"));
        assert!(settings.vocabulary.contains("zanzibar-lang"));
    }

    #[test]
    fn test_missing_vocabulary_file_is_an_error() {
        let config = Config {
            domain_vocabulary_path: Some(PathBuf::from("/nonexistent/terms.txt")),
            ..Config::default()
        };
        assert!(config.keyword_settings().is_err());
    }
}
