use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::keywords::augment::{DisabledAugmenter, KeywordAugmenter, LlmKeywordAugmenter};
use crate::keywords::pipeline::KeywordPipeline;
use crate::keywords::settings::KeywordSettings;
use crate::llm_client::{self, LlmClient};
use crate::tailoring::fetch::JobPostingFetcher;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Base settings; requests override them by building a new value.
    pub settings: Arc<KeywordSettings>,
    pub pipeline: KeywordPipeline,
    pub fetcher: JobPostingFetcher,
}

impl AppState {
    /// Picks the LLM augmenter when an API key is configured, otherwise the disabled one.
    pub fn from_config(config: Config) -> Result<Self> {
        let augmenter: Arc<dyn KeywordAugmenter> = match &config.anthropic_api_key {
            Some(key) => {
                let llm = LlmClient::new(key.clone(), config.augmentation_timeout)
                    .context("Failed to build LLM client")?;
                info!("LLM keyword augmentation available (model: {})", llm_client::MODEL);
                Arc::new(LlmKeywordAugmenter::new(llm))
            }
            None => {
                info!("ANTHROPIC_API_KEY not set; keyword augmentation unavailable");
                Arc::new(DisabledAugmenter)
            }
        };
        Self::with_augmenter(config, augmenter)
    }

    pub fn with_augmenter(config: Config, augmenter: Arc<dyn KeywordAugmenter>) -> Result<Self> {
        let settings = Arc::new(config.keyword_settings()?);
        let pipeline = KeywordPipeline::new(augmenter, config.augmentation_timeout);
        let fetcher =
            JobPostingFetcher::new(config.fetch_timeout).context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            settings,
            pipeline,
            fetcher,
        })
    }
}
