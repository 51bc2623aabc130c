//! Job-posting fetch: turns a posting URL into plain text.
//!
//! Fetching is best-effort. Any failure becomes `FetchedText::Unavailable`, which
//! callers treat as empty text plus a warning; it never fails the request.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{Client, Url};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

/// Containers seen on common job boards and ATS pages, most specific first.
const DESCRIPTION_SELECTORS: &[&str] = &[
    r#"[data-test="job-description"]"#,
    "#jobDescriptionText",
    ".jobsearch-JobComponent-description",
    ".jobs-description__content",
    ".jobs-box__html-content",
    ".jobs-unified-description__content",
    ".jobs-description",
    ".job-description",
    "#jobDescription",
    "#description",
    r#"section[aria-label*="description"]"#,
    r#"div[aria-label*="description"]"#,
    r#"section[id*="description"]"#,
    r#"div[id*="description"]"#,
    r#"section[class*="description"]"#,
    r#"div[class*="description"]"#,
    r#"article[class*="description"]"#,
    ".posting-description",
    ".jd-description",
    ".description__text",
];

const SECTION_SIGNALS: &[&str] = &[
    "responsibilit",
    "requirement",
    "qualification",
    "what you will",
    "what you'll",
    "about the role",
    "skills",
];

const GENERIC_DESCRIPTION_KEYS: &[&str] = &[
    "description",
    "jobDescription",
    "job_description",
    "details",
    "summary",
    "body",
    "content",
];

const NON_CONTENT_TAGS: &[&str] = &[
    "script", "style", "noscript", "header", "footer", "nav", "aside", "template",
];

const MIN_DOM_BLOCK_CHARS: usize = 200;
const SIGNAL_BONUS: usize = 200;
const MIN_META_CHARS: usize = 80;
const MIN_GENERIC_JSON_CHARS: usize = 120;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("'{0}' is not an http(s) URL")]
    InvalidUrl(String),

    #[error("unable to fetch job description: {0}")]
    Request(#[from] reqwest::Error),

    #[error("job posting returned HTTP {0}")]
    Status(u16),

    #[error("parsed page does not contain text content")]
    NoText,
}

#[derive(Debug)]
pub enum FetchedText {
    Text(String),
    Unavailable(FetchError),
}

/// Shared HTTP client for posting pages. Cheap to clone.
#[derive(Clone)]
pub struct JobPostingFetcher {
    client: Client,
}

impl JobPostingFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.google.com/"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> FetchedText {
        match self.fetch_text(url).await {
            Ok(text) => {
                info!(url, chars = text.chars().count(), "Fetched job posting");
                FetchedText::Text(text)
            }
            Err(e) => {
                warn!(url, "Job posting fetch failed: {}", e);
                FetchedText::Unavailable(e)
            }
        }
    }

    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(url.trim()).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let response = self.client.get(parsed).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let html = response.text().await?;

        let text = extract_posting_text(&html);
        if text.is_empty() {
            return Err(FetchError::NoText);
        }
        Ok(text)
    }
}

/// Job text to analyze and how it was obtained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedJobText {
    pub text: String,
    pub scraped_from_url: bool,
    pub warnings: Vec<String>,
}

/// Prefers the posting URL; falls back to the pasted description when the URL is
/// absent or yields nothing.
pub async fn resolve_job_text(
    fetcher: &JobPostingFetcher,
    job_url: Option<&str>,
    pasted: Option<&str>,
) -> ResolvedJobText {
    let mut resolved = ResolvedJobText::default();

    if let Some(url) = job_url.map(str::trim).filter(|u| !u.is_empty()) {
        match fetcher.fetch(url).await {
            FetchedText::Text(text) => {
                resolved.text = text;
                resolved.scraped_from_url = true;
            }
            FetchedText::Unavailable(e) => resolved.warnings.push(e.to_string()),
        }
    }

    if resolved.text.trim().is_empty() {
        resolved.scraped_from_url = false;
        resolved.text = pasted.map(str::trim).unwrap_or_default().to_string();
    }
    resolved
}

// ────────────────────────────────────────────────────────────────────────────
// HTML extraction
// ────────────────────────────────────────────────────────────────────────────

/// Concatenates, in order: the JSON-LD description, the best description
/// container, the meta description, and the page's visible text.
pub fn extract_posting_text(html: &str) -> String {
    let doc = Html::parse_document(html);

    [
        json_ld_description(&doc),
        dom_description(&doc),
        meta_description(&doc),
        Some(visible_text(&doc)),
    ]
    .into_iter()
    .flatten()
    .filter(|fragment| !fragment.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn element_text(el: &ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn json_ld_description(doc: &Html) -> Option<String> {
    let sel = Selector::parse("script").ok()?;
    for script in doc.select(&sel) {
        let kind = script.value().attr("type").unwrap_or_default().to_lowercase();
        if !kind.is_empty() && !kind.contains("json") {
            continue;
        }
        let raw = script.text().collect::<String>();
        let Ok(data) = serde_json::from_str::<Value>(raw.trim()) else {
            continue;
        };
        let Some(description_html) = find_json_description(&data) else {
            continue;
        };
        let fragment = Html::parse_fragment(description_html);
        let text = element_text(&fragment.root_element());
        if !text.is_empty() {
            return Some(text);
        }
    }
    None
}

/// Depth-first search for a `JobPosting` description, or failing that a long
/// description-like string under a generic key.
fn find_json_description(data: &Value) -> Option<&str> {
    match data {
        Value::Object(map) => {
            let kind = map
                .get("@type")
                .or_else(|| map.get("type"))
                .and_then(Value::as_str)
                .map(str::to_lowercase);
            if matches!(kind.as_deref(), Some("jobposting" | "job")) {
                let description = map
                    .get("description")
                    .or_else(|| map.get("responsibilities"))
                    .and_then(Value::as_str)
                    .filter(|d| !d.trim().is_empty());
                if description.is_some() {
                    return description;
                }
            }

            let generic = GENERIC_DESCRIPTION_KEYS.iter().find_map(|key| {
                map.get(*key)
                    .and_then(Value::as_str)
                    .filter(|v| v.trim().chars().count() > MIN_GENERIC_JSON_CHARS)
            });
            if generic.is_some() {
                return generic;
            }

            map.values().find_map(find_json_description)
        }
        Value::Array(items) => items.iter().find_map(find_json_description),
        _ => None,
    }
}

fn dom_description(doc: &Html) -> Option<String> {
    let mut best: Option<(usize, String)> = None;

    for selector in DESCRIPTION_SELECTORS {
        let Ok(sel) = Selector::parse(selector) else {
            continue;
        };
        for el in doc.select(&sel) {
            let text = element_text(&el);
            let chars = text.chars().count();
            if chars < MIN_DOM_BLOCK_CHARS {
                continue;
            }
            let lower = text.to_lowercase();
            let score = chars
                + SIGNAL_BONUS * SECTION_SIGNALS.iter().filter(|s| lower.contains(*s)).count();
            if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
                best = Some((score, text));
            }
        }
    }
    best.map(|(_, text)| text)
}

fn meta_description(doc: &Html) -> Option<String> {
    [
        r#"meta[property="og:description"]"#,
        r#"meta[name="description"]"#,
    ]
    .iter()
    .filter_map(|selector| Selector::parse(selector).ok())
    .find_map(|sel| {
        doc.select(&sel)
            .filter_map(|el| el.value().attr("content"))
            .map(collapse_whitespace)
            .find(|content| content.chars().count() > MIN_META_CHARS)
    })
}

/// Text of the document with scripts, styles, and page chrome left out.
fn visible_text(doc: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .unwrap_or_else(|| doc.root_element());

    let parts: Vec<&str> = root
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| NON_CONTENT_TAGS.contains(&el.name()))
            });
            (!hidden).then_some(&**text)
        })
        .collect();
    collapse_whitespace(&parts.join(" "))
}
