//! Lexicons used by the keyword engine: the stopword set and the curated
//! domain vocabulary that drives the dictionary bonus.
//!
//! Both are immutable once built. `KeywordSettings` holds them behind `Arc`
//! so every invocation reads the same values without sharing mutable state.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};

use crate::keywords::tokenizer::normalize_phrase;

/// Common English function words.
const ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "etc",
    "every", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "may", "me", "might", "more", "most", "must", "my", "myself", "no", "nor",
    "not", "now", "of", "off", "on", "once", "only", "or", "other", "ought", "our", "ours",
    "ourselves", "out", "over", "own", "same", "she", "should", "so", "some", "such", "than",
    "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "under", "until", "up", "us", "very", "was", "we",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "within", "would", "you", "your", "yours", "yourself", "yourselves",
    // contractions survive tokenization with their apostrophe
    "you'll", "you're", "you've", "we're", "we'll", "we've", "they're", "it'll", "don't",
    "doesn't", "isn't", "aren't", "won't", "can't", "i'm", "i've", "let",
    // abbreviations that keep their inner dot
    "e.g", "i.e",
];

/// Words that appear in nearly every job posting and carry no signal.
const JOB_LISTING_FILLER: &[&str] = &[
    "ability", "able", "applicants", "apply", "based", "benefits", "candidate", "candidates",
    "company", "experience", "including", "join", "looking", "need", "new", "opportunity",
    "plus", "position", "preferred", "qualifications", "required", "requirements",
    "responsibilities", "role", "skills", "strong", "team", "using", "well", "work", "working",
    "year", "years",
];

/// Curated technical vocabulary. Entries are normalized on load, so casing and
/// separators here only need to be readable.
const BUILTIN_DOMAIN_TERMS: &[&str] = &[
    // languages
    "python", "java", "javascript", "typescript", "rust", "go", "golang", "c++", "c#", "ruby",
    "php", "scala", "kotlin", "swift", "sql", "bash", "elixir", "haskell",
    // frameworks & runtimes
    "react", "angular", "vue", "vue.js", "next.js", "node.js", "nodejs", "django", "flask",
    "fastapi", "spring", "spring boot", "rails", "express", ".net", "asp.net", "graphql", "grpc",
    "rest", "tokio", "pytorch", "tensorflow", "pandas", "numpy", "spark", "hadoop", "airflow",
    "dbt",
    // data stores
    "postgresql", "postgres", "mysql", "mongodb", "redis", "cassandra", "elasticsearch",
    "dynamodb", "snowflake", "bigquery", "kafka", "rabbitmq",
    // cloud & infrastructure
    "aws", "azure", "gcp", "docker", "kubernetes", "terraform", "ansible", "helm", "linux",
    "serverless", "lambda", "s3", "ec2", "cloudformation", "prometheus", "grafana", "datadog",
    "nginx", "jenkins", "github actions", "gitlab",
    // practices & concepts
    "ci/cd", "devops", "sre", "microservices", "distributed systems", "system design",
    "machine learning", "deep learning", "data engineering", "data pipelines", "etl",
    "observability", "monitoring", "security", "agile", "scrum", "tdd", "unit testing",
    "api design", "rest apis", "cloud infrastructure", "infrastructure as code", "full-stack",
    "backend", "frontend", "mobile", "performance", "scalability", "reliability", "llm", "nlp",
    "computer vision", "mlops", "data science", "analytics",
];

/// A set of words excluded from keyword candidates.
#[derive(Debug, Clone)]
pub struct StopwordSet {
    words: HashSet<String>,
}

impl Default for StopwordSet {
    fn default() -> Self {
        Self::english()
    }
}

impl StopwordSet {
    /// English function words plus job-listing filler.
    pub fn english() -> Self {
        Self::new(ENGLISH_STOPWORDS.iter().chain(JOB_LISTING_FILLER))
    }

    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            words: words
                .into_iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }
}

/// Curated set of known technical/domain terms.
///
/// Terms are keyed separator-insensitively: "full-stack" and "full stack"
/// are the same vocabulary entry.
#[derive(Debug, Clone)]
pub struct DomainVocabulary {
    terms: HashSet<String>,
}

impl Default for DomainVocabulary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl DomainVocabulary {
    pub fn builtin() -> Self {
        Self::new(BUILTIN_DOMAIN_TERMS)
    }

    /// Builds a vocabulary from scratch, replacing the built-in terms.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(|t| vocabulary_key(t.as_ref()))
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Returns a new vocabulary extended with `terms`.
    pub fn with_terms<I, S>(&self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut merged = self.terms.clone();
        merged.extend(
            terms
                .into_iter()
                .map(|t| vocabulary_key(t.as_ref()))
                .filter(|k| !k.is_empty()),
        );
        Self { terms: merged }
    }

    /// Extends the vocabulary from a newline-separated file.
    /// Blank lines and `#` comments are skipped.
    pub fn load_extra_terms(&self, path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read domain vocabulary '{}'", path.display()))?;

        let terms = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));

        Ok(self.with_terms(terms))
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.terms.contains(&vocabulary_key(phrase))
    }

    /// Dictionary signal in [0, 1]: 1.0 for a full vocabulary match,
    /// 0.5 for a bigram with at least one vocabulary constituent.
    pub fn bonus(&self, phrase: &str) -> f64 {
        if self.contains(phrase) {
            return 1.0;
        }
        let mut words = phrase.split(' ');
        match (words.next(), words.next(), words.next()) {
            (Some(first), Some(second), None) if self.contains(first) || self.contains(second) => {
                0.5
            }
            _ => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }
}

fn vocabulary_key(term: &str) -> String {
    normalize_phrase(term).replace(|c: char| c == '-' || c == '.', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_english_stopwords_include_filler() {
        let stopwords = StopwordSet::english();
        assert!(stopwords.contains("the"));
        assert!(stopwords.contains("experience"));
        assert!(stopwords.contains("you'll"));
        assert!(!stopwords.contains("kubernetes"));
    }

    #[test]
    fn test_dotted_terms_match_tokenized_text() {
        let vocab = DomainVocabulary::builtin();
        assert!(vocab.contains("node.js"));
        assert!(vocab.contains("asp.net"));
        assert_eq!(vocab.bonus("node.js"), 1.0);
        assert_eq!(vocab.bonus("node.js developer"), 0.5);
        assert!(!vocab.contains("js"));
    }

    #[test]
    fn test_builtin_vocabulary_normalizes_terms() {
        let vocab = DomainVocabulary::builtin();
        assert!(vocab.contains("kubernetes"));
        assert!(vocab.contains("c++"));
        assert!(vocab.contains("ci cd"));
        assert!(vocab.contains("distributed systems"));
    }

    #[test]
    fn test_vocabulary_is_separator_insensitive() {
        let vocab = DomainVocabulary::new(["full-stack"]);
        assert!(vocab.contains("full stack"));
        assert!(vocab.contains("full-stack"));
    }

    #[test]
    fn test_bonus_full_and_partial() {
        let vocab = DomainVocabulary::new(["python", "distributed systems"]);
        assert_eq!(vocab.bonus("distributed systems"), 1.0);
        assert_eq!(vocab.bonus("python developer"), 0.5);
        assert_eq!(vocab.bonus("python"), 1.0);
        assert_eq!(vocab.bonus("developer"), 0.0);
        assert_eq!(vocab.bonus("senior developer"), 0.0);
    }

    #[test]
    fn test_with_terms_keeps_original_untouched() {
        let base = DomainVocabulary::new(["rust"]);
        let extended = base.with_terms(["Zig"]);
        assert!(extended.contains("zig"));
        assert!(!base.contains("zig"));
        assert_eq!(extended.len(), 2);
    }

    #[test]
    fn test_load_extra_terms_skips_comments_and_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# internal platforms").unwrap();
        writeln!(file, "Backstage").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  Event Sourcing  ").unwrap();

        let vocab = DomainVocabulary::new(Vec::<String>::new())
            .load_extra_terms(file.path())
            .unwrap();
        assert_eq!(vocab.len(), 2);
        assert!(vocab.contains("backstage"));
        assert!(vocab.contains("event sourcing"));
    }

    #[test]
    fn test_load_extra_terms_missing_file_errors() {
        let result = DomainVocabulary::builtin()
            .load_extra_terms(Path::new("/definitely/not/here/vocab.txt"));
        assert!(result.is_err());
    }
}
