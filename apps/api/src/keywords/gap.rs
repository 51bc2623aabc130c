//! Gap Selector: the bounded, rank-ordered prefix of missing keywords.

use serde::Serialize;

use crate::keywords::coverage::{match_coverage, CoverageResult};
use crate::keywords::ranker::{Candidate, RankedKeywordList};

/// The first K missing keywords. Always a prefix of `CoverageResult::missing`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GapSet {
    keywords: Vec<Candidate>,
}

impl GapSet {
    /// Plain keyword strings in rank order, no markup. This is what the
    /// injection formatter consumes.
    pub fn keywords(&self) -> Vec<String> {
        self.keywords.iter().map(|c| c.keyword.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

/// Pure truncation of `missing` to `max_missing` entries. No re-ranking.
pub fn select_gap(missing: &[Candidate], max_missing: usize) -> GapSet {
    GapSet {
        keywords: missing.iter().take(max_missing).cloned().collect(),
    }
}

/// The full coverage partition alongside the gap selected from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapAnalysis {
    pub coverage: CoverageResult,
    pub gap: GapSet,
}

/// Coverage matching followed by gap selection.
pub fn analyze_gap(
    ranked: &RankedKeywordList,
    document_text: &str,
    max_missing: usize,
) -> GapAnalysis {
    let coverage = match_coverage(ranked, document_text);
    let gap = select_gap(&coverage.missing, max_missing);
    GapAnalysis { coverage, gap }
}
