//! Coverage Matcher: partitions a ranked list into keywords the document
//! already contains and keywords it is missing.
//!
//! Document and keywords are folded to one canonical form: lowercase tokens
//! (same token rules as the tokenizer) with hyphens, inner dots and
//! apostrophes turned into spaces, joined by single spaces. Matching is whole-word, so "go"
//! never matches inside "going". No stemming is performed.

use std::collections::HashSet;

use serde::Serialize;

use crate::keywords::ranker::{Candidate, RankedKeywordList};
use crate::keywords::tokenizer::{split_tokens, PhraseKind};

/// How a covered keyword was found in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// The whole phrase appears, modulo case and separators.
    Exact,
    /// A hyphenated or dotted term appears in closed form ("full-stack" as
    /// "fullstack", "node.js" as "nodejs").
    Compound,
    /// Both words of a bigram appear independently.
    Constituents,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoveredKeyword {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub matched_by: MatchKind,
}

/// `covered` and `missing` each keep the relative rank order of the input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoverageResult {
    pub covered: Vec<CoveredKeyword>,
    pub missing: Vec<Candidate>,
}

impl CoverageResult {
    /// Fraction of keywords already covered; 0 for an empty list.
    pub fn coverage_ratio(&self) -> f64 {
        let total = self.covered.len() + self.missing.len();
        if total == 0 {
            0.0
        } else {
            self.covered.len() as f64 / total as f64
        }
    }
}

/// Folds text to the canonical matching form, padded with a space on each side
/// so every word is bounded by spaces.
pub fn fold_for_matching(text: &str) -> String {
    let words: Vec<String> = split_tokens(text)
        .into_iter()
        .flat_map(|token| {
            token
                .text
                .split(|c: char| c == '-' || c == '.' || c == '\'')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect();

    if words.is_empty() {
        String::new()
    } else {
        format!(" {} ", words.join(" "))
    }
}

/// A folded view of a target document, built once and queried per keyword.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    folded: String,
    words: HashSet<String>,
}

impl DocumentIndex {
    pub fn new(document_text: &str) -> Self {
        // LaTeX sources write "C#" as "C\#"
        let folded = fold_for_matching(&document_text.replace("\\#", "#"));
        let words = folded.split_whitespace().map(str::to_string).collect();
        Self { folded, words }
    }

    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }

    /// Whole-word phrase lookup. `phrase` may be in any casing or separator style.
    pub fn contains_phrase(&self, phrase: &str) -> bool {
        let needle = fold_for_matching(phrase);
        if needle.is_empty() {
            return false;
        }
        match needle.trim().split(' ').count() {
            1 => self.words.contains(needle.trim()),
            _ => self.folded.contains(&needle),
        }
    }

    /// Returns how `keyword` is covered, or `None` when it is missing.
    pub fn match_keyword(&self, keyword: &str, kind: PhraseKind) -> Option<MatchKind> {
        if self.is_empty() {
            return None;
        }
        if self.contains_phrase(keyword) {
            return Some(MatchKind::Exact);
        }
        if is_compound(keyword) && self.contains_phrase(&closed_form(keyword)) {
            return Some(MatchKind::Compound);
        }
        if kind == PhraseKind::Bigram {
            let mut words = keyword.split(' ');
            if let (Some(first), Some(second)) = (words.next(), words.next()) {
                if self.contains_word_or_compound(first) && self.contains_word_or_compound(second)
                {
                    return Some(MatchKind::Constituents);
                }
            }
        }
        None
    }

    fn contains_word_or_compound(&self, word: &str) -> bool {
        self.contains_phrase(word) || (is_compound(word) && self.contains_phrase(&closed_form(word)))
    }
}

fn is_compound(keyword: &str) -> bool {
    keyword.contains(|c: char| c == '-' || c == '.')
}

fn closed_form(keyword: &str) -> String {
    keyword.replace(|c: char| c == '-' || c == '.', "")
}

/// Classifies every ranked keyword as covered or missing in `document_text`.
/// An empty document classifies everything as missing.
pub fn match_coverage(ranked: &RankedKeywordList, document_text: &str) -> CoverageResult {
    let index = DocumentIndex::new(document_text);
    let mut result = CoverageResult::default();

    for candidate in ranked.iter() {
        match index.match_keyword(&candidate.keyword, candidate.kind) {
            Some(matched_by) => result.covered.push(CoveredKeyword {
                candidate: candidate.clone(),
                matched_by,
            }),
            None => result.missing.push(candidate.clone()),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::ranker::{rank_candidates, CandidateSource};
    use crate::keywords::settings::KeywordSettings;
    use crate::keywords::tokenizer::tokenize;
    use proptest::prelude::*;

    fn missing_keywords(result: &CoverageResult) -> Vec<&str> {
        result.missing.iter().map(|c| c.keyword.as_str()).collect()
    }

    fn ranked(keywords: &[(&str, PhraseKind)]) -> RankedKeywordList {
        RankedKeywordList::new(
            keywords
                .iter()
                .enumerate()
                .map(|(i, (keyword, kind))| Candidate {
                    keyword: keyword.to_string(),
                    kind: *kind,
                    score: 1.0 - i as f64 * 0.01,
                    occurrences: 1,
                    first_position: i,
                    source: CandidateSource::Heuristic,
                })
                .collect(),
        )
    }

    #[test]
    fn test_fold_collapses_case_and_separators() {
        assert_eq!(fold_for_matching("Full-Stack  Dev/Ops"), " full stack dev ops ");
        assert_eq!(fold_for_matching("C++ & C#"), " c++ c# ");
        assert_eq!(fold_for_matching("   "), "");
    }

    #[test]
    fn test_case_difference_is_covered() {
        let list = ranked(&[("kubernetes", PhraseKind::Unigram)]);
        let result = match_coverage(&list, "Deployed services on kubernetes clusters");
        assert_eq!(result.covered.len(), 1);
        assert!(result.missing.is_empty());

        let index = DocumentIndex::new("Ran KUBERNETES in prod");
        assert_eq!(
            index.match_keyword("kubernetes", PhraseKind::Unigram),
            Some(MatchKind::Exact)
        );
    }

    #[test]
    fn test_hyphen_and_space_are_interchangeable() {
        let list = ranked(&[("full-stack", PhraseKind::Unigram)]);
        let result = match_coverage(&list, "Experienced full stack engineer");
        assert_eq!(result.covered.len(), 1);
        assert_eq!(result.covered[0].matched_by, MatchKind::Exact);

        let reverse = ranked(&[("full stack", PhraseKind::Bigram)]);
        let result = match_coverage(&reverse, "Full-Stack engineer");
        assert_eq!(result.covered[0].matched_by, MatchKind::Exact);
    }

    #[test]
    fn test_closed_compound_form_is_covered() {
        let index = DocumentIndex::new("fullstack developer");
        assert_eq!(
            index.match_keyword("full-stack", PhraseKind::Unigram),
            Some(MatchKind::Compound)
        );
    }

    #[test]
    fn test_dotted_names_match_spaced_and_closed_forms() {
        let index = DocumentIndex::new("Built APIs in Node.js; some NodeJS tooling");
        assert_eq!(
            index.match_keyword("node.js", PhraseKind::Unigram),
            Some(MatchKind::Exact)
        );
        let closed = DocumentIndex::new("nodejs services");
        assert_eq!(
            closed.match_keyword("node.js", PhraseKind::Unigram),
            Some(MatchKind::Compound)
        );
    }

    #[test]
    fn test_bigram_constituents_cover_phrase() {
        let index = DocumentIndex::new("Distributed tracing across several systems");
        assert_eq!(
            index.match_keyword("distributed systems", PhraseKind::Bigram),
            Some(MatchKind::Constituents)
        );
        assert_eq!(
            index.match_keyword("distributed caching", PhraseKind::Bigram),
            None
        );
    }

    #[test]
    fn test_matching_respects_word_boundaries() {
        let index = DocumentIndex::new("Going forward we are ongoing with golang");
        assert_eq!(index.match_keyword("go", PhraseKind::Unigram), None);
        assert_eq!(
            index.match_keyword("golang", PhraseKind::Unigram),
            Some(MatchKind::Exact)
        );
        let index = DocumentIndex::new("javascript");
        assert_eq!(index.match_keyword("java", PhraseKind::Unigram), None);
    }

    #[test]
    fn test_tech_tokens_match_exactly() {
        let index = DocumentIndex::new(r"\item Modern C++ and C\# services");
        assert_eq!(
            index.match_keyword("c++", PhraseKind::Unigram),
            Some(MatchKind::Exact)
        );
        assert_eq!(
            index.match_keyword("c#", PhraseKind::Unigram),
            Some(MatchKind::Exact)
        );
    }

    #[test]
    fn test_latex_markup_does_not_hide_words() {
        let index = DocumentIndex::new(r"\textbf{Terraform} and \emph{AWS}");
        assert!(index.contains_phrase("terraform"));
        assert!(index.contains_phrase("aws"));
    }

    #[test]
    fn test_empty_document_marks_everything_missing() {
        let list = ranked(&[
            ("rust", PhraseKind::Unigram),
            ("distributed systems", PhraseKind::Bigram),
        ]);
        let result = match_coverage(&list, "   ");
        assert!(result.covered.is_empty());
        assert_eq!(missing_keywords(&result), vec!["rust", "distributed systems"]);
        assert_eq!(result.coverage_ratio(), 0.0);
    }

    #[test]
    fn test_partitions_preserve_rank_order() {
        let list = ranked(&[
            ("rust", PhraseKind::Unigram),
            ("kafka", PhraseKind::Unigram),
            ("tokio", PhraseKind::Unigram),
            ("redis", PhraseKind::Unigram),
        ]);
        let result = match_coverage(&list, "rust and tokio");
        let covered: Vec<&str> = result
            .covered
            .iter()
            .map(|c| c.candidate.keyword.as_str())
            .collect();
        assert_eq!(covered, vec!["rust", "tokio"]);
        assert_eq!(missing_keywords(&result), vec!["kafka", "redis"]);
        assert_eq!(result.coverage_ratio(), 0.5);
    }

    proptest! {
        #[test]
        fn prop_partition_is_complete_and_disjoint(
            job in "[a-z ,.\\-]{0,160}",
            doc in "[a-z ,.\\-]{0,160}",
        ) {
            let settings = KeywordSettings::default();
            let list = rank_candidates(&tokenize(&job, &settings.stopwords), &[], &settings);
            let result = match_coverage(&list, &doc);

            let covered: HashSet<&str> =
                result.covered.iter().map(|c| c.candidate.keyword.as_str()).collect();
            let missing: HashSet<&str> = missing_keywords(&result).into_iter().collect();
            let all: HashSet<&str> = list.keywords().into_iter().collect();

            prop_assert!(covered.is_disjoint(&missing));
            let union: HashSet<&str> = covered.union(&missing).copied().collect();
            prop_assert_eq!(union, all);
            prop_assert_eq!(result.covered.len() + result.missing.len(), list.len());
        }
    }
}
