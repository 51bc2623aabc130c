//! Keyword Ranker: scores tokenized phrases and produces a `RankedKeywordList`.
//!
//! Score = weighted sum of four signals, each in [0, 1]:
//! - frequency:     occurrences / max occurrences in the set
//! - position:      1 - first_position / token_count (early terms score higher)
//! - phrase length: bigrams earn `phrase_length * frequency` on top
//! - dictionary:    1.0 for a vocabulary term, 0.5 for a bigram with a vocabulary word
//!
//! Ordering is score descending, then earliest position, then alphabetical.
//! Externally suggested phrases enter the pool through `Candidate::reconcile`.
//! With `collapse_subsumed` set, a unigram ranked below a bigram containing it
//! is dropped before the cut.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::keywords::settings::KeywordSettings;
use crate::keywords::tokenizer::{
    is_keyword_token, normalize_phrase, PhraseKind, TokenStream, MAX_PHRASE_TOKENS,
};
use crate::keywords::vocabulary::StopwordSet;

/// Where a candidate came from. Merging two sources yields `Both`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Heuristic,
    Augmented,
    Both,
}

impl CandidateSource {
    pub fn merge(self, other: CandidateSource) -> CandidateSource {
        if self == other {
            self
        } else {
            CandidateSource::Both
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Normalized phrase, never empty.
    pub keyword: String,
    pub kind: PhraseKind,
    pub score: f64,
    /// Raw occurrences in the source text (0 for augmentation-only phrases).
    pub occurrences: u32,
    /// Token index of first occurrence; augmentation-only phrases sort after all text tokens.
    pub first_position: usize,
    pub source: CandidateSource,
}

impl Candidate {
    /// Merges two proposals for the same normalized phrase: the higher score
    /// wins, provenance is merged, and the earliest position and the larger
    /// occurrence count are kept.
    pub fn reconcile(self, other: Candidate) -> Candidate {
        debug_assert_eq!(self.keyword, other.keyword);
        let source = self.source.merge(other.source);
        let occurrences = self.occurrences.max(other.occurrences);
        let first_position = self.first_position.min(other.first_position);
        let winner = if other.score > self.score { other } else { self };
        Candidate {
            source,
            occurrences,
            first_position,
            ..winner
        }
    }
}

/// Canonical rank order: score desc, position asc, keyword asc.
pub fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.first_position.cmp(&b.first_position))
        .then_with(|| a.keyword.cmp(&b.keyword))
}

/// Candidates in non-increasing score order with deterministic tie-breaking.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RankedKeywordList {
    candidates: Vec<Candidate>,
}

impl RankedKeywordList {
    /// Sorts `candidates` into rank order. Duplicate keywords are reconciled.
    pub fn new(candidates: Vec<Candidate>) -> Self {
        let mut candidates = dedup_by_keyword(candidates);
        candidates.sort_by(rank_order);
        Self { candidates }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    pub fn keywords(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.keyword.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    fn truncated(mut self, max: usize) -> Self {
        self.candidates.truncate(max);
        self
    }

    /// Drops each unigram that is a word of a higher-ranked bigram.
    fn without_subsumed_unigrams(mut self) -> Self {
        let mut bigram_words: HashSet<String> = HashSet::new();
        self.candidates.retain(|candidate| match candidate.kind {
            PhraseKind::Bigram => {
                bigram_words.extend(candidate.keyword.split(' ').map(str::to_string));
                true
            }
            PhraseKind::Unigram => !bigram_words.contains(&candidate.keyword),
        });
        self
    }
}

/// Ranks tokenized phrases, merging any external suggestions before the cut.
///
/// Never fails: any token stream, including an empty one, produces a list.
pub fn rank_candidates(
    stream: &TokenStream,
    suggestions: &[String],
    settings: &KeywordSettings,
) -> RankedKeywordList {
    let weights = &settings.weights;
    let max_occurrences = stream
        .phrases
        .iter()
        .map(|p| p.occurrences)
        .max()
        .unwrap_or(0);

    let mut pool: Vec<Candidate> = stream
        .phrases
        .iter()
        .map(|phrase| {
            let frequency = if max_occurrences == 0 {
                0.0
            } else {
                f64::from(phrase.occurrences) / f64::from(max_occurrences)
            };
            let position = if stream.token_count == 0 {
                0.0
            } else {
                1.0 - phrase.first_position as f64 / stream.token_count as f64
            };
            let length = match phrase.kind {
                PhraseKind::Bigram => 1.0,
                PhraseKind::Unigram => 0.0,
            };
            let dictionary = settings.vocabulary.bonus(&phrase.phrase);

            let score = weights.frequency * frequency
                + weights.position * position
                + weights.phrase_length * length * frequency
                + weights.dictionary * dictionary;

            Candidate {
                keyword: phrase.phrase.clone(),
                kind: phrase.kind,
                score,
                occurrences: phrase.occurrences,
                first_position: phrase.first_position,
                source: CandidateSource::Heuristic,
            }
        })
        .collect();

    let heuristic_count = pool.len();
    pool.extend(augmented_candidates(
        suggestions,
        stream.token_count,
        weights.dictionary,
        &settings.stopwords,
    ));

    let mut ranked = RankedKeywordList::new(pool);
    if settings.collapse_subsumed {
        ranked = ranked.without_subsumed_unigrams();
    }
    let ranked = ranked.truncated(settings.max_candidates);
    debug!(
        heuristic = heuristic_count,
        suggested = suggestions.len(),
        kept = ranked.len(),
        "Ranked keyword candidates"
    );
    ranked
}

/// Normalizes suggestions identically to tokenized text and scores each at the
/// dictionary-bonus baseline. A suggestion is dropped when it is empty, longer
/// than `MAX_PHRASE_TOKENS`, or has a token the tokenizer would reject
/// (stopword, too short, no letters).
fn augmented_candidates(
    suggestions: &[String],
    token_count: usize,
    baseline: f64,
    stopwords: &StopwordSet,
) -> Vec<Candidate> {
    suggestions
        .iter()
        .filter_map(|raw| {
            let keyword = normalize_phrase(raw);
            let words: Vec<&str> = keyword.split(' ').filter(|w| !w.is_empty()).collect();
            let kind = match words.len() {
                1 => PhraseKind::Unigram,
                n if n == MAX_PHRASE_TOKENS => PhraseKind::Bigram,
                _ => {
                    debug!(suggestion = %raw, "Dropping suggestion outside one-to-two tokens");
                    return None;
                }
            };
            if !words.iter().all(|w| is_keyword_token(w, stopwords)) {
                debug!(suggestion = %raw, "Dropping suggestion with a non-keyword token");
                return None;
            }
            Some((keyword, kind))
        })
        .enumerate()
        .map(|(i, (keyword, kind))| Candidate {
            keyword,
            kind,
            score: baseline,
            occurrences: 0,
            first_position: token_count + i,
            source: CandidateSource::Augmented,
        })
        .collect()
}

fn dedup_by_keyword(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut merged: Vec<Candidate> = Vec::with_capacity(candidates.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        match index.get(&candidate.keyword) {
            Some(&i) => {
                let existing = merged[i].clone();
                merged[i] = existing.reconcile(candidate);
            }
            None => {
                index.insert(candidate.keyword.clone(), merged.len());
                merged.push(candidate);
            }
        }
    }
    merged
}
