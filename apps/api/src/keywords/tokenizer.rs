//! Tokenizer / normalizer: raw text into normalized unigram and bigram phrases.
//!
//! Tokens are lowercase runs of alphanumerics. Internal hyphens survive
//! ("full-stack"), as do trailing `+`/`#` runs ("c++", "c#"), dots between
//! two alphanumerics ("node.js", "asp.net") and internal apostrophes
//! ("you'll", later removed as stopwords). Everything else is a separator.
//! Clause punctuation and line breaks additionally break bigram adjacency.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::keywords::vocabulary::StopwordSet;

/// Tokens shorter than this are noise.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Candidates are one or two tokens long.
pub const MAX_PHRASE_TOKENS: usize = 2;

const CLAUSE_BREAKS: &[char] = &[
    '.', ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '|', '\n', '•', '·',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhraseKind {
    Unigram,
    Bigram,
}

/// A single token and where it sits in the raw token stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// Index among all tokens, stopwords included.
    pub position: usize,
    /// True when clause punctuation separates this token from the previous one.
    pub clause_start: bool,
}

/// A normalized phrase with its first position and raw occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenizedPhrase {
    pub phrase: String,
    pub kind: PhraseKind,
    pub first_position: usize,
    pub occurrences: u32,
}

/// Tokenizer output: phrases in first-occurrence order plus the size of the
/// token stream, which the ranker uses to normalize positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    pub phrases: Vec<TokenizedPhrase>,
    pub token_count: usize,
}

/// Splits text into lowercase tokens. Empty or whitespace-only input yields no tokens.
pub fn split_tokens(text: &str) -> Vec<Token> {
    let chars: Vec<char> = text
        .to_lowercase()
        .chars()
        .map(|c| if c == '\u{2019}' { '\'' } else { c })
        .collect();
    let mut splitter = Splitter::default();

    for (i, &c) in chars.iter().enumerate() {
        let last = splitter.current.chars().last();

        if c.is_alphanumeric() {
            if matches!(last, Some('+') | Some('#')) {
                splitter.flush();
            }
            splitter.current.push(c);
        } else if c == '-' || c == '\'' {
            if last.is_some_and(char::is_alphanumeric) {
                splitter.current.push(c);
            } else {
                splitter.flush();
            }
        } else if c == '+' || c == '#' {
            if last.is_some_and(|l| l.is_alphanumeric() || l == '+' || l == '#') {
                splitter.current.push(c);
            } else {
                splitter.flush();
            }
        } else if c == '.'
            && last.is_some_and(char::is_alphanumeric)
            && chars.get(i + 1).is_some_and(|next| next.is_alphanumeric())
        {
            splitter.current.push(c);
        } else if CLAUSE_BREAKS.contains(&c) {
            splitter.flush();
            splitter.pending_break = true;
        } else {
            splitter.flush();
        }
    }
    splitter.flush();
    splitter.tokens
}

#[derive(Default)]
struct Splitter {
    tokens: Vec<Token>,
    current: String,
    pending_break: bool,
}

impl Splitter {
    fn flush(&mut self) {
        let text = trim_token(&self.current);
        if !text.is_empty() {
            self.tokens.push(Token {
                text: text.to_string(),
                position: self.tokens.len(),
                clause_start: self.pending_break,
            });
            self.pending_break = false;
        }
        self.current.clear();
    }
}

/// Drops trailing hyphens, apostrophes and possessive `'s`.
fn trim_token(raw: &str) -> &str {
    let mut token = raw;
    loop {
        let trimmed = token
            .strip_suffix("'s")
            .unwrap_or(token)
            .trim_end_matches(|c: char| c == '-' || c == '\'');
        if trimmed.len() == token.len() {
            return token;
        }
        token = trimmed;
    }
}

/// Normalizes an arbitrary phrase the same way tokenized text is normalized:
/// lowercase, punctuation stripped, whitespace collapsed to single spaces.
/// Idempotent. May return an empty string.
pub fn normalize_phrase(phrase: &str) -> String {
    split_tokens(phrase)
        .into_iter()
        .map(|t| t.text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A token is keyword material when it is long enough, not a stopword, and
/// carries at least one letter (pure numbers and "5+" are dropped).
pub fn is_keyword_token(token: &str, stopwords: &StopwordSet) -> bool {
    token.chars().count() >= MIN_TOKEN_CHARS
        && token.chars().any(char::is_alphabetic)
        && !stopwords.contains(token)
}

/// Tokenizes raw text into unigram and bigram phrases with occurrence counts.
///
/// Bigrams are formed from the adjacent-token window before stopword removal,
/// so "python and rust" never yields "python rust". Both ends of a bigram must
/// pass the same stopword and length rules as unigrams.
pub fn tokenize(raw_text: &str, stopwords: &StopwordSet) -> TokenStream {
    let tokens = split_tokens(raw_text);
    let mut phrases: Vec<TokenizedPhrase> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, token) in tokens.iter().enumerate() {
        if !is_keyword_token(&token.text, stopwords) {
            continue;
        }
        record(
            &mut phrases,
            &mut index,
            token.text.clone(),
            PhraseKind::Unigram,
            token.position,
        );

        if let Some(next) = tokens.get(i + 1) {
            if !next.clause_start && is_keyword_token(&next.text, stopwords) {
                record(
                    &mut phrases,
                    &mut index,
                    format!("{} {}", token.text, next.text),
                    PhraseKind::Bigram,
                    token.position,
                );
            }
        }
    }

    TokenStream {
        phrases,
        token_count: tokens.len(),
    }
}

fn record(
    phrases: &mut Vec<TokenizedPhrase>,
    index: &mut HashMap<String, usize>,
    phrase: String,
    kind: PhraseKind,
    position: usize,
) {
    match index.get(&phrase) {
        Some(&i) => phrases[i].occurrences += 1,
        None => {
            index.insert(phrase.clone(), phrases.len());
            phrases.push(TokenizedPhrase {
                phrase,
                kind,
                first_position: position,
                occurrences: 1,
            });
        }
    }
}
