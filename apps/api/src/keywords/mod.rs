// Keyword extraction and gap analysis engine.
// Implements: tokenizer, ranker, coverage matcher, gap selector, augmentation merge.
// The core is synchronous and pure; only augmentation goes through llm_client.

pub mod augment;
pub mod coverage;
pub mod gap;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod ranker;
pub mod settings;
pub mod tokenizer;
pub mod vocabulary;

