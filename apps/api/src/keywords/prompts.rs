// LLM prompt constants for keyword augmentation.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_PARAPHRASE_INSTRUCTION};

/// Role line of the augmentation system prompt.
const AUGMENT_ROLE: &str = "You analyse job descriptions and list the most relevant skills, \
    tools, and domain keywords. Return a short JSON object with a `keywords` array.";

pub fn augment_system_prompt() -> String {
    format!("{AUGMENT_ROLE} {JSON_ONLY_SYSTEM}")
}

/// Augmentation prompt template. Replace `{max_keywords}` and `{job_text}` before sending.
pub const AUGMENT_PROMPT_TEMPLATE: &str = r#"Extract the top focus keywords the resume should contain.
Include up to {max_keywords} distinct items.
Prefer short skill or tool names of one or two words.
Skip duplicates, generic stop words, and company names unless vital.

Return a JSON object with this EXACT schema:
{"keywords": ["kubernetes", "distributed systems"]}

Job description:
{job_text}"#;

/// Appended when resume text is available.
pub const AUGMENT_RESUME_SECTION: &str = r#"

Existing resume content:
{resume_text}"#;

pub fn build_augment_prompt(job_text: &str, resume_text: Option<&str>, max_keywords: usize) -> String {
    let mut prompt = AUGMENT_PROMPT_TEMPLATE
        .replace("{max_keywords}", &max_keywords.to_string())
        .replace("{job_text}", job_text.trim());

    if let Some(resume) = resume_text.filter(|r| !r.trim().is_empty()) {
        prompt.push_str(&AUGMENT_RESUME_SECTION.replace("{resume_text}", resume.trim()));
        prompt.push_str("\n\n");
        prompt.push_str(NO_PARAPHRASE_INSTRUCTION);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_fills_placeholders() {
        let prompt = build_augment_prompt("  Rust and Kafka  ", None, 50);
        assert!(prompt.contains("up to 50 distinct items"));
        assert!(prompt.ends_with("Job description:\nRust and Kafka"));
        assert!(!prompt.contains("{job_text}"));
        assert!(!prompt.contains("Existing resume content"));
    }

    #[test]
    fn test_prompt_includes_resume_when_present() {
        let prompt = build_augment_prompt("Rust", Some("Built tokio services"), 10);
        assert!(prompt.contains("Existing resume content:\nBuilt tokio services"));
        assert!(prompt.contains(NO_PARAPHRASE_INSTRUCTION));
    }

    #[test]
    fn test_blank_resume_is_omitted() {
        let prompt = build_augment_prompt("Rust", Some("   "), 10);
        assert!(!prompt.contains("Existing resume content"));
    }

    #[test]
    fn test_system_prompt_demands_json() {
        assert!(augment_system_prompt().contains("valid JSON only"));
    }
}
