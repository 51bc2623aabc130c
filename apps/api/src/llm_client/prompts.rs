// Shared prompt fragments. Each service that calls the model keeps its own
// prompts.rs alongside it and composes these in.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps the model from paraphrasing reference material it is shown.
pub const NO_PARAPHRASE_INSTRUCTION: &str = "\
    Reference material is provided for context only. Do NOT rewrite, summarize, \
    or quote it back. Return only what the task asks for.";
