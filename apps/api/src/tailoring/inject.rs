//! Injection Formatter: embeds the gap keywords in a LaTeX résumé as a white-text block.
//!
//! The block sits between two comment markers so a later run can find and replace
//! it. It is placed before the last `\end{document}` so LaTeX actually typesets it.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

pub const MARKER_START: &str = "% resume_helper keywords start";
pub const MARKER_END: &str = "% resume_helper keywords end";

const END_DOCUMENT: &str = "\\end{document}";

static HIDDEN_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"(?s){}.*?{}\n?",
        regex::escape(MARKER_START),
        regex::escape(MARKER_END)
    );
    Regex::new(&pattern).expect("hidden block pattern is a valid regex")
});

static COLOR_PACKAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\\usepackage\s*(?:\[[^\]]*\])?\s*\{[^}]*\b(?:xcolor|color)\b[^}]*\}")
        .expect("color package pattern is a valid regex")
});

pub const MISSING_COLOR_WARNING: &str =
    "Add \\usepackage{xcolor} to your preamble so the hidden keywords render correctly.";
pub const MISSING_END_DOCUMENT_WARNING: &str =
    "Could not find \\end{document} in your LaTeX file. Keywords appended at the end.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Injection {
    pub updated: String,
    pub modified: bool,
    pub warnings: Vec<String>,
}

/// Escapes LaTeX special characters so a keyword typesets literally.
pub fn escape_latex(keyword: &str) -> String {
    let mut out = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '#' | '$' | '%' | '&' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// The marker-delimited block for `keywords`, newline-terminated.
pub fn build_hidden_block(keywords: &[String], generated_at: DateTime<Utc>) -> String {
    let blob = keywords
        .iter()
        .map(|k| escape_latex(k))
        .collect::<Vec<_>>()
        .join(" ");

    [
        MARKER_START.to_string(),
        format!("% generated {}", generated_at.format("%Y-%m-%d %H:%M UTC")),
        "\\par".to_string(),
        format!("{{\\color{{white}} {blob}}}"),
        MARKER_END.to_string(),
    ]
    .join("\n")
        + "\n"
}

/// Removes every previously injected block. Text without a block is returned as is.
pub fn strip_hidden_block(text: &str) -> String {
    if !HIDDEN_BLOCK_RE.is_match(text) {
        return text.to_string();
    }
    let cleaned = HIDDEN_BLOCK_RE.replace_all(text, "");
    format!("{}\n", cleaned.trim_end())
}

/// Replaces any existing block with one for `keywords`. An empty keyword list only
/// removes the old block.
pub fn inject_hidden_keywords(
    resume: &str,
    keywords: &[String],
    generated_at: DateTime<Utc>,
) -> Injection {
    let cleaned = strip_hidden_block(resume);
    let mut warnings = Vec::new();

    if keywords.is_empty() {
        return Injection {
            modified: cleaned != resume,
            updated: cleaned,
            warnings,
        };
    }

    if !COLOR_PACKAGE_RE.is_match(resume) {
        warnings.push(MISSING_COLOR_WARNING.to_string());
    }

    let block = build_hidden_block(keywords, generated_at);
    let updated = match cleaned.rfind(END_DOCUMENT) {
        Some(idx) => {
            let (before, rest) = cleaned.split_at(idx);
            let after = &rest[END_DOCUMENT.len()..];
            format!("{}\n\n{block}\n{END_DOCUMENT}{after}", before.trim_end())
        }
        None => {
            warnings.push(MISSING_END_DOCUMENT_WARNING.to_string());
            format!("{}\n\n{block}", cleaned.trim_end())
        }
    };

    debug!(keywords = keywords.len(), "Injected hidden keyword block");
    Injection {
        updated,
        modified: true,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RESUME: &str = "\\documentclass{article}\n\\usepackage{xcolor}\n\\begin{document}\nHello\n\\end{document}\n";

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap()
    }

    fn kws(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_block_layout() {
        let block = build_hidden_block(&kws(&["kafka", "c#"]), at());
        assert_eq!(
            block,
            "% resume_helper keywords start\n% generated 2024-05-06 07:08 UTC\n\\par\n{\\color{white} kafka c\\#}\n% resume_helper keywords end\n"
        );
    }

    #[test]
    fn test_escape_latex_specials() {
        assert_eq!(escape_latex("r&d_100%"), "r\\&d\\_100\\%");
        assert_eq!(escape_latex("a~b^c\\d"), "a\\textasciitilde{}b\\textasciicircum{}c\\textbackslash{}d");
        assert_eq!(escape_latex("c++"), "c++");
    }

    #[test]
    fn test_inject_before_end_document() {
        let injection = inject_hidden_keywords(RESUME, &kws(&["kafka"]), at());
        assert!(injection.modified);
        assert!(injection.warnings.is_empty());

        let block_at = injection.updated.find(MARKER_START).unwrap();
        let end_at = injection.updated.rfind(END_DOCUMENT).unwrap();
        assert!(block_at < end_at);
        assert!(injection.updated.starts_with("\\documentclass{article}"));
        assert!(injection.updated.ends_with("\\end{document}\n"));
    }

    #[test]
    fn test_reinjection_replaces_previous_block() {
        let first = inject_hidden_keywords(RESUME, &kws(&["kafka"]), at());
        let second = inject_hidden_keywords(&first.updated, &kws(&["flink"]), at());
        assert_eq!(second.updated.matches(MARKER_START).count(), 1);
        assert!(second.updated.contains("flink"));
        assert!(!second.updated.contains("kafka"));
    }

    #[test]
    fn test_empty_keywords_only_remove_block() {
        let untouched = inject_hidden_keywords(RESUME, &[], at());
        assert!(!untouched.modified);
        assert_eq!(untouched.updated, RESUME);

        let injected = inject_hidden_keywords(RESUME, &kws(&["kafka"]), at());
        let removed = inject_hidden_keywords(&injected.updated, &[], at());
        assert!(removed.modified);
        assert!(!removed.updated.contains(MARKER_START));
    }

    #[test]
    fn test_missing_end_document_appends_with_warning() {
        let injection = inject_hidden_keywords("\\usepackage{xcolor}\nHello", &kws(&["go"]), at());
        assert!(injection.updated.ends_with(&format!("{MARKER_END}\n")));
        assert_eq!(injection.warnings, vec![MISSING_END_DOCUMENT_WARNING.to_string()]);
    }

    #[test]
    fn test_color_package_detection() {
        let plain = "\\begin{document}\n\\end{document}";
        let injection = inject_hidden_keywords(plain, &kws(&["go"]), at());
        assert_eq!(injection.warnings, vec![MISSING_COLOR_WARNING.to_string()]);

        let with_options = "\\usepackage[dvipsnames]{xcolor}\n\\begin{document}\n\\end{document}";
        assert!(inject_hidden_keywords(with_options, &kws(&["go"]), at())
            .warnings
            .is_empty());

        let listed = "\\usepackage{graphicx,color}\n\\begin{document}\n\\end{document}";
        assert!(inject_hidden_keywords(listed, &kws(&["go"]), at())
            .warnings
            .is_empty());
    }

    #[test]
    fn test_strip_leaves_plain_text_alone() {
        assert_eq!(strip_hidden_block("no block here"), "no block here");
    }
}
