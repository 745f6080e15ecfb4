//! Structural candidate generation
//!
//! Templates keyed to the element description, ordered from most specific
//! (test ids) to most generic (role tags inferred from keywords). All of
//! this is deterministic: the same description always yields the same
//! candidate list in the same order.

use std::collections::HashSet;

use crate::types::SelectorCandidate;

/// Build the structural candidate selectors for a description.
pub fn structural_candidates(description: &str) -> Vec<String> {
    let text = collapse_whitespace(description);
    let slug = slugify(&text);

    let mut candidates = vec![
        format!(r#"[data-testid*="{}"]"#, slug),
        format!(r#"[aria-label*="{}"]"#, text),
        format!(r#"text="{}""#, text),
        format!(r#"[title*="{}"]"#, text),
        format!(r#"[placeholder*="{}"]"#, text),
    ];
    candidates.extend(role_templates(&text).into_iter().map(String::from));
    candidates
}

/// Role-specific templates inferred from keywords in the description.
fn role_templates(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    let has = |kw: &str| lower.split_whitespace().any(|w| w == kw || w.contains(kw));

    let mut templates = Vec::new();
    if has("button") || has("btn") {
        templates.extend(["button", r#"[role="button"]"#]);
    }
    if has("input") || has("field") || has("textbox") {
        templates.extend(["input", r#"[role="textbox"]"#]);
    }
    if has("link") {
        templates.extend(["a", r#"[role="link"]"#]);
    }
    if has("checkbox") {
        templates.extend([r#"input[type="checkbox"]"#, r#"[role="checkbox"]"#]);
    }
    if has("select") || has("dropdown") {
        templates.extend(["select", r#"[role="combobox"]"#]);
    }
    templates
}

/// Drop duplicate selectors, keeping the first (highest-priority)
/// occurrence.
pub fn dedup_candidates(candidates: Vec<SelectorCandidate>) -> Vec<SelectorCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.selector.clone()))
        .collect()
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
