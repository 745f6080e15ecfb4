//! Error-signature normalization
//!
//! Two failures share a signature when their error text differs only in
//! numeric literals, stack frames, or whitespace. Signatures are computed
//! at analysis time; the raw error text in the history stays verbatim.

/// Normalize error text into a clustering signature: stack-trace frames
/// dropped, runs of digits collapsed to `N`, whitespace collapsed.
pub fn normalize_signature(error: &str) -> String {
    let mut kept = Vec::new();
    for line in error.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_stack_frame(trimmed) {
            continue;
        }
        kept.push(trimmed);
    }

    let joined = kept.join(" ");
    let mut out = String::with_capacity(joined.len());
    let mut in_digits = false;
    for c in joined.chars() {
        if c.is_ascii_digit() {
            if !in_digits {
                out.push('N');
                in_digits = true;
            }
        } else {
            in_digits = false;
            out.push(c);
        }
    }

    let collapsed = out.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate(&collapsed, 200)
}

fn is_stack_frame(line: &str) -> bool {
    line.starts_with("at ")
        || line.starts_with("File \"")
        || line.starts_with("#")
        || line.starts_with("---")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_collapse() {
        let a = normalize_signature("TimeoutError: waited 5000ms for #submit");
        let b = normalize_signature("TimeoutError: waited 12000ms for #submit");
        assert_eq!(a, b);
        assert_eq!(a, "TimeoutError: waited Nms for #submit");
    }

    #[test]
    fn test_stack_frames_dropped() {
        let error = "AssertionError: expected 2 to equal 3\n  at Context.<anonymous> (login.spec.ts:42:11)\n  at processTicksAndRejections (node:internal/process)";
        let sig = normalize_signature(error);
        assert_eq!(sig, "AssertionError: expected N to equal N");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(
            normalize_signature("boom   happened\t badly"),
            "boom happened badly"
        );
    }

    #[test]
    fn test_long_text_truncated() {
        let long = "x".repeat(500);
        assert_eq!(normalize_signature(&long).len(), 200);
    }

    #[test]
    fn test_distinct_errors_stay_distinct() {
        let a = normalize_signature("TimeoutError: waiting for selector");
        let b = normalize_signature("ConnectionError: ECONNREFUSED");
        assert_ne!(a, b);
    }
}
