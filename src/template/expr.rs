//! `{{ expression }}` placeholder scanning.
//!
//! An expression is a property path made of word characters, spaces, `.`,
//! `#`, `+`, `-`, `*` and `\`, optionally followed by `()` to mark a call.
//! Anything else between braces is left as literal text.

/// One distinct placeholder found in a template string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Exact text to substitute, braces included.
    pub raw: String,
    /// Trimmed expression between the braces.
    pub expression: String,
}

/// Distinct placeholders of `text`, in order of first appearance.
pub fn placeholders(text: &str) -> Vec<Placeholder> {
    let mut found: Vec<Placeholder> = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = text[cursor..].find("{{") {
        let open = cursor + offset;
        let Some(len) = text[open + 2..].find("}}") else {
            break;
        };
        let close = open + 2 + len;
        let inner = &text[open + 2..close];

        if is_expression(inner) && !inner.trim().is_empty() {
            let raw = &text[open..close + 2];
            if !found.iter().any(|p| p.raw == raw) {
                found.push(Placeholder {
                    raw: raw.to_string(),
                    expression: inner.trim().to_string(),
                });
            }
            cursor = close + 2;
        } else {
            cursor = open + 2;
        }
    }
    found
}

pub fn has_placeholders(text: &str) -> bool {
    !placeholders(text).is_empty()
}

fn is_expression(inner: &str) -> bool {
    let body = inner.strip_suffix("()").unwrap_or(inner);
    body.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '.' | '#' | '+' | '-' | '*' | '\\')
    })
}
