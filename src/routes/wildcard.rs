//! `{name}` placeholder extraction.
//!
//! An identifier starts with an ASCII letter and continues with ASCII
//! letters, digits, or `_`. Anything else between braces is literal text.

/// Ordered identifiers of every `{identifier}` token in `text`,
/// duplicates included.
#[must_use]
pub fn extract(text: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match identifier_len(after) {
            Some(len) if after[len..].starts_with('}') => {
                names.push(after[..len].to_string());
                rest = &after[len + 1..];
            }
            _ => rest = after,
        }
    }

    names
}

/// The name bound by a path segment that is exactly `{identifier}`.
#[must_use]
pub fn segment_name(segment: &str) -> Option<&str> {
    let inner = segment.strip_prefix('{')?.strip_suffix('}')?;
    (identifier_len(inner) == Some(inner.len())).then_some(inner)
}

#[must_use]
pub fn placeholder(name: &str) -> String {
    format!("{{{name}}}")
}

fn identifier_len(s: &str) -> Option<usize> {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() => {}
        _ => return None,
    }
    let end = chars
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map_or(s.len(), |(i, _)| i);
    Some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_order_with_duplicates() {
        assert_eq!(
            extract("GET /users/{user_id}/posts/{post2}/{user_id}"),
            vec!["user_id", "post2", "user_id"]
        );
    }

    #[test]
    fn no_placeholders_is_empty() {
        assert!(extract("/plain/path").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn malformed_braces_are_literal() {
        assert!(extract("{1abc} {} {a-b} {open").is_empty());
        assert_eq!(extract("{{id}}"), vec!["id"]);
        assert_eq!(extract("{a{b}"), vec!["b"]);
    }

    #[test]
    fn segment_name_requires_whole_segment() {
        assert_eq!(segment_name("{id}"), Some("id"));
        assert_eq!(segment_name("x{id}"), None);
        assert_eq!(segment_name("{id}.json"), None);
        assert_eq!(segment_name("{9}"), None);
    }

    #[test]
    fn placeholder_wraps_name() {
        assert_eq!(placeholder("id"), "{id}");
    }
}
