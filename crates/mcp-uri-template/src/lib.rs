//! A tiny RFC 6570 subset: templates built from literal path segments and
//! `{var}` placeholders, where a placeholder matches a maximal run of
//! non-`/` characters (spec §4.7). No crate dependencies — parsing a
//! template is a handful of string operations, not a job for a general
//! URI-template library.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum SegmentToken {
    Literal(String),
    Var(String),
}

fn parse_segment(segment: &str) -> Vec<SegmentToken> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = segment.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '{' {
            if !literal.is_empty() {
                tokens.push(SegmentToken::Literal(std::mem::take(&mut literal)));
            }
            let mut name = String::new();
            for c2 in chars.by_ref() {
                if c2 == '}' {
                    break;
                }
                name.push(c2);
            }
            tokens.push(SegmentToken::Var(name));
        } else {
            literal.push(c);
        }
    }
    if !literal.is_empty() {
        tokens.push(SegmentToken::Literal(literal));
    }
    tokens
}

/// Match `tokens` against `text` greedily, backtracking a variable's span
/// only as far as needed for any trailing literal to still match.
fn match_segment_tokens(tokens: &[SegmentToken], text: &str) -> Option<Vec<(String, String)>> {
    match tokens.split_first() {
        None => {
            if text.is_empty() {
                Some(Vec::new())
            } else {
                None
            }
        }
        Some((SegmentToken::Literal(lit), rest)) => {
            let stripped = text.strip_prefix(lit.as_str())?;
            match_segment_tokens(rest, stripped)
        }
        Some((SegmentToken::Var(name), rest)) => {
            for take in (0..=text.len()).rev() {
                if !text.is_char_boundary(take) {
                    continue;
                }
                let (candidate, remainder) = text.split_at(take);
                if candidate.is_empty() {
                    // RFC 6570 simple-string expansion requires at least one
                    // character; an empty var match is never useful here.
                    continue;
                }
                if let Some(mut bindings) = match_segment_tokens(rest, remainder) {
                    bindings.insert(0, (name.clone(), candidate.to_string()));
                    return Some(bindings);
                }
            }
            None
        }
    }
}

/// Extract the `{var} -> value` bindings that make `uri` match `template`,
/// or `None` if it doesn't match. Segment counts (split on `/`) must be
/// equal; this subset has no multi-segment wildcard.
pub fn extract(uri: &str, template: &str) -> Option<HashMap<String, String>> {
    let uri_segments: Vec<&str> = uri.split('/').collect();
    let template_segments: Vec<&str> = template.split('/').collect();
    if uri_segments.len() != template_segments.len() {
        return None;
    }

    let mut bindings = HashMap::new();
    for (uri_seg, template_seg) in uri_segments.iter().zip(template_segments.iter()) {
        let tokens = parse_segment(template_seg);
        let seg_bindings = match_segment_tokens(&tokens, uri_seg)?;
        for (name, value) in seg_bindings {
            bindings.insert(name, value);
        }
    }
    Some(bindings)
}

pub fn matches(uri: &str, template: &str) -> bool {
    extract(uri, template).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn matches_single_segment_variable() {
        let vars = extract("/users/42", "/users/{id}");
        assert_eq!(vars, Some(HashMap::from([("id".to_string(), "42".to_string())])));
    }

    #[test]
    fn rejects_extra_segment() {
        assert!(!matches("/users/42/extra", "/users/{id}"));
    }

    #[test]
    fn variable_does_not_cross_slash_boundary() {
        assert!(!matches("/users/42/43", "/users/{id}"));
    }

    #[test]
    fn mixed_literal_and_variable_in_one_segment() {
        let vars = extract("/files/report.pdf", "/files/{name}.pdf");
        assert_eq!(
            vars,
            Some(HashMap::from([("name".to_string(), "report".to_string())]))
        );
    }

    #[test]
    fn multiple_variables_collected_across_segments() {
        let vars = extract("/a/1/b/2", "/a/{x}/b/{y}");
        assert_eq!(
            vars,
            Some(HashMap::from([
                ("x".to_string(), "1".to_string()),
                ("y".to_string(), "2".to_string()),
            ]))
        );
    }

    #[test]
    fn round_trip_extract_then_substitute_recovers_uri() -> Result<(), String> {
        let uri = "/repos/octocat/hello-world/issues/9";
        let template = "/repos/{owner}/{repo}/issues/{number}";
        let vars = extract(uri, template).ok_or("template should have matched")?;

        let mut substituted = template.to_string();
        for (name, value) in &vars {
            substituted = substituted.replace(&format!("{{{name}}}"), value);
        }
        assert_eq!(substituted, uri);
        Ok(())
    }

    #[test]
    fn no_variables_requires_exact_literal_match() {
        assert!(matches("/healthz", "/healthz"));
        assert!(!matches("/healthz/", "/healthz"));
    }
}
