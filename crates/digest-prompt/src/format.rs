//! Brace-placeholder templates
//!
//! `{name}` marks a placeholder, `{{` and `}}` are literal braces. Anything else
//! inside braces (positional `{}`, `{0}`, format specs like `{data:>10}`,
//! attribute access like `{data.x}`) is rejected when the template is built.

use crate::{PromptError, PromptTemplate, Result};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A template using `{placeholder}` syntax
#[derive(Debug, Clone)]
pub struct FormatTemplate {
    name: String,
    source: String,
    segments: Vec<Segment>,
}

impl FormatTemplate {
    /// Parse a template
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::Malformed`] for unbalanced braces or invalid
    /// placeholder contents.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();
        let segments = parse(&name, &source)?;
        Ok(Self {
            name,
            source,
            segments,
        })
    }
}

impl PromptTemplate for FormatTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn placeholders(&self) -> BTreeSet<String> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(p) => Some(p.clone()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    fn render(&self, vars: &serde_json::Value) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());

        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(key) => {
                    let value = vars.get(key).ok_or_else(|| PromptError::MissingVariable {
                        name: self.name.clone(),
                        placeholder: key.clone(),
                    })?;
                    match value {
                        serde_json::Value::String(s) => out.push_str(s),
                        other => out.push_str(&other.to_string()),
                    }
                }
            }
        }

        Ok(out)
    }

    fn raw_template(&self) -> &str {
        &self.source
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn parse(name: &str, source: &str) -> Result<Vec<Segment>> {
    let malformed = |position: usize, detail: String| PromptError::Malformed {
        name: name.to_string(),
        position,
        detail,
    };

    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = source.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        match c {
            '{' => {
                if chars.next_if(|&(_, next)| next == '{').is_some() {
                    literal.push('{');
                    continue;
                }

                let mut key = String::new();
                let mut closed = false;
                for (inner_pos, inner) in chars.by_ref() {
                    match inner {
                        '}' => {
                            closed = true;
                            break;
                        }
                        '{' => {
                            return Err(malformed(inner_pos, "nested '{' in placeholder".into()));
                        }
                        _ => key.push(inner),
                    }
                }

                if !closed {
                    return Err(malformed(pos, "unclosed '{'".into()));
                }
                if !is_identifier(&key) {
                    return Err(malformed(pos, format!("invalid placeholder '{{{key}}}'")));
                }

                if !literal.is_empty() {
                    segments.push(Segment::Literal(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Placeholder(key));
            }
            '}' => {
                if chars.next_if(|&(_, next)| next == '}').is_some() {
                    literal.push('}');
                } else {
                    return Err(malformed(pos, "single '}' outside a placeholder".into()));
                }
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_template() {
        let template = FormatTemplate::new("t", "DATA:{data}").unwrap();
        let result = template.render(&json!({ "data": "[1,2]" })).unwrap();
        assert_eq!(result, "DATA:[1,2]");
        assert_eq!(template.raw_template(), "DATA:{data}");
    }

    #[test]
    fn test_substituted_braces_are_not_reparsed() {
        let template = FormatTemplate::new("t", "{data}").unwrap();
        let data = r#"[{"name":"AAA","note":"{x}"}]"#;
        assert_eq!(template.render(&json!({ "data": data })).unwrap(), data);
    }

    #[test]
    fn test_escaped_braces() {
        let template = FormatTemplate::new("t", "{{\"k\": {data}}}").unwrap();
        assert_eq!(template.placeholders(), BTreeSet::from(["data".to_string()]));
        assert_eq!(
            template.render(&json!({ "data": "1" })).unwrap(),
            "{\"k\": 1}"
        );
    }

    #[test]
    fn test_repeated_placeholder() {
        let template = FormatTemplate::new("t", "{data}|{data}").unwrap();
        assert_eq!(template.placeholders().len(), 1);
        assert_eq!(template.render(&json!({ "data": "x" })).unwrap(), "x|x");
    }

    #[test]
    fn test_non_string_values_render_as_json() {
        let template = FormatTemplate::new("t", "{n} {list}").unwrap();
        let result = template
            .render(&json!({ "n": 3, "list": ["a", "b"] }))
            .unwrap();
        assert_eq!(result, r#"3 ["a","b"]"#);
    }

    #[test]
    fn test_non_ascii_text_is_kept() {
        let template = FormatTemplate::new("t", "请分析以下数据：{data}").unwrap();
        let result = template.render(&json!({ "data": "美股" })).unwrap();
        assert_eq!(result, "请分析以下数据：美股");
    }

    #[test]
    fn test_missing_variable_at_render() {
        let template = FormatTemplate::new("t", "{data}").unwrap();
        let err = template.render(&json!({})).unwrap_err();
        assert!(matches!(err, PromptError::MissingVariable { .. }));
    }

    #[test]
    fn test_unclosed_brace() {
        let err = FormatTemplate::new("t", "DATA:{data").unwrap_err();
        match err {
            PromptError::Malformed { position, .. } => assert_eq!(position, 5),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn test_stray_closing_brace() {
        assert!(matches!(
            FormatTemplate::new("t", "oops } {data}"),
            Err(PromptError::Malformed { .. })
        ));
    }

    #[test]
    fn test_rejects_unsupported_placeholder_syntax() {
        for source in ["{}", "{0}", "{data:>10}", "{data.x}", "{ data }", "{da{ta}"] {
            assert!(
                matches!(
                    FormatTemplate::new("t", source),
                    Err(PromptError::Malformed { .. })
                ),
                "{source} should be rejected"
            );
        }
    }

    #[test]
    fn test_no_placeholders() {
        let template = FormatTemplate::new("t", "static prompt").unwrap();
        assert!(template.placeholders().is_empty());
        assert_eq!(template.render(&json!({})).unwrap(), "static prompt");
    }
}
