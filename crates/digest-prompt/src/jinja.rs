//! Jinja prompt templates (`.jinja` / `.j2` files)

use crate::{PromptError, PromptTemplate, Result};
use minijinja::{Environment, UndefinedBehavior};
use std::collections::BTreeSet;

/// Prompt template in Jinja syntax, rendered with MiniJinja
///
/// Placeholders are the template's undeclared variables (`{{ data }}`); loop
/// and `set` variables do not count. Undefined variables fail the render, and
/// nothing is auto-escaped, so a JSON snapshot passes through unchanged.
///
/// # Examples
///
/// ```
/// use digest_prompt::{JinjaTemplate, PromptTemplate};
/// use serde_json::json;
///
/// let template = JinjaTemplate::new("digest", "DATA:{{ data }}").unwrap();
/// let result = template.render(&json!({ "data": "[]" })).unwrap();
/// assert_eq!(result, "DATA:[]");
/// ```
pub struct JinjaTemplate {
    name: String,
    source: String,
    variables: BTreeSet<String>,
}

impl JinjaTemplate {
    /// Parse a template and collect the variables it reads
    ///
    /// # Errors
    ///
    /// Returns [`PromptError::TemplateParseFailed`] if the source is not valid Jinja.
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        let variables = {
            let env = Environment::new();
            let template = env.template_from_str(&source).map_err(|e| {
                PromptError::TemplateParseFailed {
                    name: name.clone(),
                    detail: e.to_string(),
                }
            })?;
            template.undeclared_variables(false).into_iter().collect()
        };

        Ok(Self {
            name,
            source,
            variables,
        })
    }
}

impl PromptTemplate for JinjaTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn placeholders(&self) -> BTreeSet<String> {
        self.variables.clone()
    }

    fn render(&self, vars: &serde_json::Value) -> Result<String> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        let value = minijinja::value::Value::from_serialize(vars);

        env.render_str(&self.source, value)
            .map_err(|e| PromptError::RenderError {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }

    fn raw_template(&self) -> &str {
        &self.source
    }
}

impl std::fmt::Debug for JinjaTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaTemplate")
            .field("name", &self.name)
            .field("variables", &self.variables)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_snapshot_passes_through_unescaped() {
        let template = JinjaTemplate::new("digest", "行情数据:\n{{ data }}").unwrap();
        let data = r#"[{"标题":"<美股>","链接":"https://example.com/?a=1&b=2"}]"#;

        assert_eq!(
            template.render(&json!({ "data": data })).unwrap(),
            format!("行情数据:\n{data}")
        );
    }

    #[test]
    fn test_placeholders_skip_loop_variables() {
        let template = JinjaTemplate::new(
            "digest",
            "{% for item in items %}{{ item }}{% endfor %}{{ data }}",
        )
        .unwrap();

        assert_eq!(
            template.placeholders(),
            BTreeSet::from(["data".to_string(), "items".to_string()])
        );
        assert!(matches!(
            template.require_only(&["data"]),
            Err(PromptError::UnexpectedPlaceholder { placeholder, .. }) if placeholder == "items"
        ));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            JinjaTemplate::new("digest", "{{ data"),
            Err(PromptError::TemplateParseFailed { .. })
        ));
    }

    #[test]
    fn test_missing_value_fails_render() {
        let template = JinjaTemplate::new("digest", "{{ data }}").unwrap();
        assert!(matches!(
            template.render(&json!({})),
            Err(PromptError::RenderError { .. })
        ));
    }

    #[test]
    fn test_debug_omits_source() {
        let template = JinjaTemplate::new("digest", "secret {{ data }}").unwrap();
        let debug = format!("{template:?}");
        assert!(debug.contains("digest"));
        assert!(!debug.contains("secret"));
    }
}
