//! Core prompt template trait
//!
//! This module defines the [`PromptTemplate`] trait that all template implementations must follow.

use crate::{PromptError, Result};
use std::collections::BTreeSet;

/// Core trait for prompt templates
///
/// A template knows which placeholders it declares, which lets callers check
/// the variable set before anything is rendered. The trait is dyn-compatible,
/// using `serde_json::Value` for variables instead of generics.
///
/// # Examples
///
/// ```
/// use digest_prompt::{FormatTemplate, PromptError, PromptTemplate};
///
/// let template = FormatTemplate::new("digest", "no placeholder here").unwrap();
/// let err = template.require_only(&["data"]).unwrap_err();
/// assert!(matches!(err, PromptError::MissingPlaceholder { .. }));
/// ```
pub trait PromptTemplate: Send + Sync {
    /// Get the template name/identifier
    fn name(&self) -> &str;

    /// Placeholders the template declares, sorted
    fn placeholders(&self) -> BTreeSet<String>;

    /// Render the template with variables
    ///
    /// `vars` must be a JSON object keyed by placeholder name. String values
    /// are inserted verbatim; other values are inserted as compact JSON.
    fn render(&self, vars: &serde_json::Value) -> Result<String>;

    /// Get the raw template source (for debugging/inspection)
    fn raw_template(&self) -> &str;

    /// Check that the template declares exactly the `expected` placeholders
    ///
    /// A missing placeholder is reported before an unexpected one.
    fn require_only(&self, expected: &[&str]) -> Result<()> {
        let declared = self.placeholders();

        if let Some(missing) = expected.iter().find(|p| !declared.contains(**p)) {
            return Err(PromptError::MissingPlaceholder {
                name: self.name().to_string(),
                placeholder: (*missing).to_string(),
            });
        }

        if let Some(extra) = declared.iter().find(|p| !expected.contains(&p.as_str())) {
            return Err(PromptError::UnexpectedPlaceholder {
                name: self.name().to_string(),
                placeholder: extra.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A simple test implementation of PromptTemplate
    struct FixedTemplate {
        name: String,
        placeholders: Vec<&'static str>,
    }

    impl FixedTemplate {
        fn new(name: &str, placeholders: Vec<&'static str>) -> Self {
            Self {
                name: name.to_string(),
                placeholders,
            }
        }
    }

    impl PromptTemplate for FixedTemplate {
        fn name(&self) -> &str {
            &self.name
        }

        fn placeholders(&self) -> BTreeSet<String> {
            self.placeholders.iter().map(|p| (*p).to_string()).collect()
        }

        fn render(&self, _vars: &serde_json::Value) -> Result<String> {
            Ok(self.name.clone())
        }

        fn raw_template(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_require_only_accepts_exact_set() {
        let template = FixedTemplate::new("t", vec!["data"]);
        assert!(template.require_only(&["data"]).is_ok());
        assert_eq!(template.render(&json!({})).unwrap(), "t");
    }

    #[test]
    fn test_require_only_missing() {
        let template = FixedTemplate::new("t", vec![]);
        match template.require_only(&["data"]) {
            Err(PromptError::MissingPlaceholder { name, placeholder }) => {
                assert_eq!(name, "t");
                assert_eq!(placeholder, "data");
            }
            other => panic!("expected MissingPlaceholder, got {other:?}"),
        }
    }

    #[test]
    fn test_require_only_unexpected() {
        let template = FixedTemplate::new("t", vec!["data", "date"]);
        match template.require_only(&["data"]) {
            Err(PromptError::UnexpectedPlaceholder { placeholder, .. }) => {
                assert_eq!(placeholder, "date");
            }
            other => panic!("expected UnexpectedPlaceholder, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_reported_before_unexpected() {
        let template = FixedTemplate::new("t", vec!["date"]);
        assert!(matches!(
            template.require_only(&["data"]),
            Err(PromptError::MissingPlaceholder { .. })
        ));
    }
}
