//! File-based template loading
//!
//! Templates are read fresh from disk on every call; nothing is cached. The
//! syntax is chosen from the file extension:
//! - `.jinja` / `.j2` -> [`JinjaTemplate`]
//! - anything else (`.txt`, `.md`, no extension) -> [`FormatTemplate`]

use crate::{FormatTemplate, JinjaTemplate, PromptError, PromptTemplate, Result};
use std::path::Path;

/// Placeholder syntax of a template file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSyntax {
    /// `{name}` placeholders
    Format,
    /// Jinja2 `{{ name }}` expressions
    Jinja,
}

impl TemplateSyntax {
    /// Pick the syntax for a file path
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jinja" | "j2") => Self::Jinja,
            _ => Self::Format,
        }
    }
}

/// Read and parse a template file
///
/// The template name is the file stem (`prompts/ths_finance_prompt.txt` ->
/// `ths_finance_prompt`).
pub fn load_template(path: &Path) -> Result<Box<dyn PromptTemplate>> {
    let source = std::fs::read_to_string(path).map_err(|e| PromptError::FileLoadError {
        path: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("template")
        .to_string();

    Ok(match TemplateSyntax::from_path(path) {
        TemplateSyntax::Format => Box::new(FormatTemplate::new(name, source)?),
        TemplateSyntax::Jinja => Box::new(JinjaTemplate::new(name, source)?),
    })
}
