//! Error types for prompt operations

use thiserror::Error;

/// Result type for prompt operations
pub type Result<T> = std::result::Result<T, PromptError>;

/// Errors that can occur during prompt operations
#[derive(Error, Debug)]
pub enum PromptError {
    /// Template text could not be parsed
    #[error("Malformed template '{name}' at byte {position}: {detail}")]
    Malformed {
        name: String,
        position: usize,
        detail: String,
    },

    /// Jinja template parsing failed
    #[error("Failed to parse template '{name}': {detail}")]
    TemplateParseFailed { name: String, detail: String },

    /// A required placeholder does not appear in the template
    #[error("Template '{name}' is missing the '{placeholder}' placeholder")]
    MissingPlaceholder { name: String, placeholder: String },

    /// The template declares a placeholder nobody will fill
    #[error("Template '{name}' uses unexpected placeholder '{placeholder}'")]
    UnexpectedPlaceholder { name: String, placeholder: String },

    /// No value was supplied for a placeholder at render time
    #[error("No value for placeholder '{placeholder}' in template '{name}'")]
    MissingVariable { name: String, placeholder: String },

    /// Template rendering failed
    #[error("Failed to render template '{name}': {detail}")]
    RenderError { name: String, detail: String },

    /// File loading error
    #[error("Failed to load template file '{path}': {detail}")]
    FileLoadError { path: String, detail: String },
}
