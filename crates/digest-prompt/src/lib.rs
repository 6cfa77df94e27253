//! Prompt template handling for market-digest
//!
//! Templates are plain text files with named placeholders. Two syntaxes are
//! supported:
//!
//! - **Format syntax** (`{data}`): single braces around an identifier, with
//!   `{{` and `}}` standing for literal braces.
//! - **Jinja2 syntax** (`{{ data }}`): rendered by MiniJinja, selected for
//!   files ending in `.jinja` or `.j2`.
//!
//! Both are parsed up front, so a malformed template is rejected before any
//! rendering happens, and both expose the set of placeholders they declare so
//! callers can insist on an exact variable set.
//!
//! # Quick Start
//!
//! ```
//! use digest_prompt::{FormatTemplate, PromptTemplate};
//! use serde_json::json;
//!
//! let template = FormatTemplate::new("digest", "DATA:{data}").unwrap();
//! template.require_only(&["data"]).unwrap();
//!
//! let prompt = template.render(&json!({ "data": "[]" })).unwrap();
//! assert_eq!(prompt, "DATA:[]");
//! ```

mod error;
mod format;
mod jinja;
mod loader;
mod template;

pub use error::{PromptError, Result};
pub use format::FormatTemplate;
pub use jinja::JinjaTemplate;
pub use loader::{TemplateSyntax, load_template};
pub use template::PromptTemplate;
