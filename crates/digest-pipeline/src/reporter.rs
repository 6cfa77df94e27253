//! Report generation

use crate::config::DigestConfig;
use crate::error::{ConfigError, ReportError};
use crate::model::{LanguageModel, ProviderModel};
use crate::paths;
use chrono::NaiveDate;
use digest_prompt::{PromptError, load_template};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// The only variable a prompt template may, and must, declare
pub const DATA_PLACEHOLDER: &str = "data";

/// Turns a snapshot into a markdown report at `<report_dir>/YYYY-MM-DD.md`
#[derive(Clone)]
pub struct Reporter {
    model: Arc<dyn LanguageModel>,
    template_file: PathBuf,
    report_dir: PathBuf,
}

impl Reporter {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        template_file: impl Into<PathBuf>,
        report_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            model,
            template_file: template_file.into(),
            report_dir: report_dir.into(),
        }
    }

    /// Reporter backed by the LLM provider configured in `config`
    pub fn from_config(config: &DigestConfig) -> Result<Self, ConfigError> {
        let model = ProviderModel::from_config(&config.llm)?;
        Ok(Self::new(
            Arc::new(model),
            &config.prompt_template_file,
            &config.report_dir,
        ))
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// Generate today's report from `snapshot` and return the file it was written to
    pub async fn generate_report(&self, snapshot: &Path) -> Result<PathBuf, ReportError> {
        self.generate_report_for(snapshot, paths::today()).await
    }

    /// Generate the report from `snapshot` and file it under `date`
    ///
    /// The template is read again on every call. Nothing is written unless
    /// rendering and the model call both succeed.
    #[instrument(skip(self), fields(snapshot = %snapshot.display()))]
    pub async fn generate_report_for(
        &self,
        snapshot: &Path,
        date: NaiveDate,
    ) -> Result<PathBuf, ReportError> {
        let result = self.try_generate(snapshot, date).await;
        match &result {
            Ok(path) => info!(path = %path.display(), "Generated report"),
            Err(e) => error!(operation = "generate_report", error = %e, "Failed to generate report"),
        }
        result
    }

    async fn try_generate(&self, snapshot: &Path, date: NaiveDate) -> Result<PathBuf, ReportError> {
        let data = tokio::fs::read_to_string(snapshot)
            .await
            .map_err(|source| ReportError::ReadSnapshot {
                path: snapshot.to_path_buf(),
                source,
            })?;

        let prompt = self.render_prompt(&data)?;
        debug!(chars = prompt.chars().count(), "Rendered prompt");

        let report = self.model.complete(&prompt).await?;

        let path = paths::dated_file(&self.report_dir, date, "md");
        paths::write_text(&path, &report)
            .await
            .map_err(|source| ReportError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }

    /// Render the template file with `data`
    pub fn render_prompt(&self, data: &str) -> Result<String, ReportError> {
        let template = load_template(&self.template_file).map_err(|e| match e {
            e @ PromptError::FileLoadError { .. } => ReportError::LoadTemplate(e),
            e => ReportError::TemplateRender(e),
        })?;

        template
            .require_only(&[DATA_PLACEHOLDER])
            .map_err(ReportError::TemplateRender)?;

        template
            .render(&json!({ DATA_PLACEHOLDER: data }))
            .map_err(ReportError::TemplateRender)
    }
}
