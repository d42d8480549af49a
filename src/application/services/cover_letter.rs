use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::application::structured::decode;
use crate::application::{RefinementLoop, RetryPolicy};
use crate::domain::{
    ports::{LlmService, PageFetcher},
    DomainError, PromptTemplate, Refinement, TaskContext,
};

pub const COVER_LETTER_TASK: &str =
    "Write a cover letter for the job described below, grounded in the applicant's resume.";
pub const JOB_DESCRIPTION_LABEL: &str = "Job Description";
pub const RESUME_LABEL: &str = "Resume";

/// Where the job posting comes from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum JobSource {
    /// Fetched, then run through extraction.
    Url(String),
    /// Raw page markup, run through extraction.
    Html(String),
    /// Already-clean description text, used as is.
    Description(String),
}

#[derive(Debug, Deserialize)]
struct ExtractedJobDescription {
    #[serde(alias = "extracted_job_description")]
    job_description: String,
}

pub struct CoverLetterService {
    llm: Arc<dyn LlmService>,
    fetcher: Arc<dyn PageFetcher>,
    extract_prompt: PromptTemplate,
    refinement: Arc<RefinementLoop>,
    retry: RetryPolicy,
}

impl CoverLetterService {
    /// `extract_prompt` sees `{page}`.
    pub fn new(
        llm: Arc<dyn LlmService>,
        fetcher: Arc<dyn PageFetcher>,
        extract_prompt: PromptTemplate,
        refinement: Arc<RefinementLoop>,
    ) -> Self {
        Self {
            llm,
            fetcher,
            extract_prompt,
            refinement,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[instrument(skip(self, source))]
    pub async fn job_description(&self, source: &JobSource) -> Result<String, DomainError> {
        let page = match source {
            JobSource::Description(text) => return Ok(text.trim().to_string()),
            JobSource::Html(html) => html.clone(),
            JobSource::Url(url) => {
                let fetcher = self.fetcher.as_ref();
                self.retry.run("fetch", || fetcher.fetch(url)).await?
            }
        };

        if page.trim().is_empty() {
            return Err(DomainError::validation("Job page is empty"));
        }

        let vars = [("page", page.as_str())];
        let system = self.extract_prompt.render_system(&vars);
        let user = self.extract_prompt.render_user(&vars);
        let llm = self.llm.as_ref();
        let raw = self
            .retry
            .run("extract", || llm.complete_with_system(&system, &user))
            .await?;

        let extracted: ExtractedJobDescription = decode(&raw)?;
        let description = extracted.job_description.trim();
        if description.is_empty() {
            return Err(DomainError::validation("No job description found on page"));
        }
        Ok(description.to_string())
    }

    #[instrument(skip_all)]
    pub async fn write(&self, source: &JobSource, resume: &str) -> Result<Refinement, DomainError> {
        if resume.trim().is_empty() {
            return Err(DomainError::validation("Resume must not be empty"));
        }

        let description = self.job_description(source).await?;
        info!(chars = description.len(), "job description ready");

        let context = TaskContext::new(COVER_LETTER_TASK)
            .with_document(JOB_DESCRIPTION_LABEL, description)
            .with_document(RESUME_LABEL, resume);

        self.refinement.refine(&context).await
    }
}
