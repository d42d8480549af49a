use std::sync::Arc;
use tracing::instrument;

use crate::application::RefinementLoop;
use crate::domain::{DomainError, Refinement, TaskContext};

pub const OPTIONS_LABEL: &str = "Options";

/// Answers a (possibly multiple-choice) question through the refinement loop.
pub struct ResearchService {
    refinement: Arc<RefinementLoop>,
}

impl ResearchService {
    pub fn new(refinement: Arc<RefinementLoop>) -> Self {
        Self { refinement }
    }

    /// Options are numbered from 1 in the `Options` document.
    pub fn context(question: &str, options: &[String]) -> TaskContext {
        let context = TaskContext::new(question.trim());
        if options.is_empty() {
            return context;
        }

        let numbered = options
            .iter()
            .enumerate()
            .map(|(i, option)| format!("{}: {}", i + 1, option.trim()))
            .collect::<Vec<_>>()
            .join("\n");
        context.with_document(OPTIONS_LABEL, numbered)
    }

    #[instrument(skip(self, options), fields(options = options.len()))]
    pub async fn answer(
        &self,
        question: &str,
        options: &[String],
    ) -> Result<Refinement, DomainError> {
        if question.trim().is_empty() {
            return Err(DomainError::validation("Question must not be empty"));
        }

        self.refinement
            .refine(&Self::context(question, options))
            .await
    }
}
