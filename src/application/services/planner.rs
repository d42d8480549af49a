use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::application::structured::decode;
use crate::application::RetryPolicy;
use crate::domain::{ports::LlmService, DomainError, Plan, PlanProgress, PromptTemplate};

pub const DEFAULT_MAX_STEPS: usize = 8;

/// `plan` sees `{task}`; `step` sees `{task}`, `{plan}`, `{step}`;
/// `finalize` sees `{task}` and `{plan}` (rendered with results).
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerPrompts {
    pub plan: PromptTemplate,
    pub step: PromptTemplate,
    pub finalize: PromptTemplate,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub progress: PlanProgress,
    pub response: String,
}

/// Plan-and-execute: one planning call, one call per step, one summary.
pub struct PlanExecuteService {
    llm: Arc<dyn LlmService>,
    prompts: PlannerPrompts,
    max_steps: usize,
    retry: RetryPolicy,
}

impl PlanExecuteService {
    pub fn new(llm: Arc<dyn LlmService>, prompts: PlannerPrompts) -> Self {
        Self {
            llm,
            prompts,
            max_steps: DEFAULT_MAX_STEPS,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn call(
        &self,
        operation: &str,
        template: &PromptTemplate,
        vars: &[(&str, &str)],
    ) -> Result<String, DomainError> {
        let system = template.render_system(vars);
        let user = template.render_user(vars);
        let llm = self.llm.as_ref();
        self.retry
            .run(operation, || llm.complete_with_system(&system, &user))
            .await
    }

    #[instrument(skip(self))]
    pub async fn plan(&self, task: &str) -> Result<Plan, DomainError> {
        let raw = self.call("plan", &self.prompts.plan, &[("task", task)]).await?;
        let plan: Plan = decode(&raw)?;

        if plan.steps.is_empty() {
            return Err(DomainError::validation("Planner returned no steps"));
        }
        if plan.steps.len() > self.max_steps {
            return Err(DomainError::validation(format!(
                "Planner returned {} steps, limit is {}",
                plan.steps.len(),
                self.max_steps
            )));
        }

        info!(steps = plan.steps.len(), "plan ready");
        Ok(plan)
    }

    #[instrument(skip(self))]
    pub async fn execute(&self, task: &str) -> Result<PlanOutcome, DomainError> {
        let mut progress = PlanProgress::new(self.plan(task).await?);

        while let Some(step) = progress.next_step().map(str::to_string) {
            let rendered = progress.render();
            let result = self
                .call(
                    "step",
                    &self.prompts.step,
                    &[("task", task), ("plan", rendered.as_str()), ("step", step.as_str())],
                )
                .await?;
            info!(step = progress.current_step() + 1, "step finished");
            progress.record(result.trim());
        }

        let rendered = progress.render();
        let response = self
            .call(
                "finalize",
                &self.prompts.finalize,
                &[("task", task), ("plan", rendered.as_str())],
            )
            .await?;

        Ok(PlanOutcome {
            progress,
            response: response.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    fn prompts() -> PlannerPrompts {
        PlannerPrompts {
            plan: PromptTemplate::new("", "Plan: {task}"),
            step: PromptTemplate::new("", "{plan}\nNOW: {step}"),
            finalize: PromptTemplate::new("", "{plan}"),
        }
    }

    fn service(llm: Arc<ScriptedLlm>) -> PlanExecuteService {
        PlanExecuteService::new(llm, prompts())
            .with_max_steps(3)
            .with_retry(RetryPolicy::none())
    }

    #[tokio::test]
    async fn test_executes_every_step_then_finalizes() {
        let llm = Arc::new(ScriptedLlm::new([
            r#"{"steps": ["find market", "size it"]}"#,
            "market is X",
            "size is Y",
            "one-pager",
        ]));

        let outcome = service(llm.clone()).execute("AI startup").await.unwrap();

        assert_eq!(outcome.response, "one-pager");
        assert_eq!(outcome.progress.past_steps, vec!["market is X", "size is Y"]);
        assert_eq!(llm.call_count(), 4);
        assert!(llm.prompt(2).contains("Result: market is X"));
        assert!(llm.prompt(2).ends_with("NOW: size it"));
        assert!(llm.prompt(3).contains("Result: size is Y"));
    }

    #[tokio::test]
    async fn test_rejects_empty_plan() {
        let llm = Arc::new(ScriptedLlm::new([r#"{"steps": []}"#]));
        let err = service(llm).execute("t").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_rejects_plan_over_step_cap() {
        let llm = Arc::new(ScriptedLlm::new([r#"{"steps": ["a", "b", "c", "d"]}"#]));
        let err = service(llm.clone()).execute("t").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(ref m) if m.contains("limit is 3")));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_step_failure_aborts() {
        let llm = Arc::new(
            ScriptedLlm::new([r#"{"steps": ["a"]}"#]).push_err(DomainError::external("503")),
        );
        let err = service(llm).execute("t").await.unwrap_err();
        assert!(matches!(err, DomainError::ExternalService(_)));
    }
}
