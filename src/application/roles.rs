//! Drafter, critic and reviser backed by a plain [`LlmService`].
//!
//! Prompts see `{task}`, `{documents}`, `{artifact}` and `{critique}`, plus
//! one variable per supporting document named after its label in
//! snake_case (`"Job Description"` becomes `{job_description}`).

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;

use crate::application::structured::{complete_structured, decode};
use crate::domain::ports::{Critic, Drafter, LlmService, Reviser};
use crate::domain::{Artifact, Critique, DomainError, PromptTemplate, TaskContext, Verdict};

/// Prompt set for one kind of refinement (cover letter, research answer...).
#[derive(Debug, Clone, Deserialize)]
pub struct RolePrompts {
    pub draft: PromptTemplate,
    pub critique: PromptTemplate,
    pub revise: PromptTemplate,
}

#[derive(Debug, Deserialize)]
struct CritiqueResponse {
    #[serde(default)]
    critique: Option<String>,
    #[serde(alias = "cover_letter", alias = "answer")]
    artifact: String,
}

#[derive(Debug, Deserialize)]
struct RevisionResponse {
    #[serde(alias = "cover_letter", alias = "response")]
    artifact: String,
}

/// Parses a reviser reply of the form `{"artifact": ...}`.
pub fn parse_revision(raw: &str) -> Result<Artifact, DomainError> {
    let response: RevisionResponse = decode(raw)?;
    Ok(Artifact::new(response.artifact))
}

fn snake_case(label: &str) -> String {
    label
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

fn prompt_vars(
    context: &TaskContext,
    artifact: Option<&Artifact>,
    critique: Option<&Critique>,
) -> Vec<(String, String)> {
    let mut vars = vec![
        ("task".to_string(), context.task.clone()),
        ("documents".to_string(), context.render_documents()),
    ];
    vars.extend(
        context
            .documents
            .iter()
            .map(|d| (snake_case(&d.label), d.content.clone())),
    );
    if let Some(artifact) = artifact {
        vars.push(("artifact".to_string(), artifact.as_str().to_string()));
    }
    if let Some(critique) = critique {
        vars.push(("critique".to_string(), critique.as_str().to_string()));
    }
    vars
}

/// Renders `(system, user)` for one role call.
pub fn render_role_prompt(
    template: &PromptTemplate,
    context: &TaskContext,
    artifact: Option<&Artifact>,
    critique: Option<&Critique>,
) -> (String, String) {
    let vars = prompt_vars(context, artifact, critique);
    let borrowed: Vec<(&str, &str)> = vars.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    (
        template.render_system(&borrowed),
        template.render_user(&borrowed),
    )
}

pub struct LlmDrafter {
    llm: Arc<dyn LlmService>,
    prompt: PromptTemplate,
}

impl LlmDrafter {
    pub fn new(llm: Arc<dyn LlmService>, prompt: PromptTemplate) -> Self {
        Self { llm, prompt }
    }
}

#[async_trait]
impl Drafter for LlmDrafter {
    #[instrument(skip_all, fields(model = self.llm.model()))]
    async fn draft(&self, context: &TaskContext) -> Result<Artifact, DomainError> {
        let (system, user) = render_role_prompt(&self.prompt, context, None, None);
        let text = self.llm.complete_with_system(&system, &user).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::validation("Model returned an empty draft"));
        }
        Ok(Artifact::new(text))
    }
}

pub struct LlmCritic {
    llm: Arc<dyn LlmService>,
    prompt: PromptTemplate,
}

impl LlmCritic {
    pub fn new(llm: Arc<dyn LlmService>, prompt: PromptTemplate) -> Self {
        Self { llm, prompt }
    }
}

#[async_trait]
impl Critic for LlmCritic {
    #[instrument(skip_all, fields(model = self.llm.model()))]
    async fn critique(
        &self,
        context: &TaskContext,
        artifact: &Artifact,
    ) -> Result<Verdict, DomainError> {
        let (system, user) = render_role_prompt(&self.prompt, context, Some(artifact), None);
        let response: CritiqueResponse =
            complete_structured(self.llm.as_ref(), &system, &user).await?;

        Ok(Verdict {
            critique: response.critique.map(Critique::new),
            artifact: Artifact::new(response.artifact),
        })
    }
}

pub struct LlmReviser {
    llm: Arc<dyn LlmService>,
    prompt: PromptTemplate,
}

impl LlmReviser {
    pub fn new(llm: Arc<dyn LlmService>, prompt: PromptTemplate) -> Self {
        Self { llm, prompt }
    }
}

#[async_trait]
impl Reviser for LlmReviser {
    #[instrument(skip_all, fields(model = self.llm.model()))]
    async fn revise(
        &self,
        context: &TaskContext,
        artifact: &Artifact,
        critique: &Critique,
    ) -> Result<Artifact, DomainError> {
        let (system, user) = render_role_prompt(&self.prompt, context, Some(artifact), Some(critique));
        let raw = self.llm.complete_with_system(&system, &user).await?;
        parse_revision(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{RefinementLoop, RetryPolicy};
    use crate::testing::ScriptedLlm;

    fn prompts() -> RolePrompts {
        RolePrompts {
            draft: PromptTemplate::new("drafter", "Task: {task}\nJD: {job_description}"),
            critique: PromptTemplate::new("critic", "Judge: {artifact}\n{documents}"),
            revise: PromptTemplate::new("reviser", "Fix {artifact} per {critique}"),
        }
    }

    fn context() -> TaskContext {
        TaskContext::new("cover letter").with_document("Job Description", "Rust dev")
    }

    #[tokio::test]
    async fn test_drafter_renders_document_variables() {
        let llm = Arc::new(ScriptedLlm::new(["  Dear team  "]));
        let drafter = LlmDrafter::new(llm.clone(), prompts().draft);

        let artifact = drafter.draft(&context()).await.unwrap();

        assert_eq!(artifact.as_str(), "Dear team");
        assert_eq!(llm.system(0), "drafter");
        assert_eq!(llm.prompt(0), "Task: cover letter\nJD: Rust dev");
    }

    #[tokio::test]
    async fn test_drafter_rejects_empty_output() {
        let llm = Arc::new(ScriptedLlm::new(["   "]));
        let err = LlmDrafter::new(llm, prompts().draft)
            .draft(&context())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn test_critic_decodes_accept_and_legacy_field_names() {
        let llm = Arc::new(ScriptedLlm::new([
            r#"{"critique": null, "cover_letter": "Dear team"}"#,
        ]));
        let critic = LlmCritic::new(llm.clone(), prompts().critique);

        let verdict = critic
            .critique(&context(), &Artifact::new("Dear team"))
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::accept("Dear team"));
        assert_eq!(llm.prompt(0), "Judge: Dear team\nJob Description:\nRust dev");
    }

    #[tokio::test]
    async fn test_critic_missing_artifact_is_validation_error() {
        let llm = Arc::new(ScriptedLlm::new([r#"{"critique": "too long"}"#]));
        let err = LlmCritic::new(llm, prompts().critique)
            .critique(&context(), &Artifact::new("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_parse_revision_accepts_fenced_reply() {
        let artifact = parse_revision("```json\n{\"response\": \"fixed\"}\n```").unwrap();
        assert_eq!(artifact.as_str(), "fixed");
        assert!(matches!(parse_revision("fixed"), Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn test_llm_roles_drive_full_loop() {
        let llm = Arc::new(ScriptedLlm::new([
            "A",
            r#"{"critique": "needs rhyme", "artifact": "A"}"#,
            r#"{"artifact": "B"}"#,
            r#"```json
{"critique": null, "artifact": "B"}
```"#,
        ]));
        let p = prompts();
        let controller = RefinementLoop::new(
            Arc::new(LlmDrafter::new(llm.clone(), p.draft)),
            Arc::new(LlmCritic::new(llm.clone(), p.critique)),
            Arc::new(LlmReviser::new(llm.clone(), p.revise)),
        )
        .with_retry(RetryPolicy::none());

        let refinement = controller.refine(&context()).await.unwrap();

        assert_eq!(refinement.artifact.as_str(), "B");
        assert_eq!(refinement.stats.critiques, 2);
        assert_eq!(refinement.stats.revisions, 1);
        assert_eq!(llm.prompt(2), "Fix A per needs rhyme");
    }
}
