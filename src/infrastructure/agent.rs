use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::anthropic;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::application::{parse_revision, render_role_prompt, RagService, RolePrompts};
use crate::domain::ports::{Drafter, Reviser};
use crate::domain::{Artifact, Critique, DomainError, TaskContext};
use crate::infrastructure::config::{AppConfig, KnowledgeBaseToolConfig};
use crate::infrastructure::tools::KnowledgeBaseTool;

/// Tool-calling drafter and reviser for research answers.
///
/// Each call builds a fresh Anthropic agent that may consult the knowledge
/// base for up to `max_turns` tool round trips.
pub struct ResearchAgent {
    model: String,
    max_tokens: u64,
    prompts: RolePrompts,
    rag: Arc<RagService>,
    top_k: usize,
    tool_config: KnowledgeBaseToolConfig,
    max_turns: usize,
    timeout: Duration,
}

impl ResearchAgent {
    pub fn new(rag: Arc<RagService>, config: &AppConfig) -> Self {
        Self {
            model: config.config.agent.model.clone(),
            max_tokens: config.config.llm.max_tokens,
            prompts: config.prompts.research.clone(),
            rag,
            top_k: config.config.rag.top_k,
            tool_config: config.config.tools.knowledge_base.clone(),
            max_turns: config.config.agent.max_turns,
            timeout: Duration::from_secs(config.config.agent.timeout_seconds),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, system: &str, prompt: &str) -> Result<String, DomainError> {
        let tool = KnowledgeBaseTool::new(self.rag.clone(), self.top_k, self.tool_config.clone());

        let agent = anthropic::Client::from_env()
            .agent(&self.model)
            .preamble(system)
            .max_tokens(self.max_tokens)
            .tool(tool)
            .build();

        tokio::time::timeout(self.timeout, agent.prompt(prompt).multi_turn(self.max_turns))
            .await
            .map_err(|_| DomainError::timeout("Agent execution timed out"))?
            .map_err(|e| DomainError::external(format!("Agent failed: {e}")))
    }
}

#[async_trait]
impl Drafter for ResearchAgent {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn draft(&self, context: &TaskContext) -> Result<Artifact, DomainError> {
        let (system, user) = render_role_prompt(&self.prompts.draft, context, None, None);
        let text = self.run(&system, &user).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::validation("Agent returned an empty answer"));
        }
        Ok(Artifact::new(text))
    }
}

#[async_trait]
impl Reviser for ResearchAgent {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn revise(
        &self,
        context: &TaskContext,
        artifact: &Artifact,
        critique: &Critique,
    ) -> Result<Artifact, DomainError> {
        let (system, user) =
            render_role_prompt(&self.prompts.revise, context, Some(artifact), Some(critique));
        let raw = self.run(&system, &user).await?;
        parse_revision(&raw)
    }
}
