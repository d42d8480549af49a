use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::anthropic;

use super::with_timeout;
use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::config::LlmConfig;

pub struct AnthropicLlm {
    model: String,
    temperature: f64,
    max_tokens: u64,
    timeout_seconds: u64,
}

impl AnthropicLlm {
    pub fn new(model: impl Into<String>) -> Self {
        let defaults = LlmConfig::default();
        Self {
            model: model.into(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            timeout_seconds: defaults.timeout_seconds,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_seconds: config.timeout_seconds,
        }
    }
}

#[async_trait]
impl LlmService for AnthropicLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.complete_with_system("", prompt).await
    }

    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        let client = anthropic::Client::from_env();
        let agent = client
            .agent(&self.model)
            .preamble(system)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build();

        with_timeout(self.timeout_seconds, async {
            agent
                .prompt(prompt)
                .await
                .map_err(|e| DomainError::external(e.to_string()))
        })
        .await
    }

    fn model(&self) -> &str {
        &self.model
    }
}
