use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::openai;

use super::with_timeout;
use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::config::LlmConfig;

pub struct OpenAiLlm {
    model: String,
    temperature: f64,
    timeout_seconds: u64,
}

impl OpenAiLlm {
    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        }
    }
}

#[async_trait]
impl LlmService for OpenAiLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.complete_with_system("", prompt).await
    }

    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        let client = openai::Client::from_env();
        let agent = client
            .agent(&self.model)
            .preamble(system)
            .temperature(self.temperature)
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
