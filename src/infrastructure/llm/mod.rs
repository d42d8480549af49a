mod anthropic;
mod openai;

pub use anthropic::AnthropicLlm;
pub use openai::OpenAiLlm;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::config::{LlmConfig, LlmProvider};

pub fn build_llm(config: &LlmConfig) -> Arc<dyn LlmService> {
    tracing::info!(provider = ?config.provider, model = %config.model, "using LLM");
    match config.provider {
        LlmProvider::Anthropic => Arc::new(AnthropicLlm::from_config(config)),
        LlmProvider::OpenAi => Arc::new(OpenAiLlm::from_config(config)),
    }
}

/// Bounds a model call; an elapsed deadline becomes [`DomainError::Timeout`].
pub(crate) async fn with_timeout<T, F>(seconds: u64, call: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    tokio::time::timeout(Duration::from_secs(seconds), call)
        .await
        .unwrap_or_else(|_| Err(DomainError::timeout(format!("Model call exceeded {seconds}s"))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_maps_elapsed_deadline() {
        let err = with_timeout(1, async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, DomainError>("late")
        })
        .await
        .unwrap_err();

        assert!(matches!(err, DomainError::Timeout(_)));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let value = with_timeout(1, async { Ok::<_, DomainError>(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_build_llm_reports_configured_model() {
        let config = LlmConfig {
            provider: LlmProvider::Anthropic,
            model: "claude-3-5-haiku-latest".into(),
            ..LlmConfig::default()
        };
        assert_eq!(build_llm(&config).model(), "claude-3-5-haiku-latest");
    }
}
