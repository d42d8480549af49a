use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::application::{RagService, RetryPolicy};
use crate::domain::{ports::LlmService, DomainError, PromptTemplate, SearchResult};

const NO_CONTEXT: &str = "No relevant documents were found.";

/// `answer` sees `{question}` and `{context}`; `polish` sees `{answer}`.
#[derive(Debug, Clone, Deserialize)]
pub struct QaPrompts {
    pub answer: PromptTemplate,
    pub polish: PromptTemplate,
}

#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<SearchResult>,
}

/// Retrieve, answer from the retrieved chunks, then a final polish pass.
pub struct DocumentQaService {
    rag: Arc<RagService>,
    llm: Arc<dyn LlmService>,
    prompts: QaPrompts,
    retry: RetryPolicy,
}

impl DocumentQaService {
    pub fn new(rag: Arc<RagService>, llm: Arc<dyn LlmService>, prompts: QaPrompts) -> Self {
        Self {
            rag,
            llm,
            prompts,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[instrument(skip(self))]
    pub async fn ask(&self, question: &str) -> Result<Answer, DomainError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::validation("Question must not be empty"));
        }

        let sources = self.rag.retrieve(question).await?;
        debug!(sources = sources.len(), "retrieved context");

        let context = if sources.is_empty() {
            NO_CONTEXT.to_string()
        } else {
            sources
                .iter()
                .map(|r| r.chunk.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let vars = [("question", question), ("context", context.as_str())];
        let (system, user) = (
            self.prompts.answer.render_system(&vars),
            self.prompts.answer.render_user(&vars),
        );
        let llm = self.llm.as_ref();
        let draft = self
            .retry
            .run("answer", || llm.complete_with_system(&system, &user))
            .await?;

        let vars = [("answer", draft.as_str())];
        let (system, user) = (
            self.prompts.polish.render_system(&vars),
            self.prompts.polish.render_user(&vars),
        );
        let answer = self
            .retry
            .run("polish", || llm.complete_with_system(&system, &user))
            .await?;

        Ok(Answer {
            answer: answer.trim().to_string(),
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DocumentChunk;
    use crate::infrastructure::InMemoryVectorStore;
    use crate::testing::{LetterEmbedding, ScriptedLlm};
    use uuid::Uuid;

    fn prompts() -> QaPrompts {
        QaPrompts {
            answer: PromptTemplate::new("Docs:\n{context}", "{question}"),
            polish: PromptTemplate::new("", "Tighten: {answer}"),
        }
    }

    fn rag() -> Arc<RagService> {
        Arc::new(RagService::new(
            Arc::new(LetterEmbedding::default()),
            Arc::new(InMemoryVectorStore::new()),
            2,
        ))
    }

    #[tokio::test]
    async fn test_answers_from_retrieved_chunks_then_polishes() {
        let rag = rag();
        let doc_id = Uuid::new_v4();
        rag.index_chunks(&[
            DocumentChunk::new(doc_id, "vacation policy: 25 days", 0),
            DocumentChunk::new(doc_id, "expense policy: receipts", 1),
        ])
        .await
        .unwrap();
        let llm = Arc::new(ScriptedLlm::new(["long answer", " 25 days. "]));
        let qa = DocumentQaService::new(rag, llm.clone(), prompts()).with_retry(RetryPolicy::none());

        let answer = qa.ask("vacation policy?").await.unwrap();

        assert_eq!(answer.answer, "25 days.");
        assert_eq!(answer.sources.len(), 2);
        assert!(llm.system(0).starts_with("Docs:\nvacation policy: 25 days"));
        assert_eq!(llm.prompt(1), "Tighten: long answer");
    }

    #[tokio::test]
    async fn test_empty_index_uses_no_context_note() {
        let llm = Arc::new(ScriptedLlm::new(["guess", "guess"]));
        let qa = DocumentQaService::new(rag(), llm.clone(), prompts());

        let answer = qa.ask("anything?").await.unwrap();

        assert!(answer.sources.is_empty());
        assert_eq!(llm.system(0), format!("Docs:\n{NO_CONTEXT}"));
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected() {
        let qa = DocumentQaService::new(rag(), Arc::new(ScriptedLlm::default()), prompts());
        let err = qa.ask("   ").await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
