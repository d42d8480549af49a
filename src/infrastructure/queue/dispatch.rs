use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::jobs::{queues, CoverLetterJob, IndexDocumentJob, JobResult, PlanJob, ResearchJob};
use crate::domain::{Document, DomainError};
use crate::infrastructure::bootstrap::Services;

/// A job popped from one of the work queues.
#[derive(Debug, Clone)]
pub enum Job {
    CoverLetter(CoverLetterJob),
    Research(ResearchJob),
    Plan(PlanJob),
    Index(IndexDocumentJob),
}

impl Job {
    pub fn parse(queue: &str, payload: &str) -> Result<Self, DomainError> {
        let malformed =
            |e: serde_json::Error| DomainError::validation(format!("Malformed {queue} job: {e}"));

        match queue {
            queues::COVER_LETTER_QUEUE => {
                serde_json::from_str(payload).map(Job::CoverLetter).map_err(malformed)
            }
            queues::RESEARCH_QUEUE => {
                serde_json::from_str(payload).map(Job::Research).map_err(malformed)
            }
            queues::PLAN_QUEUE => serde_json::from_str(payload).map(Job::Plan).map_err(malformed),
            queues::INDEX_QUEUE => serde_json::from_str(payload).map(Job::Index).map_err(malformed),
            other => Err(DomainError::validation(format!("Unknown queue '{other}'"))),
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Job::CoverLetter(job) => job.job_id,
            Job::Research(job) => job.job_id,
            Job::Plan(job) => job.job_id,
            Job::Index(job) => job.job_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Job::CoverLetter(_) => "cover_letter",
            Job::Research(_) => "research",
            Job::Plan(_) => "plan",
            Job::Index(_) => "index",
        }
    }
}

/// Runs `job` to its final status record. Never fails: every error ends up
/// in the returned [`JobResult`].
#[instrument(skip_all, fields(job_id = %job.id(), kind = job.kind()))]
pub async fn execute(services: &Services, job: &Job) -> JobResult {
    let job_id = job.id();
    let outcome = match job {
        Job::CoverLetter(job) => services
            .cover_letters
            .write(&job.source, &job.resume)
            .await
            .and_then(to_json),
        Job::Research(job) => services
            .research
            .answer(&job.question, &job.options)
            .await
            .and_then(to_json),
        Job::Plan(job) => services
            .planner
            .execute(&job.task)
            .await
            .and_then(to_json),
        Job::Index(job) => {
            let doc = Document::new(&job.name).with_id(job.document_id);
            services
                .documents
                .ingest_document(doc, &job.content)
                .await
                .map(|(doc, chunks)| json!({ "document_id": doc.id, "chunks": chunks.len() }))
        }
    };

    match outcome {
        Ok(result) => {
            info!("job completed");
            JobResult::completed(job_id, result)
        }
        Err(DomainError::NotConverged {
            rounds,
            critique,
            artifact,
        }) => {
            warn!(rounds, "refinement did not converge");
            JobResult::failed_with(
                job_id,
                format!("Did not converge after {rounds} critique rounds"),
                json!({ "artifact": artifact, "critique": critique, "rounds": rounds }),
            )
        }
        Err(e) => {
            warn!(error = %e, "job failed");
            JobResult::failed(job_id, e.to_string())
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(value).map_err(|e| DomainError::internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::JobSource;
    use crate::infrastructure::config::AppConfig;
    use crate::infrastructure::queue::QueueJobStatus;
    use crate::infrastructure::InMemoryVectorStore;
    use crate::testing::{LetterEmbedding, ScriptedLlm, StaticFetcher};
    use std::sync::Arc;

    fn services(llm: ScriptedLlm, max_rounds: usize) -> Services {
        let mut app = AppConfig::default();
        app.config.refinement.max_rounds = max_rounds;
        Services::assemble(
            &app,
            Arc::new(llm),
            Arc::new(LetterEmbedding::default()),
            Arc::new(InMemoryVectorStore::new()),
            Arc::new(StaticFetcher::default()),
        )
    }

    #[test]
    fn test_parse_routes_by_queue() {
        let payload = serde_json::to_string(&PlanJob::new("launch")).unwrap();

        let job = Job::parse(queues::PLAN_QUEUE, &payload).unwrap();
        assert_eq!(job.kind(), "plan");

        let err = Job::parse(queues::RESEARCH_QUEUE, &payload).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(Job::parse("jobs:unknown", &payload).is_err());
    }

    #[tokio::test]
    async fn test_cover_letter_job_completes_with_refinement() {
        let llm = ScriptedLlm::new([
            "Dear team",
            r#"{"critique": "sign it", "artifact": "Dear team"}"#,
            r#"{"artifact": "Dear team,\nJane"}"#,
            r#"{"critique": null, "artifact": "Dear team,\nJane"}"#,
        ]);
        let job = Job::CoverLetter(CoverLetterJob::new(
            JobSource::Description("Rust backend role".into()),
            "Jane, Rust engineer",
        ));

        let result = execute(&services(llm, 5), &job).await;

        assert_eq!(result.status, QueueJobStatus::Completed);
        let body = result.result.unwrap();
        assert_eq!(body["artifact"], "Dear team,\nJane");
        assert_eq!(body["stats"]["revisions"], 1);
    }

    #[tokio::test]
    async fn test_not_converged_fails_with_last_artifact() {
        let llm = ScriptedLlm::new([
            "A",
            r#"{"critique": "too vague", "artifact": "A"}"#,
        ]);
        let job = Job::Research(ResearchJob::new("why?", vec![]));

        let result = execute(&services(llm, 1), &job).await;

        assert_eq!(result.status, QueueJobStatus::Failed);
        assert!(result.error.unwrap().contains("1 critique rounds"));
        let body = result.result.unwrap();
        assert_eq!(body["artifact"], "A");
        assert_eq!(body["critique"], "too vague");
    }

    #[tokio::test]
    async fn test_index_job_makes_content_searchable() {
        let services = services(ScriptedLlm::default(), 5);
        let job = IndexDocumentJob::new("policy.md", "Vacation is twenty five days.");
        let document_id = job.document_id;

        let result = execute(&services, &Job::Index(job)).await;

        assert_eq!(result.status, QueueJobStatus::Completed);
        assert_eq!(result.result.unwrap()["chunks"], 1);
        let hits = services.rag.retrieve("vacation").await.unwrap();
        assert_eq!(hits[0].chunk.document_id, document_id);
    }

    #[tokio::test]
    async fn test_validation_failure_is_recorded() {
        let job = Job::Plan(PlanJob::new("t"));
        let result = execute(&services(ScriptedLlm::new(["not json"]), 5), &job).await;

        assert_eq!(result.status, QueueJobStatus::Failed);
        assert!(result.error.unwrap().contains("Malformed model output"));
    }
}
