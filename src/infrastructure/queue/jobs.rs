use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::JobSource;

pub mod queues {
    pub const COVER_LETTER_QUEUE: &str = "jobs:cover_letter";
    pub const RESEARCH_QUEUE: &str = "jobs:research";
    pub const PLAN_QUEUE: &str = "jobs:plan";
    pub const INDEX_QUEUE: &str = "jobs:index";

    pub const ALL: [&str; 4] = [COVER_LETTER_QUEUE, RESEARCH_QUEUE, PLAN_QUEUE, INDEX_QUEUE];
}

pub mod keys {
    use uuid::Uuid;

    pub fn job_status(job_id: &Uuid) -> String {
        format!("job:status:{}", job_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueJobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

/// What clients see at `GET /api/v1/jobs/{job_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub job_id: Uuid,
    pub status: QueueJobStatus,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl JobResult {
    pub fn queued(job_id: Uuid) -> Self {
        Self {
            job_id,
            status: QueueJobStatus::Queued,
            result: None,
            error: None,
            completed_at: None,
        }
    }

    pub fn processing(job_id: Uuid) -> Self {
        Self {
            status: QueueJobStatus::Processing,
            ..Self::queued(job_id)
        }
    }

    pub fn completed(job_id: Uuid, result: serde_json::Value) -> Self {
        Self {
            job_id,
            status: QueueJobStatus::Completed,
            result: Some(result),
            error: None,
            completed_at: Some(Utc::now()),
        }
    }

    pub fn failed(job_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            job_id,
            status: QueueJobStatus::Failed,
            result: None,
            error: Some(error.into()),
            completed_at: Some(Utc::now()),
        }
    }

    /// Failed, but with a partial result worth keeping (e.g. the last
    /// artifact of a run that did not converge).
    pub fn failed_with(
        job_id: Uuid,
        error: impl Into<String>,
        result: serde_json::Value,
    ) -> Self {
        Self {
            result: Some(result),
            ..Self::failed(job_id, error)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverLetterJob {
    pub job_id: Uuid,
    pub source: JobSource,
    pub resume: String,
}

impl CoverLetterJob {
    pub fn new(source: JobSource, resume: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            source,
            resume: resume.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchJob {
    pub job_id: Uuid,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

impl ResearchJob {
    pub fn new(question: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            question: question.into(),
            options,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanJob {
    pub job_id: Uuid,
    pub task: String,
}

impl PlanJob {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            task: task.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexDocumentJob {
    pub job_id: Uuid,
    pub document_id: Uuid,
    pub name: String,
    pub content: String,
}

impl IndexDocumentJob {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
        }
    }
}
