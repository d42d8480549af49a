use deadpool_redis::{redis::AsyncCommands, Config, Pool, Runtime};
use serde::Serialize;
use uuid::Uuid;

use crate::infrastructure::{
    keys, queues, CoverLetterJob, IndexDocumentJob, JobResult, PlanJob, ResearchJob,
};

pub type RedisPool = Pool;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis pool error: {0}")]
    Pool(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, QueueError>;

/// Builds a lazy pool; no connection is made until first use.
pub fn create_pool(redis_url: &str) -> Result<RedisPool> {
    let cfg = Config::from_url(redis_url);
    cfg.create_pool(Some(Runtime::Tokio1))
        .map_err(|e| QueueError::Pool(e.to_string()))
}

#[derive(Clone)]
pub struct JobProducer {
    pool: RedisPool,
    result_ttl_seconds: u64,
}

impl JobProducer {
    pub fn new(pool: RedisPool, result_ttl_seconds: u64) -> Self {
        Self {
            pool,
            result_ttl_seconds,
        }
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| QueueError::Pool(e.to_string()))
    }

    async fn push_job<J: Serialize>(&self, queue: &str, job_id: Uuid, job: &J) -> Result<Uuid> {
        let payload = serde_json::to_string(job)?;
        let status = serde_json::to_string(&JobResult::queued(job_id))?;
        let mut conn = self.conn().await?;

        // status before push: a worker may pick the job up immediately
        conn.set_ex::<_, _, ()>(keys::job_status(&job_id), &status, self.result_ttl_seconds)
            .await
            .map_err(|e| QueueError::Redis(e.to_string()))?;

        conn.lpush::<_, _, ()>(queue, payload)
            .await
            .map_err(|e| QueueError::Redis(e.to_string()))?;

        tracing::info!(job_id = %job_id, queue, "job queued");
        Ok(job_id)
    }

    pub async fn push_cover_letter_job(&self, job: &CoverLetterJob) -> Result<Uuid> {
        self.push_job(queues::COVER_LETTER_QUEUE, job.job_id, job)
            .await
    }

    pub async fn push_research_job(&self, job: &ResearchJob) -> Result<Uuid> {
        self.push_job(queues::RESEARCH_QUEUE, job.job_id, job).await
    }

    pub async fn push_plan_job(&self, job: &PlanJob) -> Result<Uuid> {
        self.push_job(queues::PLAN_QUEUE, job.job_id, job).await
    }

    pub async fn push_index_job(&self, job: &IndexDocumentJob) -> Result<Uuid> {
        self.push_job(queues::INDEX_QUEUE, job.job_id, job).await
    }

    pub async fn get_job_status(&self, job_id: &Uuid) -> Result<Option<JobResult>> {
        let mut conn = self.conn().await?;
        let result: Option<String> = conn
            .get(keys::job_status(job_id))
            .await
            .map_err(|e| QueueError::Redis(e.to_string()))?;

        result
            .map(|json| serde_json::from_str(&json).map_err(Into::into))
            .transpose()
    }
}
