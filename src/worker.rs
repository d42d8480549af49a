use deadpool_redis::{redis::AsyncCommands, Connection};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::info;
use uuid::Uuid;

use job_agent::api::queue::{create_pool, RedisPool};
use job_agent::infrastructure::{
    init_tracing, keys, queue::execute, queues, AppConfig, Job, JobResult, Services,
};

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("Redis pool error: {0}")]
    Pool(String),
    #[error("Redis error: {0}")]
    Redis(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Worker shut down")]
    Closed,
}

pub type Result<T> = std::result::Result<T, WorkerError>;

pub struct WorkerState {
    pub redis_pool: RedisPool,
    pub services: Services,
    pub result_ttl_seconds: u64,
}

pub struct JobConsumer {
    state: Arc<WorkerState>,
    concurrency: usize,
}

impl JobConsumer {
    pub fn new(state: WorkerState, concurrency: usize) -> Self {
        Self {
            state: Arc::new(state),
            concurrency,
        }
    }

    /// Pulls jobs until `shutdown` resolves, then waits for the jobs already
    /// taken off the queue so none is left marked as processing.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let state = self.state.clone();
        consume(self.concurrency, shutdown, move || {
            let state = state.clone();
            async move { process_next_job(&state).await }
        })
        .await
    }
}

async fn consume<F, Fut>(
    concurrency: usize,
    shutdown: impl Future<Output = ()>,
    process: F,
) -> Result<()>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut tasks = JoinSet::new();
    tokio::pin!(shutdown);
    tracing::info!(concurrency, "consumer started");

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            permit = semaphore.clone().acquire_owned() => {
                let permit = permit.map_err(|_| WorkerError::Closed)?;
                let job = process();
                tasks.spawn(async move {
                    let _permit = permit;
                    if let Err(e) = job.await {
                        tracing::error!(error = %e, "job processing failed");
                    }
                });
            }
        }

        while tasks.try_join_next().is_some() {}
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    tracing::info!(in_flight = tasks.len(), "draining in-flight jobs");
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(error = %e, "job task panicked");
        }
    }
    Ok(())
}

async fn conn(state: &WorkerState) -> Result<Connection> {
    state
        .redis_pool
        .get()
        .await
        .map_err(|e| WorkerError::Pool(e.to_string()))
}

async fn set_status(state: &WorkerState, status: &JobResult) -> Result<()> {
    let json = serde_json::to_string(status)?;
    let mut c = conn(state).await?;
    c.set_ex::<_, _, ()>(
        keys::job_status(&status.job_id),
        &json,
        state.result_ttl_seconds,
    )
    .await
    .map_err(|e| WorkerError::Redis(e.to_string()))
}

async fn process_next_job(state: &WorkerState) -> Result<()> {
    let popped: Option<(String, String)> = {
        let mut c = conn(state).await?;
        c.brpop(&queues::ALL, 1.0)
            .await
            .map_err(|e| WorkerError::Redis(e.to_string()))?
    };

    let Some((queue, payload)) = popped else {
        return Ok(());
    };

    let job = match Job::parse(&queue, &payload) {
        Ok(job) => job,
        Err(e) => {
            tracing::error!(queue, error = %e, "dropping malformed job");
            if let Some(job_id) = job_id_of(&payload) {
                set_status(state, &JobResult::failed(job_id, e.to_string())).await?;
            }
            return Ok(());
        }
    };

    tracing::info!(job_id = %job.id(), kind = job.kind(), "processing job");
    set_status(state, &JobResult::processing(job.id())).await?;

    let result = execute(&state.services, &job).await;
    set_status(state, &result).await?;

    tracing::info!(job_id = %job.id(), status = ?result.status, "job finished");
    Ok(())
}

fn job_id_of(payload: &str) -> Option<Uuid> {
    let value: serde_json::Value = serde_json::from_str(payload).ok()?;
    value.get("job_id")?.as_str()?.parse().ok()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    init_tracing("worker=debug,job_agent=debug", config.config.log.format);

    let redis_pool = create_pool(&config.config.redis_url)?;
    info!("Redis pool initialized");

    let services = Services::build(&config).await?;
    let seeded = services.seed(&config.config.rag.seed_paths).await?;
    info!(seeded, "retrieval ready");

    let concurrency = config.config.worker.concurrency;
    let state = WorkerState {
        redis_pool,
        services,
        result_ttl_seconds: config.config.worker.result_ttl_seconds,
    };
    let consumer = JobConsumer::new(state, concurrency);

    consumer
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "ctrl-c handler failed");
            }
            info!("shutdown requested");
        })
        .await?;

    info!("worker stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_shutdown_waits_for_in_flight_jobs() {
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        let (s, f) = (started.clone(), finished.clone());
        consume(
            2,
            tokio::time::sleep(Duration::from_millis(250)),
            move || {
                let (s, f) = (s.clone(), f.clone());
                async move {
                    s.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(400)).await;
                    f.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            },
        )
        .await
        .unwrap();

        assert!(started.load(Ordering::SeqCst) > 0);
        assert_eq!(
            started.load(Ordering::SeqCst),
            finished.load(Ordering::SeqCst)
        );
    }
}
