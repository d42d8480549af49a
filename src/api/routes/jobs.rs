use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::{error::ApiResult, state::AppState};
use crate::domain::DomainError;
use crate::infrastructure::{JobResult, QueueJobStatus};

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub job_id: Uuid,
    pub status: QueueJobStatus,
}

impl EnqueueResponse {
    pub fn accepted(job_id: Uuid) -> (StatusCode, Json<Self>) {
        (
            StatusCode::ACCEPTED,
            Json(Self {
                job_id,
                status: QueueJobStatus::Queued,
            }),
        )
    }
}

pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> ApiResult<Json<JobResult>> {
    state
        .job_producer
        .get_job_status(&job_id)
        .await?
        .map(Json)
        .ok_or_else(|| DomainError::not_found(format!("Job {job_id}")).into())
}
