use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::jobs::EnqueueResponse;
use crate::api::{error::ApiResult, state::AppState};
use crate::domain::DomainError;
use crate::infrastructure::PlanJob;

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub task: String,
}

pub async fn create_plan(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> ApiResult<(StatusCode, Json<EnqueueResponse>)> {
    if request.task.trim().is_empty() {
        return Err(DomainError::validation("task must not be empty").into());
    }

    let job_id = state
        .job_producer
        .push_plan_job(&PlanJob::new(request.task))
        .await?;
    Ok(EnqueueResponse::accepted(job_id))
}
