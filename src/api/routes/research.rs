use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::jobs::EnqueueResponse;
use crate::api::{error::ApiResult, state::AppState};
use crate::domain::DomainError;
use crate::infrastructure::ResearchJob;

#[derive(Debug, Deserialize)]
pub struct ResearchRequest {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
}

pub async fn create_research(
    State(state): State<AppState>,
    Json(request): Json<ResearchRequest>,
) -> ApiResult<(StatusCode, Json<EnqueueResponse>)> {
    if request.question.trim().is_empty() {
        return Err(DomainError::validation("question must not be empty").into());
    }

    let job = ResearchJob::new(request.question, request.options);
    let job_id = state.job_producer.push_research_job(&job).await?;
    Ok(EnqueueResponse::accepted(job_id))
}
