use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use super::jobs::EnqueueResponse;
use crate::api::{error::ApiResult, state::AppState};
use crate::application::JobSource;
use crate::domain::DomainError;
use crate::infrastructure::CoverLetterJob;

/// Exactly one of `job_url`, `job_html` or `job_description` must be set.
#[derive(Debug, Deserialize)]
pub struct CoverLetterRequest {
    pub job_url: Option<String>,
    pub job_html: Option<String>,
    pub job_description: Option<String>,
    pub resume: String,
}

impl CoverLetterRequest {
    pub fn into_job(self) -> Result<CoverLetterJob, DomainError> {
        if self.resume.trim().is_empty() {
            return Err(DomainError::validation("resume must not be empty"));
        }

        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let sources: Vec<JobSource> = [
            present(self.job_url).map(JobSource::Url),
            present(self.job_html).map(JobSource::Html),
            present(self.job_description).map(JobSource::Description),
        ]
        .into_iter()
        .flatten()
        .collect();

        match <[JobSource; 1]>::try_from(sources) {
            Ok([source]) => Ok(CoverLetterJob::new(source, self.resume)),
            Err(_) => Err(DomainError::validation(
                "Provide exactly one of job_url, job_html or job_description",
            )),
        }
    }
}

pub async fn create_cover_letter(
    State(state): State<AppState>,
    Json(request): Json<CoverLetterRequest>,
) -> ApiResult<(StatusCode, Json<EnqueueResponse>)> {
    let job = request.into_job()?;
    let job_id = state.job_producer.push_cover_letter_job(&job).await?;
    Ok(EnqueueResponse::accepted(job_id))
}
