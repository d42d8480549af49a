use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::api::queue::QueueError;
use crate::domain::DomainError;

/// Handler error; renders as `{"error": {"code", "message"}}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("{0} is not configured in this process")]
    Unavailable(&'static str),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Domain(e) => match e {
                DomainError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                DomainError::NotConverged { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "NOT_CONVERGED")
                }
                DomainError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT"),
                DomainError::ExternalService(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
                DomainError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            ApiError::Queue(_) => (StatusCode::SERVICE_UNAVAILABLE, "QUEUE_ERROR"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        } else {
            tracing::debug!(error = %self, code, "request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (DomainError::validation("bad"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("gone"), StatusCode::NOT_FOUND),
            (DomainError::timeout("slow"), StatusCode::GATEWAY_TIMEOUT),
            (DomainError::external("503"), StatusCode::BAD_GATEWAY),
            (DomainError::internal("bug"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_not_converged_is_unprocessable() {
        let err = ApiError::from(DomainError::NotConverged {
            rounds: 2,
            critique: "still long".into(),
            artifact: "A".into(),
        });
        assert_eq!(err.into_response().status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
