use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jobs::EnqueueResponse;
use crate::api::{
    error::{ApiError, ApiResult},
    state::AppState,
};
use crate::application::{Answer, DocumentService, RagService};
use crate::domain::{Document, DomainError};
use crate::infrastructure::IndexDocumentJob;

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    pub name: String,
    pub content: String,
}

/// Carries `chunks` when indexed in this process, or the queued job.
#[derive(Debug, Serialize)]
pub struct CreateDocumentResponse {
    pub document_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<usize>,
    #[serde(flatten)]
    pub job: Option<EnqueueResponse>,
}

#[derive(Debug, Deserialize)]
pub struct SearchDocumentsRequest {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultResponse {
    pub chunk_id: Uuid,
    pub document_id: Uuid,
    pub source: Option<String>,
    pub content: String,
    pub score: f32,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

fn rag(state: &AppState) -> ApiResult<&RagService> {
    state
        .rag_service
        .as_deref()
        .ok_or(ApiError::Unavailable("Document retrieval"))
}

fn documents(state: &AppState) -> ApiResult<&DocumentService> {
    state
        .document_service
        .as_deref()
        .ok_or(ApiError::Unavailable("Document indexing"))
}

pub async fn create_document(
    State(state): State<AppState>,
    Json(request): Json<CreateDocumentRequest>,
) -> ApiResult<(StatusCode, Json<CreateDocumentResponse>)> {
    if request.name.trim().is_empty() || request.content.trim().is_empty() {
        return Err(DomainError::validation("name and content must not be empty").into());
    }

    if state.index_inline {
        let (doc, chunks) = documents(&state)?
            .ingest_document(Document::new(&request.name), &request.content)
            .await?;
        return Ok((
            StatusCode::CREATED,
            Json(CreateDocumentResponse {
                document_id: doc.id,
                chunks: Some(chunks.len()),
                job: None,
            }),
        ));
    }

    let job = IndexDocumentJob::new(request.name, request.content);
    let job_id = state.job_producer.push_index_job(&job).await?;
    let (status, Json(enqueued)) = EnqueueResponse::accepted(job_id);

    Ok((
        status,
        Json(CreateDocumentResponse {
            document_id: job.document_id,
            chunks: None,
            job: Some(enqueued),
        }),
    ))
}

pub async fn search_documents(
    State(state): State<AppState>,
    Json(request): Json<SearchDocumentsRequest>,
) -> ApiResult<Json<Vec<SearchResultResponse>>> {
    let rag = rag(&state)?;
    let top_k = request.limit.unwrap_or_else(|| rag.top_k());
    let results = rag.retrieve_top_k(&request.query, top_k).await?;

    Ok(Json(
        results
            .into_iter()
            .map(|r| SearchResultResponse {
                chunk_id: r.chunk.id,
                document_id: r.chunk.document_id,
                source: r.chunk.metadata.source,
                content: r.chunk.content,
                score: r.score,
            })
            .collect(),
    ))
}

pub async fn ask_documents(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> ApiResult<Json<Answer>> {
    let qa = state
        .qa_service
        .as_deref()
        .ok_or(ApiError::Unavailable("Document Q&A"))?;
    Ok(Json(qa.ask(&request.question).await?))
}

/// Removes the document and its indexed chunks. Documents indexed by the
/// worker are only known to the shared index, so the 404 check applies to
/// inline indexing.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let documents = documents(&state)?;
    if state.index_inline && documents.get(id).await?.is_none() {
        return Err(DomainError::not_found(format!("Document {id} not found")).into());
    }

    documents.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
