use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    DocumentChunk, DomainError, Embedding, SearchResult,
};

/// Top-k similarity search over embedded chunks. `k` is fixed per instance
/// unless a caller asks for an explicit `retrieve_top_k`.
pub struct RagService {
    embedding: Arc<dyn EmbeddingService>,
    vector_store: Arc<dyn VectorStore>,
    default_top_k: usize,
}

impl RagService {
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        default_top_k: usize,
    ) -> Self {
        Self {
            embedding,
            vector_store,
            default_top_k,
        }
    }

    pub fn top_k(&self) -> usize {
        self.default_top_k
    }

    #[instrument(skip(self), fields(top_k = self.default_top_k))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>, DomainError> {
        self.retrieve_top_k(query, self.default_top_k).await
    }

    #[instrument(skip(self))]
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        if top_k == 0 || self.vector_store.count().await? == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedding.embed(query).await?;
        self.vector_store.search(&embedding, top_k).await
    }

    #[instrument(skip(self, chunk), fields(chunk_id = %chunk.id))]
    pub async fn index_chunk(&self, chunk: &DocumentChunk) -> Result<(), DomainError> {
        let embedding = self.embedding.embed(&chunk.content).await?;
        self.vector_store.upsert(chunk, &embedding).await
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn index_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), DomainError> {
        let embeddings = self.embed_chunks(chunks).await?;
        self.upsert_all(chunks, &embeddings).await
    }

    /// One embedding per chunk, in order. Nothing is written.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn embed_chunks(
        &self,
        chunks: &[DocumentChunk],
    ) -> Result<Vec<Embedding>, DomainError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedding.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(DomainError::internal(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }
        Ok(embeddings)
    }

    /// Swaps a document's indexed chunks for `chunks`, embedded beforehand
    /// with [`RagService::embed_chunks`].
    #[instrument(skip(self, chunks, embeddings), fields(count = chunks.len()))]
    pub async fn replace_document(
        &self,
        document_id: Uuid,
        chunks: &[DocumentChunk],
        embeddings: &[Embedding],
    ) -> Result<(), DomainError> {
        if embeddings.len() != chunks.len() {
            return Err(DomainError::internal("Chunks and embeddings differ in length"));
        }
        self.vector_store.delete_by_document(document_id).await?;
        self.upsert_all(chunks, embeddings).await
    }

    async fn upsert_all(
        &self,
        chunks: &[DocumentChunk],
        embeddings: &[Embedding],
    ) -> Result<(), DomainError> {
        for (chunk, embedding) in chunks.iter().zip(embeddings) {
            self.vector_store.upsert(chunk, embedding).await?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_document(&self, document_id: Uuid) -> Result<(), DomainError> {
        self.vector_store.delete_by_document(document_id).await
    }
}
