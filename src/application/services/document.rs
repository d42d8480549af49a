use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::application::RagService;
use crate::domain::{
    chunk_content, ports::DocumentStore, ChunkConfig, ChunkMetadata, Document, DocumentChunk,
    DomainError,
};

pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    chunking: ChunkConfig,
    rag: Option<Arc<RagService>>,
}

impl DocumentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            chunking: ChunkConfig::default(),
            rag: None,
        }
    }

    pub fn with_chunking(mut self, chunking: ChunkConfig) -> Self {
        self.chunking = chunking;
        self
    }

    /// Ingested chunks are embedded and indexed as well.
    pub fn with_rag(mut self, rag: Arc<RagService>) -> Self {
        self.rag = Some(rag);
        self
    }

    #[instrument(skip(self, content))]
    pub async fn ingest(
        &self,
        name: &str,
        content: &str,
    ) -> Result<(Document, Vec<DocumentChunk>), DomainError> {
        self.ingest_document(Document::new(name), content).await
    }

    /// Stores `doc`, chunks `content` and, when retrieval is wired, indexes
    /// the chunks. Re-ingesting an id replaces its previous chunks. Chunks
    /// are embedded before anything is written, so a failed embedding leaves
    /// the store and the index as they were.
    #[instrument(skip(self, doc, content), fields(document_id = %doc.id, name = %doc.name))]
    pub async fn ingest_document(
        &self,
        doc: Document,
        content: &str,
    ) -> Result<(Document, Vec<DocumentChunk>), DomainError> {
        if content.trim().is_empty() {
            return Err(DomainError::validation(format!(
                "Document '{}' has no text content",
                doc.name
            )));
        }

        let metadata = ChunkMetadata {
            source: Some(doc.name.clone()),
        };
        let chunks: Vec<DocumentChunk> = chunk_content(doc.id, content, self.chunking)
            .into_iter()
            .map(|c| c.with_metadata(metadata.clone()))
            .collect();

        let embedded = match &self.rag {
            Some(rag) => Some((rag, rag.embed_chunks(&chunks).await?)),
            None => None,
        };

        self.store.save_document(&doc).await?;
        self.store.save_chunks(&chunks).await?;
        if let Some((rag, embeddings)) = embedded {
            rag.replace_document(doc.id, &chunks, &embeddings).await?;
        }

        info!(chunks = chunks.len(), "document ingested");
        Ok((doc, chunks))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<Option<Document>, DomainError> {
        self.store.get_document(id).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        if let Some(rag) = &self.rag {
            rag.delete_document(id).await?;
        }
        self.store.delete_document(id).await
    }
}
