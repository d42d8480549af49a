use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::domain::{ports::DocumentStore, Document, DocumentChunk, DomainError};

#[derive(Default)]
struct Inner {
    documents: HashMap<Uuid, Document>,
    chunks: HashMap<Uuid, Vec<DocumentChunk>>,
}

/// Process-local document registry.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    inner: RwLock<Inner>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn save_document(&self, doc: &Document) -> Result<(), DomainError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        inner.documents.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, DomainError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        Ok(inner.documents.get(&id).cloned())
    }

    async fn delete_document(&self, id: Uuid) -> Result<(), DomainError> {
        let mut inner = self
            .inner
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        inner.documents.remove(&id);
        inner.chunks.remove(&id);
        Ok(())
    }

    /// Replaces every stored chunk of the documents present in `chunks`.
    async fn save_chunks(&self, chunks: &[DocumentChunk]) -> Result<(), DomainError> {
        let mut grouped: HashMap<Uuid, Vec<DocumentChunk>> = HashMap::new();
        for chunk in chunks {
            grouped
                .entry(chunk.document_id)
                .or_default()
                .push(chunk.clone());
        }

        let mut inner = self
            .inner
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        for (document_id, mut group) in grouped {
            group.sort_by_key(|c| c.chunk_index);
            inner.chunks.insert(document_id, group);
        }
        Ok(())
    }

    async fn get_chunks(&self, document_id: Uuid) -> Result<Vec<DocumentChunk>, DomainError> {
        let inner = self
            .inner
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;
        Ok(inner.chunks.get(&document_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_and_get_document() {
        let store = InMemoryDocumentStore::new();
        let doc = Document::new("resume.md");

        store.save_document(&doc).await.unwrap();

        let found = store.get_document(doc.id).await.unwrap().unwrap();
        assert_eq!(found.name, "resume.md");
        assert!(store.get_document(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_chunks_replaces_previous_set() {
        let store = InMemoryDocumentStore::new();
        let doc_id = Uuid::new_v4();

        store
            .save_chunks(&[
                DocumentChunk::new(doc_id, "a", 0),
                DocumentChunk::new(doc_id, "b", 1),
            ])
            .await
            .unwrap();
        store
            .save_chunks(&[DocumentChunk::new(doc_id, "c", 0)])
            .await
            .unwrap();

        let chunks = store.get_chunks(doc_id).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "c");
    }

    #[tokio::test]
    async fn test_delete_removes_chunks() {
        let store = InMemoryDocumentStore::new();
        let doc = Document::new("notes.txt");
        store.save_document(&doc).await.unwrap();
        store
            .save_chunks(&[DocumentChunk::new(doc.id, "x", 0)])
            .await
            .unwrap();

        store.delete_document(doc.id).await.unwrap();

        assert!(store.get_document(doc.id).await.unwrap().is_none());
        assert!(store.get_chunks(doc.id).await.unwrap().is_empty());
    }
}
