use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::domain::{ports::VectorStore, DocumentChunk, DomainError, Embedding, SearchResult};

type Entries = HashMap<Uuid, (DocumentChunk, Embedding)>;

/// Brute-force cosine search over every chunk held in memory, keyed by
/// chunk id.
#[derive(Default)]
pub struct InMemoryVectorStore {
    entries: RwLock<Entries>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Entries>, DomainError> {
        self.entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Entries>, DomainError> {
        self.entries
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(
        &self,
        chunk: &DocumentChunk,
        embedding: &Embedding,
    ) -> Result<(), DomainError> {
        self.write()?
            .insert(chunk.id, (chunk.clone(), embedding.clone()));
        Ok(())
    }

    async fn search(
        &self,
        query: &Embedding,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let entries = self.read()?;
        let mut scored: Vec<SearchResult> = entries
            .values()
            .map(|(chunk, embedding)| SearchResult {
                chunk: chunk.clone(),
                score: query.cosine_similarity(embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_by_document(&self, document_id: Uuid) -> Result<(), DomainError> {
        self.write()?
            .retain(|_, (chunk, _)| chunk.document_id != document_id);
        Ok(())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_and_search() {
        let store = InMemoryVectorStore::new();
        let doc_id = Uuid::new_v4();

        let chunk = DocumentChunk::new(doc_id, "cover letter guide", 0);
        let embedding = Embedding::new(vec![1.0, 0.0, 0.0]);

        store.upsert(&chunk, &embedding).await.unwrap();

        let query = Embedding::new(vec![1.0, 0.0, 0.0]);
        let results = store.search(&query, 1).await.unwrap();

        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_delete_by_document() {
        let store = InMemoryVectorStore::new();
        let doc_id = Uuid::new_v4();

        let chunk = DocumentChunk::new(doc_id, "test", 0);
        let embedding = Embedding::new(vec![1.0, 0.0, 0.0]);

        store.upsert(&chunk, &embedding).await.unwrap();
        store.delete_by_document(doc_id).await.unwrap();

        let query = Embedding::new(vec![1.0, 0.0, 0.0]);
        let results = store.search(&query, 10).await.unwrap();

        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_orders_by_score_and_truncates() {
        let store = InMemoryVectorStore::new();
        let doc_id = Uuid::new_v4();
        let near = DocumentChunk::new(doc_id, "near", 0);
        let far = DocumentChunk::new(doc_id, "far", 1);
        let middle = DocumentChunk::new(doc_id, "middle", 2);

        store.upsert(&far, &Embedding::new(vec![0.0, 1.0])).await.unwrap();
        store.upsert(&near, &Embedding::new(vec![1.0, 0.0])).await.unwrap();
        store.upsert(&middle, &Embedding::new(vec![1.0, 1.0])).await.unwrap();

        let results = store.search(&Embedding::new(vec![1.0, 0.0]), 2).await.unwrap();

        let contents: Vec<_> = results.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(contents, vec!["near", "middle"]);
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_chunk_id() {
        let store = InMemoryVectorStore::new();
        let chunk = DocumentChunk::new(Uuid::new_v4(), "v1", 0);

        store.upsert(&chunk, &Embedding::new(vec![1.0])).await.unwrap();
        store.upsert(&chunk, &Embedding::new(vec![1.0])).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
    }
}
