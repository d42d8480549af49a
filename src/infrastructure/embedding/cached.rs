use async_trait::async_trait;
use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};

/// Memoizes embeddings per `(model, text)` in a bounded in-memory cache,
/// optionally backed by one JSON file per entry under a directory so the
/// cache survives restarts.
pub struct CachedEmbedding {
    inner: Arc<dyn EmbeddingService>,
    memory: Cache<(String, String), Embedding>,
    dir: Option<PathBuf>,
}

impl CachedEmbedding {
    pub fn new(inner: Arc<dyn EmbeddingService>, max_entries: u64) -> Self {
        Self {
            inner,
            memory: Cache::new(max_entries),
            dir: None,
        }
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    fn key(&self, text: &str) -> (String, String) {
        (self.inner.model().to_string(), text.to_string())
    }

    fn entry_path(&self, dir: &Path, text: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(self.inner.model().as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        dir.join(format!("{}.json", hex::encode(hasher.finalize())))
    }

    /// Entries currently held in memory.
    pub async fn entry_count(&self) -> u64 {
        self.memory.run_pending_tasks().await;
        self.memory.entry_count()
    }

    async fn lookup(&self, text: &str) -> Option<Embedding> {
        let key = self.key(text);
        if let Some(hit) = self.memory.get(&key).await {
            return Some(hit);
        }

        let dir = self.dir.as_deref()?;
        let path = self.entry_path(dir, text);
        let bytes = tokio::fs::read(&path).await.ok()?;
        match serde_json::from_slice::<Embedding>(&bytes) {
            Ok(embedding) => {
                self.memory.insert(key, embedding.clone()).await;
                Some(embedding)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt cache entry");
                None
            }
        }
    }

    async fn store(&self, text: &str, embedding: &Embedding) {
        self.memory.insert(self.key(text), embedding.clone()).await;

        let Some(dir) = self.dir.as_deref() else {
            return;
        };
        if let Err(e) = write_entry(dir, &self.entry_path(dir, text), embedding).await {
            warn!(dir = %dir.display(), error = %e, "embedding cache write failed");
        }
    }
}

async fn write_entry(dir: &Path, path: &Path, embedding: &Embedding) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let json = serde_json::to_vec(embedding).map_err(std::io::Error::other)?;
    tokio::fs::write(path, json).await
}

#[async_trait]
impl EmbeddingService for CachedEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        if let Some(hit) = self.lookup(text).await {
            return Ok(hit);
        }

        let embedding = self.inner.embed(text).await?;
        self.store(text, &embedding).await;
        Ok(embedding)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        let mut found = Vec::with_capacity(texts.len());
        for text in texts {
            found.push(self.lookup(text).await);
        }

        let misses: Vec<&str> = texts
            .iter()
            .zip(&found)
            .filter(|(_, hit)| hit.is_none())
            .map(|(text, _)| *text)
            .collect();
        debug!(total = texts.len(), misses = misses.len(), "embedding batch");

        if !misses.is_empty() {
            let fresh = self.inner.embed_batch(&misses).await?;
            if fresh.len() != misses.len() {
                return Err(DomainError::internal("Embedding batch size mismatch"));
            }

            let mut fresh = fresh.into_iter();
            for (slot, text) in found.iter_mut().zip(texts) {
                if slot.is_none() {
                    let embedding = fresh
                        .next()
                        .ok_or_else(|| DomainError::internal("Embedding batch size mismatch"))?;
                    self.store(text, &embedding).await;
                    *slot = Some(embedding);
                }
            }
        }

        found
            .into_iter()
            .map(|e| e.ok_or_else(|| DomainError::internal("Missing embedding")))
            .collect()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}
