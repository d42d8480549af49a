mod cached;
mod text;

pub use cached::CachedEmbedding;
pub use text::TextEmbedding;

use std::sync::Arc;

use crate::domain::ports::EmbeddingService;
use crate::infrastructure::config::EmbeddingConfig;

pub fn build_embedding(config: &EmbeddingConfig) -> Arc<dyn EmbeddingService> {
    let embedding: Arc<dyn EmbeddingService> = Arc::new(TextEmbedding::from_config(config));
    if !config.cache {
        return embedding;
    }

    let cached = CachedEmbedding::new(embedding, config.cache_capacity);
    match &config.cache_dir {
        Some(dir) => Arc::new(cached.with_dir(dir)),
        None => Arc::new(cached),
    }
}
