mod in_memory;
mod qdrant;

pub use in_memory::InMemoryVectorStore;
pub use qdrant::QdrantVectorStore;

use std::sync::Arc;

use crate::domain::{ports::VectorStore, DomainError};
use crate::infrastructure::config::{VectorBackend, VectorStoreConfig};

pub async fn build_vector_store(
    config: &VectorStoreConfig,
    dimension: usize,
) -> Result<Arc<dyn VectorStore>, DomainError> {
    match config.backend {
        VectorBackend::Memory => Ok(Arc::new(InMemoryVectorStore::new())),
        VectorBackend::Qdrant => Ok(Arc::new(
            QdrantVectorStore::from_config(config, dimension).await?,
        )),
    }
}
