use std::sync::Arc;

use crate::api::queue::{JobProducer, RedisPool};
use crate::application::{DocumentQaService, DocumentService, RagService};
use crate::infrastructure::config::VectorBackend;
use crate::infrastructure::{AppConfig, Services};

#[derive(Clone)]
pub struct AppState {
    pub redis_pool: RedisPool,
    pub job_producer: JobProducer,
    pub rag_service: Option<Arc<RagService>>,
    pub qa_service: Option<Arc<DocumentQaService>>,
    pub document_service: Option<Arc<DocumentService>>,
    /// Documents are indexed by this process instead of the worker. Set when
    /// the vector store lives in process memory, which the worker cannot see.
    pub index_inline: bool,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(redis_pool: RedisPool, config: AppConfig) -> Self {
        let config = Arc::new(config);
        let job_producer =
            JobProducer::new(redis_pool.clone(), config.config.worker.result_ttl_seconds);
        Self {
            redis_pool,
            job_producer,
            rag_service: None,
            qa_service: None,
            document_service: None,
            index_inline: false,
            config,
        }
    }

    /// Serves retrieval and Q&A from this process.
    pub fn with_services(mut self, services: &Services) -> Self {
        self.rag_service = Some(services.rag.clone());
        self.qa_service = Some(services.qa.clone());
        self.document_service = Some(services.documents.clone());
        self.index_inline = self.config.config.vector_store.backend == VectorBackend::Memory;
        self
    }
}
