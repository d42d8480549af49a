pub mod agent;
pub mod bootstrap;
pub mod config;
pub mod document_store;
pub mod embedding;
pub mod fetch;
pub mod llm;
pub mod loader;
pub mod queue;
pub mod telemetry;
pub mod tools;
pub mod vector_store;

pub use agent::ResearchAgent;
pub use bootstrap::Services;
pub use config::{AppConfig, Config, ConfigError, PromptsConfig};
pub use document_store::InMemoryDocumentStore;
pub use embedding::{build_embedding, CachedEmbedding, TextEmbedding};
pub use fetch::HttpPageFetcher;
pub use llm::{build_llm, AnthropicLlm, OpenAiLlm};
pub use loader::{load_document, LoadedDocument};
pub use queue::{
    keys, queues, CoverLetterJob, IndexDocumentJob, Job, JobResult, PlanJob, QueueJobStatus,
    ResearchJob,
};
pub use telemetry::init_tracing;
pub use tools::KnowledgeBaseTool;
pub use vector_store::{build_vector_store, InMemoryVectorStore, QdrantVectorStore};
