mod document_store;
mod embedding;
mod fetcher;
mod llm;
mod refinement;
mod vector_store;

pub use document_store::DocumentStore;
pub use embedding::EmbeddingService;
pub use fetcher::PageFetcher;
pub use llm::LlmService;
pub use refinement::{Critic, Drafter, Reviser};
pub use vector_store::VectorStore;
