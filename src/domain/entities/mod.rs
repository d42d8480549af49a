mod document;
mod embedding;
mod plan;
mod prompt;
mod refinement;

pub use document::{
    chunk_content, ChunkConfig, ChunkMetadata, Document, DocumentChunk, SearchResult,
};
pub use embedding::Embedding;
pub use plan::{Plan, PlanProgress};
pub use prompt::{render, PromptTemplate};
pub use refinement::{
    Artifact, ContextDocument, Critique, RefineState, Refinement, RefinementStats, TaskContext,
    Verdict,
};
