pub mod cover_letter;
pub mod document;
pub mod planner;
pub mod qa;
pub mod rag;
pub mod research;

pub use cover_letter::{CoverLetterService, JobSource};
pub use document::DocumentService;
pub use planner::{PlanExecuteService, PlanOutcome, PlannerPrompts};
pub use qa::{Answer, DocumentQaService, QaPrompts};
pub use rag::RagService;
pub use research::ResearchService;
