//! Application layer - Use cases and orchestration.
//!
//! This module contains application services that orchestrate domain logic
//! and infrastructure. Services depend on domain ports (traits) rather than
//! concrete implementations.

pub mod refinement;
pub mod retry;
pub mod roles;
pub mod services;
pub mod structured;

pub use refinement::RefinementLoop;
pub use retry::RetryPolicy;
pub use roles::{
    parse_revision, render_role_prompt, LlmCritic, LlmDrafter, LlmReviser, RolePrompts,
};
pub use services::{
    Answer, CoverLetterService, DocumentQaService, DocumentService, JobSource, PlanExecuteService,
    PlanOutcome, PlannerPrompts, QaPrompts, RagService, ResearchService,
};
