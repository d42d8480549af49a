//! The three roles driven by the refinement loop.
//!
//! Implementations must not keep per-run state: one instance is shared by
//! every run and runs may overlap.

use async_trait::async_trait;

use crate::domain::{errors::DomainError, Artifact, Critique, TaskContext, Verdict};

#[async_trait]
pub trait Drafter: Send + Sync {
    async fn draft(&self, context: &TaskContext) -> Result<Artifact, DomainError>;
}

#[async_trait]
pub trait Critic: Send + Sync {
    /// `Verdict::critique == None` accepts the returned artifact.
    async fn critique(
        &self,
        context: &TaskContext,
        artifact: &Artifact,
    ) -> Result<Verdict, DomainError>;
}

#[async_trait]
pub trait Reviser: Send + Sync {
    async fn revise(
        &self,
        context: &TaskContext,
        artifact: &Artifact,
        critique: &Critique,
    ) -> Result<Artifact, DomainError>;
}
