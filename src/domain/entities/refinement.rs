use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only input bundle for one refinement run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskContext {
    pub task: String,
    pub documents: Vec<ContextDocument>,
}

impl TaskContext {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            documents: Vec::new(),
        }
    }

    pub fn with_document(mut self, label: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.push(ContextDocument {
            label: label.into(),
            content: content.into(),
        });
        self
    }

    pub fn document(&self, label: &str) -> Option<&str> {
        self.documents
            .iter()
            .find(|d| d.label == label)
            .map(|d| d.content.as_str())
    }

    /// Supporting documents as `Label:\ncontent` blocks separated by blank lines.
    pub fn render_documents(&self) -> String {
        self.documents
            .iter()
            .map(|d| format!("{}:\n{}", d.label, d.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDocument {
    pub label: String,
    pub content: String,
}

/// The text being iteratively improved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifact(String);

impl Artifact {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for Artifact {
    fn from(text: String) -> Self {
        Self(text)
    }
}

impl From<&str> for Artifact {
    fn from(text: &str) -> Self {
        Self(text.to_string())
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Judge feedback. Any critique, including an empty one, keeps the loop going.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Critique(String);

impl Critique {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Critique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the critic hands back: an optional critique and the artifact it
/// judged, possibly touched up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub critique: Option<Critique>,
    pub artifact: Artifact,
}

impl Verdict {
    pub fn accept(artifact: impl Into<Artifact>) -> Self {
        Self {
            critique: None,
            artifact: artifact.into(),
        }
    }

    pub fn reject(critique: impl Into<String>, artifact: impl Into<Artifact>) -> Self {
        Self {
            critique: Some(Critique::new(critique)),
            artifact: artifact.into(),
        }
    }
}

/// Controller states. The artifact moves through the states by value, so
/// exactly one owner holds it at any point.
#[derive(Debug)]
pub enum RefineState {
    Drafting,
    Critiquing(Artifact),
    Revising(Artifact, Critique),
    Done(Artifact),
}

impl RefineState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Drafting => "drafting",
            Self::Critiquing(_) => "critiquing",
            Self::Revising(..) => "revising",
            Self::Done(_) => "done",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinementStats {
    pub drafts: usize,
    pub critiques: usize,
    pub revisions: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refinement {
    pub artifact: Artifact,
    pub stats: RefinementStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_documents() {
        let ctx = TaskContext::new("write a cover letter")
            .with_document("Job Description", "Rust engineer")
            .with_document("Resume", "10 years of systems work");

        assert_eq!(
            ctx.render_documents(),
            "Job Description:\nRust engineer\n\nResume:\n10 years of systems work"
        );
        assert_eq!(ctx.document("Resume"), Some("10 years of systems work"));
        assert_eq!(ctx.document("Portfolio"), None);
    }

    #[test]
    fn test_verdict_constructors() {
        assert!(Verdict::accept("A").critique.is_none());

        let verdict = Verdict::reject("", "A");
        assert_eq!(verdict.critique, Some(Critique::new("")));
        assert_eq!(verdict.artifact.as_str(), "A");
    }

    #[test]
    fn test_artifact_serializes_as_plain_string() {
        let json = serde_json::to_string(&Artifact::new("hello")).unwrap();
        assert_eq!(json, "\"hello\"");
    }
}
