//! Scripted stand-ins for the domain ports, shared by unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::ports::{Critic, Drafter, EmbeddingService, LlmService, PageFetcher, Reviser};
use crate::domain::{Artifact, Critique, DomainError, Embedding, TaskContext, Verdict};

/// Replays canned completions in order and records every prompt it saw.
#[derive(Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, DomainError>>>,
    pub calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedLlm {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(|r| Ok(r.into())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_err(self, err: DomainError) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn push(self, response: impl Into<String>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(response.into()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn prompt(&self, index: usize) -> String {
        self.calls.lock().unwrap()[index].1.clone()
    }

    pub fn system(&self, index: usize) -> String {
        self.calls.lock().unwrap()[index].0.clone()
    }
}

#[async_trait]
impl LlmService for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        self.complete_with_system("", prompt).await
    }

    async fn complete_with_system(
        &self,
        system: &str,
        prompt: &str,
    ) -> Result<String, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(DomainError::internal("script exhausted")))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// Letter-frequency embedding: texts sharing letters land close together.
/// Setting `failing` makes every call fail like an unreachable provider.
#[derive(Default)]
pub struct LetterEmbedding {
    pub calls: AtomicUsize,
    pub failing: AtomicBool,
}

impl LetterEmbedding {
    pub fn vector(text: &str) -> Embedding {
        let mut counts = vec![0.0f32; 26];
        for c in text.chars().filter(|c| c.is_ascii_alphabetic()) {
            counts[(c.to_ascii_lowercase() as u8 - b'a') as usize] += 1.0;
        }
        Embedding::new(counts)
    }

    fn check(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::external("embedding provider unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl EmbeddingService for LetterEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.check()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        self.check()?;
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimension(&self) -> usize {
        26
    }

    fn model(&self) -> &str {
        "letters"
    }
}

/// Drafter, critic and reviser in one, each replaying its own script.
///
/// Exhausted scripts fall back to: draft `"draft"`, accept the artifact
/// (or reject it forever after `reject_forever`), and revise by appending `'`.
#[derive(Default)]
pub struct ScriptedRoles {
    drafts: Mutex<VecDeque<Result<Artifact, DomainError>>>,
    verdicts: Mutex<VecDeque<Result<Verdict, DomainError>>>,
    revisions: Mutex<VecDeque<Result<Artifact, DomainError>>>,
    reject_forever: Option<String>,
    pub draft_calls: AtomicUsize,
    pub critique_calls: AtomicUsize,
    pub revise_calls: AtomicUsize,
    pub seen_critiques: Mutex<Vec<String>>,
}

impl ScriptedRoles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(self, result: Result<&str, DomainError>) -> Self {
        self.drafts
            .lock()
            .unwrap()
            .push_back(result.map(Artifact::from));
        self
    }

    pub fn verdict(self, result: Result<Verdict, DomainError>) -> Self {
        self.verdicts.lock().unwrap().push_back(result);
        self
    }

    pub fn revision(self, result: Result<&str, DomainError>) -> Self {
        self.revisions
            .lock()
            .unwrap()
            .push_back(result.map(Artifact::from));
        self
    }

    pub fn reject_forever(mut self, critique: &str) -> Self {
        self.reject_forever = Some(critique.to_string());
        self
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (
            self.draft_calls.load(Ordering::SeqCst),
            self.critique_calls.load(Ordering::SeqCst),
            self.revise_calls.load(Ordering::SeqCst),
        )
    }
}

#[async_trait]
impl Drafter for ScriptedRoles {
    async fn draft(&self, _context: &TaskContext) -> Result<Artifact, DomainError> {
        self.draft_calls.fetch_add(1, Ordering::SeqCst);
        self.drafts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Artifact::new("draft")))
    }
}

#[async_trait]
impl Critic for ScriptedRoles {
    async fn critique(
        &self,
        _context: &TaskContext,
        artifact: &Artifact,
    ) -> Result<Verdict, DomainError> {
        self.critique_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.verdicts.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| {
            Ok(match &self.reject_forever {
                Some(critique) => Verdict::reject(critique.as_str(), artifact.clone()),
                None => Verdict::accept(artifact.clone()),
            })
        })
    }
}

#[async_trait]
impl Reviser for ScriptedRoles {
    async fn revise(
        &self,
        _context: &TaskContext,
        artifact: &Artifact,
        critique: &Critique,
    ) -> Result<Artifact, DomainError> {
        self.revise_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_critiques
            .lock()
            .unwrap()
            .push(critique.as_str().to_string());
        let scripted = self.revisions.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(Artifact::new(format!("{}'", artifact))))
    }
}

/// Serves pages from a fixed map; unknown URLs fail like a dead host.
#[derive(Default)]
pub struct StaticFetcher {
    pages: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    async fn fetch(&self, url: &str) -> Result<String, DomainError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| DomainError::external(format!("connection refused: {url}")))
    }
}
