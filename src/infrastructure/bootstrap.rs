use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::application::{
    CoverLetterService, DocumentQaService, DocumentService, LlmCritic, LlmDrafter, LlmReviser,
    PlanExecuteService, RagService, RefinementLoop, ResearchService, RolePrompts,
};
use crate::domain::ports::{
    Drafter, EmbeddingService, LlmService, PageFetcher, Reviser, VectorStore,
};
use crate::domain::{Document, DomainError};
use crate::infrastructure::agent::ResearchAgent;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::document_store::InMemoryDocumentStore;
use crate::infrastructure::embedding::build_embedding;
use crate::infrastructure::fetch::HttpPageFetcher;
use crate::infrastructure::llm::build_llm;
use crate::infrastructure::loader::load_document;
use crate::infrastructure::vector_store::build_vector_store;

/// Every application service, wired from one [`AppConfig`].
pub struct Services {
    pub rag: Arc<RagService>,
    pub documents: Arc<DocumentService>,
    pub qa: Arc<DocumentQaService>,
    pub planner: Arc<PlanExecuteService>,
    pub cover_letters: Arc<CoverLetterService>,
    pub research: Arc<ResearchService>,
}

impl Services {
    /// Connects the configured backends.
    pub async fn build(app: &AppConfig) -> Result<Self, DomainError> {
        let config = &app.config;
        let llm = build_llm(&config.llm);
        let embedding = build_embedding(&config.embedding);
        let vector_store =
            build_vector_store(&config.vector_store, config.embedding.dimension).await?;
        let fetcher = Arc::new(HttpPageFetcher::new(&config.fetch)?);

        Ok(Self::assemble(app, llm, embedding, vector_store, fetcher))
    }

    pub fn assemble(
        app: &AppConfig,
        llm: Arc<dyn LlmService>,
        embedding: Arc<dyn EmbeddingService>,
        vector_store: Arc<dyn VectorStore>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        let config = &app.config;
        let retry = config.refinement.retry;

        let rag = Arc::new(RagService::new(embedding, vector_store, config.rag.top_k));
        let documents = Arc::new(
            DocumentService::new(Arc::new(InMemoryDocumentStore::new()))
                .with_chunking(config.rag.chunking())
                .with_rag(rag.clone()),
        );
        let qa = Arc::new(
            DocumentQaService::new(rag.clone(), llm.clone(), app.prompts.qa.clone())
                .with_retry(retry),
        );
        let planner = Arc::new(
            PlanExecuteService::new(llm.clone(), app.prompts.planner.clone())
                .with_max_steps(config.planner.max_steps)
                .with_retry(retry),
        );

        let cover_letter_loop = llm_loop(&llm, &app.prompts.cover_letter)
            .with_max_rounds(config.refinement.max_rounds)
            .with_retry(retry);
        let cover_letters = Arc::new(
            CoverLetterService::new(
                llm.clone(),
                fetcher,
                app.prompts.job_description.clone(),
                Arc::new(cover_letter_loop),
            )
            .with_retry(retry),
        );

        let research_roles = if config.agent.enabled {
            info!(model = %config.agent.model, "research answers use the tool agent");
            let agent = Arc::new(ResearchAgent::new(rag.clone(), app));
            let critic = Arc::new(LlmCritic::new(
                llm.clone(),
                app.prompts.research.critique.clone(),
            ));
            RefinementLoop::new(
                agent.clone() as Arc<dyn Drafter>,
                critic,
                agent as Arc<dyn Reviser>,
            )
        } else {
            llm_loop(&llm, &app.prompts.research)
        };
        let research_loop = research_roles
            .with_max_rounds(config.refinement.max_rounds)
            .with_retry(retry);
        let research = Arc::new(ResearchService::new(Arc::new(research_loop)));

        Self {
            rag,
            documents,
            qa,
            planner,
            cover_letters,
            research,
        }
    }

    /// Loads and indexes every seed file; returns how many were indexed.
    pub async fn seed(&self, paths: &[PathBuf]) -> Result<usize, DomainError> {
        for path in paths {
            let loaded = load_document(path)?;
            let doc = Document::new(&loaded.name).with_content_type(loaded.content_type);
            let (doc, chunks) = self.documents.ingest_document(doc, &loaded.content).await?;
            info!(
                path = %path.display(),
                document_id = %doc.id,
                chunks = chunks.len(),
                "seed document indexed"
            );
        }
        Ok(paths.len())
    }
}

fn llm_loop(llm: &Arc<dyn LlmService>, prompts: &RolePrompts) -> RefinementLoop {
    RefinementLoop::new(
        Arc::new(LlmDrafter::new(llm.clone(), prompts.draft.clone())),
        Arc::new(LlmCritic::new(llm.clone(), prompts.critique.clone())),
        Arc::new(LlmReviser::new(llm.clone(), prompts.revise.clone())),
    )
}
