use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::application::{PlannerPrompts, QaPrompts, RetryPolicy, RolePrompts};
use crate::domain::{ChunkConfig, PromptTemplate};

pub const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";
pub const DEFAULT_PROMPTS_PATH: &str = "config/prompts.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Runtime settings plus the prompt sets.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    /// Reads `APP_CONFIG` / `PROMPTS_CONFIG` (or the default paths), then
    /// applies environment overrides. Missing files fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("APP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let prompts_path =
            std::env::var("PROMPTS_CONFIG").unwrap_or_else(|_| DEFAULT_PROMPTS_PATH.to_string());

        let mut app = Self::load(Path::new(&config_path), Path::new(&prompts_path))?;
        app.config.apply_overrides(|key| std::env::var(key).ok())?;
        app.config.validate()?;
        Ok(app)
    }

    pub fn load(config_path: &Path, prompts_path: &Path) -> Result<Self, ConfigError> {
        Ok(Self {
            config: read_yaml_or_default(config_path)?,
            prompts: read_yaml_or_default(prompts_path)?,
        })
    }
}

fn read_yaml_or_default<T>(path: &Path) -> Result<T, ConfigError>
where
    T: for<'de> Deserialize<'de> + Default,
{
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file missing, using defaults");
        return Ok(T::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub redis_url: String,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub vector_store: VectorStoreConfig,
    pub rag: RagConfig,
    pub refinement: RefinementConfig,
    pub planner: PlannerConfig,
    pub agent: AgentConfig,
    pub tools: ToolsConfig,
    pub fetch: FetchConfig,
    pub worker: WorkerConfig,
    pub cors: CorsConfig,
    pub log: LogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            redis_url: "redis://localhost:6379".to_string(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            vector_store: VectorStoreConfig::default(),
            rag: RagConfig::default(),
            refinement: RefinementConfig::default(),
            planner: PlannerConfig::default(),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
            fetch: FetchConfig::default(),
            worker: WorkerConfig::default(),
            cors: CorsConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Config {
    /// Environment variables win over file values.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("REDIS_URL") {
            self.redis_url = url;
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.vector_store.backend = VectorBackend::Qdrant;
            self.vector_store.url = url;
        }
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = parse_var("SERVER_PORT", &port)?;
        }
        if let Some(concurrency) = lookup("WORKER_CONCURRENCY") {
            self.worker.concurrency = parse_var("WORKER_CONCURRENCY", &concurrency)?;
        }
        if let Some(provider) = lookup("LLM_PROVIDER") {
            self.llm.provider = parse_provider(&provider)?;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            self.log.format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Text,
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rag.chunk_size == 0 {
            return Err(ConfigError::Invalid("rag.chunk_size must be positive".into()));
        }
        if self.rag.chunk_overlap >= self.rag.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "rag.chunk_overlap ({}) must be smaller than rag.chunk_size ({})",
                self.rag.chunk_overlap, self.rag.chunk_size
            )));
        }
        if self.rag.top_k == 0 {
            return Err(ConfigError::Invalid("rag.top_k must be positive".into()));
        }
        if self.refinement.max_rounds == 0 {
            return Err(ConfigError::Invalid(
                "refinement.max_rounds must be positive".into(),
            ));
        }
        if self.embedding.cache && self.embedding.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "embedding.cache_capacity must be positive".into(),
            ));
        }
        if self.fetch.max_response_bytes == 0 {
            return Err(ConfigError::Invalid(
                "fetch.max_response_bytes must be positive".into(),
            ));
        }
        if self.worker.concurrency == 0 {
            return Err(ConfigError::Invalid("worker.concurrency must be positive".into()));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key}={value} is not valid")))
}

fn parse_provider(value: &str) -> Result<LlmProvider, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "anthropic" => Ok(LlmProvider::Anthropic),
        "openai" => Ok(LlmProvider::OpenAi),
        other => Err(ConfigError::Invalid(format!("Unknown LLM provider '{other}'"))),
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
            max_tokens: 1000,
            timeout_seconds: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
    pub cache: bool,
    /// Entries kept in memory before eviction.
    pub cache_capacity: u64,
    /// Persists cached embeddings across restarts when set.
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            cache: true,
            cache_capacity: 10_000,
            cache_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Memory,
    Qdrant,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VectorStoreConfig {
    pub backend: VectorBackend,
    pub url: String,
    pub collection: String,
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Memory,
            url: "http://localhost:6334".to_string(),
            collection: "knowledge_base".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Files indexed when a process starts.
    pub seed_paths: Vec<PathBuf>,
}

impl RagConfig {
    pub fn chunking(&self) -> ChunkConfig {
        ChunkConfig {
            chunk_size: self.chunk_size,
            chunk_overlap: self.chunk_overlap,
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        let chunking = ChunkConfig::default();
        Self {
            top_k: 5,
            chunk_size: chunking.chunk_size,
            chunk_overlap: chunking.chunk_overlap,
            seed_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefinementConfig {
    pub max_rounds: usize,
    pub retry: RetryPolicy,
}

impl Default for RefinementConfig {
    fn default() -> Self {
        Self {
            max_rounds: crate::application::refinement::DEFAULT_MAX_ROUNDS,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub max_steps: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_steps: crate::application::services::planner::DEFAULT_MAX_STEPS,
        }
    }
}

/// Tool-using research agent (Anthropic through rig).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub enabled: bool,
    pub model: String,
    pub max_turns: usize,
    pub timeout_seconds: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "claude-3-5-sonnet-latest".to_string(),
            max_turns: 5,
            timeout_seconds: 180,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub knowledge_base: KnowledgeBaseToolConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KnowledgeBaseToolConfig {
    pub name: String,
    pub description: String,
    pub no_results_message: String,
}

impl Default for KnowledgeBaseToolConfig {
    fn default() -> Self {
        Self {
            name: "knowledge_base".to_string(),
            description: "Search the knowledge base for relevant information.".to_string(),
            no_results_message: "No relevant documents found.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
    /// Larger job pages are rejected.
    pub max_response_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            user_agent: concat!("job-agent/", env!("CARGO_PKG_VERSION")).to_string(),
            max_response_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub concurrency: usize,
    pub result_ttl_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            result_ttl_seconds: 3600,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub job_description: PromptTemplate,
    pub cover_letter: RolePrompts,
    pub research: RolePrompts,
    pub qa: QaPrompts,
    pub planner: PlannerPrompts,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            job_description: PromptTemplate::new(
                "You're a helpful assistant. Given a full HTML page, extract the job \
                 description part of it and nothing else. Reply with JSON: \
                 {\"job_description\": \"...\"}",
                "Full HTML string: {page}",
            ),
            cover_letter: RolePrompts {
                draft: PromptTemplate::new(
                    "You are an expert cover letter writer. Given a job description and a \
                     resume, write a cover letter for the job, ending with a signature and \
                     the applicant's name. Reply with the cover letter only.",
                    "Resume:\n{resume}\n\nJob Description:\n{job_description}\n\nCover Letter:",
                ),
                critique: PromptTemplate::new(
                    "You're an expert resume reviewer critiquing a cover letter against a job \
                     description and resume. Keep the critique to a minimum and only give one \
                     if it's absolutely necessary. Reply with JSON: {\"critique\": string or \
                     null, \"artifact\": the cover letter}. Use null critique when the cover \
                     letter is satisfactory.",
                    "Job Description: {job_description}\n\nResume:\n{resume}\n\nCover Letter:\n{artifact}\n",
                ),
                revise: PromptTemplate::new(
                    "You're a job applicant revising your cover letter to address an expert's \
                     critique. Reply with JSON: {\"artifact\": the revised cover letter}.",
                    "Job Description: {job_description}\nResume:\n{resume}\nCover Letter:\n{artifact}\nCritique: {critique}",
                ),
            },
            research: RolePrompts {
                draft: PromptTemplate::new(
                    "You're a hard working student answering a question. Do not assume \
                     anything; check your work with the tools you have, but only when \
                     necessary. Reply with your answer and a short justification.",
                    "Question: {task}\n{documents}",
                ),
                critique: PromptTemplate::new(
                    "You're a professor critiquing a student's answer. Keep the critique to a \
                     minimum. Reply with JSON: {\"critique\": string or null, \"artifact\": \
                     the student's answer}. Use null critique when the answer is correct.",
                    "Question: {task}\n{documents}\nStudent Response: {artifact}\n",
                ),
                revise: PromptTemplate::new(
                    "You're a student revising your answer based on a critique. Reply with \
                     JSON: {\"artifact\": the revised answer}.",
                    "Question: {task}\n{documents}\nCritique: {critique}\nStudent Response: {artifact}\n",
                ),
            },
            qa: QaPrompts {
                answer: PromptTemplate::new(
                    "You're a helpful AI assistant. Given a user question and some document \
                     snippets, write documentation. If none of the snippets is relevant, \
                     answer to the best of your knowledge.\n\nHere are the documents: {context}",
                    "{question}",
                ),
                polish: PromptTemplate::new(
                    "",
                    "Revise the following documentation to be more concise and clear using \
                     The Elements of Style. Always return the full revised document, even if \
                     no changes are needed.\nOriginal Document: {answer}",
                ),
            },
            planner: PlannerPrompts {
                plan: PromptTemplate::new(
                    "For the given task, come up with a step by step plan. Each step must be \
                     an individual task with all the information it needs; the result of the \
                     final step should be the final answer. Reply with JSON: \
                     {\"steps\": [\"...\"]}",
                    "Prepare a plan how to solve the following task:\n{task}\n",
                ),
                step: PromptTemplate::new(
                    "You are given a specific step in a full plan to solve a task. Provide the \
                     answer to the step. Do not assume anything.",
                    "TASK:\n{task}\nPLAN:\n{plan}\nSTEP: {step}",
                ),
                finalize: PromptTemplate::new(
                    "You're a helpful assistant that has executed a plan. Given the results \
                     of the execution, prepare the final response. Do not assume anything.",
                    "TASK:\n{task}\n\nPLAN WITH RESULTS:\n{plan}\nFINAL RESPONSE:\n",
                ),
            },
        }
    }
}
