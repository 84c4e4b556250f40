//! Retrieval-augmented question answering over indexed courses.
//!
//! [`RagSystem`] wires the pieces together: ingestion fills the vector
//! store, and queries run through the tool-calling answer loop with the
//! course tools registered.

use crate::agent::{
    Answer, AnswerGenerator, CourseOutlineTool, CourseSearchTool, ToolExecutor, ToolRegistry,
};
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{CorsoError, Result};
use crate::ingest::DocumentProcessor;
use crate::llm::{AnthropicClient, ChatModel, ToolSchema};
use crate::session::SessionManager;
use crate::vector_store::{MemoryVectorStore, SqliteVectorStore, VectorStore};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// The answer to a question, with citations and session id.
#[derive(Debug, Clone)]
pub struct QueryResponse {
    pub answer: Answer,
    pub session_id: String,
}

/// Summary statistics about the indexed corpus.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CourseAnalytics {
    pub total_courses: usize,
    pub course_titles: Vec<String>,
}

/// Top-level system: ingestion, retrieval tools, sessions, and the
/// answer-generation loop.
pub struct RagSystem {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    generator: AnswerGenerator,
    registry: Arc<ToolRegistry>,
    executor: ToolExecutor,
    sessions: SessionManager,
    processor: DocumentProcessor,
    max_rounds: usize,
}

impl RagSystem {
    /// Build the system from settings, with the production backends.
    pub fn new(settings: &Settings) -> Result<Self> {
        let store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "sqlite" => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
            "memory" => Arc::new(MemoryVectorStore::new()),
            other => {
                return Err(CorsoError::Config(format!(
                    "Unknown vector store provider: {}",
                    other
                )))
            }
        };

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        // Key presence is the preflight check's job; building the system
        // stays offline so store-only commands work without any keys.
        let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        let model: Arc<dyn ChatModel> = Arc::new(AnthropicClient::new(api_key)?);

        Self::with_components(settings, store, embedder, model)
    }

    /// Build the system with injected backends (used by tests and by the
    /// server when backends are shared).
    pub fn with_components(
        settings: &Settings,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(CourseSearchTool::new(
            store.clone(),
            embedder.clone(),
            settings.search.max_results,
        )))?;
        registry.register(Arc::new(CourseOutlineTool::new(store.clone())))?;
        let registry = Arc::new(registry);

        Ok(Self {
            store,
            embedder,
            generator: AnswerGenerator::new(
                model,
                &settings.anthropic.model,
                settings.anthropic.max_tokens,
            ),
            registry: registry.clone(),
            executor: ToolExecutor::new(registry),
            sessions: SessionManager::new(settings.session.max_history),
            processor: DocumentProcessor::new(
                settings.ingest.chunk_size,
                settings.ingest.chunk_overlap,
            ),
            max_rounds: settings.anthropic.max_rounds,
        })
    }

    /// Answer a question. A missing `session_id` starts a new session; the
    /// exchange is recorded either way.
    pub async fn query(&self, query: &str, session_id: Option<String>) -> Result<QueryResponse> {
        self.query_with_cancel(query, session_id, &CancellationToken::new())
            .await
    }

    /// Answer a question, honoring cancellation between model rounds.
    #[instrument(skip(self, cancel))]
    pub async fn query_with_cancel(
        &self,
        query: &str,
        session_id: Option<String>,
        cancel: &CancellationToken,
    ) -> Result<QueryResponse> {
        let session_id = session_id.unwrap_or_else(|| self.sessions.create_session());
        let history = self.sessions.get_history(&session_id);

        let prompt = format!("Answer this question about course materials: {}", query);
        let schemas: Vec<ToolSchema> = self.registry.list_schemas();

        let answer = self
            .generator
            .generate_answer(
                &prompt,
                history.as_deref(),
                &schemas,
                Some(&self.executor),
                self.max_rounds,
                cancel,
            )
            .await;

        self.sessions.add_exchange(&session_id, query, &answer.text);

        Ok(QueryResponse { answer, session_id })
    }

    /// Parse, embed, and index one course document. Skips courses already
    /// indexed unless `force` is set.
    #[instrument(skip(self))]
    pub async fn add_course_document(&self, path: &Path, force: bool) -> Result<Option<String>> {
        let document = self.processor.process_file(path)?;
        let title = document.course.title.clone();

        if self.store.get_course(&title)?.is_some() {
            if !force {
                info!(course = %title, "Course already indexed, skipping");
                return Ok(None);
            }
            self.store.delete_course(&title)?;
        }

        let texts: Vec<String> = document.chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != document.chunks.len() {
            return Err(CorsoError::Embedding(format!(
                "expected {} embeddings, got {}",
                document.chunks.len(),
                embeddings.len()
            )));
        }

        let mut chunks = document.chunks;
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.store.add_course(&document.course)?;
        self.store.add_chunks(&chunks)?;

        info!(course = %title, chunks = chunks.len(), "Indexed course");
        Ok(Some(title))
    }

    /// Ingest every `.txt` document in a folder. Returns the titles of
    /// newly indexed courses; unreadable files are skipped with a warning.
    pub async fn add_course_folder(&self, folder: &Path, force: bool) -> Result<Vec<String>> {
        let mut added = Vec::new();

        let mut entries: Vec<_> = std::fs::read_dir(folder)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "txt"))
            .collect();
        entries.sort();

        for path in entries {
            match self.add_course_document(&path, force).await {
                Ok(Some(title)) => added.push(title),
                Ok(None) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping document"),
            }
        }

        Ok(added)
    }

    /// Run a raw semantic search without the model loop.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
    ) -> Result<Vec<crate::vector_store::ScoredChunk>> {
        let course_title = match course_name {
            Some(name) => match self.store.resolve_course_name(name)? {
                Some(title) => Some(title),
                None => return Err(CorsoError::CourseNotFound(name.to_string())),
            },
            None => None,
        };
        let embedding = self.embedder.embed(query).await?;
        self.store
            .search(&embedding, limit, course_title.as_deref(), lesson_number)
    }

    /// Corpus statistics for the API and CLI.
    pub fn analytics(&self) -> Result<CourseAnalytics> {
        Ok(CourseAnalytics {
            total_courses: self.store.course_count()?,
            course_titles: self.store.list_course_titles()?,
        })
    }

    pub fn chunk_count(&self) -> Result<usize> {
        self.store.chunk_count()
    }

    /// Start a fresh session.
    pub fn create_session(&self) -> String {
        self.sessions.create_session()
    }

    /// Drop a session's history.
    pub fn clear_session(&self, session_id: &str) {
        self.sessions.clear_session(session_id)
    }

    /// Remove everything from the store.
    pub fn clear_store(&self) -> Result<()> {
        self.store.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as CrateResult;
    use crate::llm::{ContentBlock, ModelRequest, RoundOutcome, StopReason};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedModel {
        script: Mutex<VecDeque<RoundOutcome>>,
        requests: Mutex<Vec<ModelRequest>>,
    }

    impl ScriptedModel {
        fn new(script: Vec<RoundOutcome>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn complete(&self, request: &ModelRequest) -> CrateResult<RoundOutcome> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self.script.lock().unwrap().pop_front().expect("script exhausted"))
        }
    }

    struct StubEmbedder;

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, _text: &str) -> CrateResult<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> CrateResult<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    fn text_outcome(text: &str) -> RoundOutcome {
        RoundOutcome {
            stop_reason: StopReason::End,
            content: vec![ContentBlock::Text { text: text.into() }],
        }
    }

    fn system(model: Arc<dyn ChatModel>) -> RagSystem {
        let mut settings = Settings::default();
        settings.vector_store.provider = "memory".to_string();
        RagSystem::with_components(
            &settings,
            Arc::new(MemoryVectorStore::new()),
            Arc::new(StubEmbedder),
            model,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_query_creates_session_and_records_history() {
        let model = Arc::new(ScriptedModel::new(vec![
            text_outcome("The answer."),
            text_outcome("A follow-up answer."),
        ]));
        let rag = system(model.clone());

        let first = rag.query("What is covered?", None).await.unwrap();
        assert_eq!(first.answer.text, "The answer.");

        let second = rag
            .query("And then?", Some(first.session_id.clone()))
            .await
            .unwrap();
        assert_eq!(second.session_id, first.session_id);

        // The second call's system prompt carries the first exchange.
        let requests = model.requests.lock().unwrap();
        assert!(requests[1]
            .system
            .contains("User: What is covered?\nAssistant: The answer."));
        assert!(requests[1]
            .messages
            .iter()
            .any(|m| serde_json::to_string(m)
                .unwrap()
                .contains("Answer this question about course materials: And then?")));
    }

    #[tokio::test]
    async fn test_query_offers_both_course_tools() {
        let model = Arc::new(ScriptedModel::new(vec![text_outcome("ok")]));
        let rag = system(model.clone());

        rag.query("q", None).await.unwrap();

        let requests = model.requests.lock().unwrap();
        let names: Vec<&str> = requests[0].tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["search_course_content", "get_course_outline"]);
    }

    #[tokio::test]
    async fn test_ingest_document_and_analytics() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let rag = system(model);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("course.txt");
        std::fs::write(
            &path,
            "Course Title: Test Course\nCourse Link: https://example.com\n\n\
             Lesson 1: Only Lesson\nSome content for the lesson. More content here.\n",
        )
        .unwrap();

        let added = rag.add_course_document(&path, false).await.unwrap();
        assert_eq!(added.as_deref(), Some("Test Course"));

        // Second ingest without force is a no-op.
        let skipped = rag.add_course_document(&path, false).await.unwrap();
        assert!(skipped.is_none());

        let analytics = rag.analytics().unwrap();
        assert_eq!(analytics.total_courses, 1);
        assert_eq!(analytics.course_titles, vec!["Test Course"]);
        assert!(rag.chunk_count().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_folder_ingest_skips_non_txt_and_bad_files() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let rag = system(model);

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("good.txt"),
            "Course Title: Good Course\n\nLesson 1: A\nContent here.\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("bad.txt"), "no header at all").unwrap();
        std::fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let added = rag.add_course_folder(dir.path(), false).await.unwrap();
        assert_eq!(added, vec!["Good Course"]);
    }

    #[tokio::test]
    async fn test_system_builds_without_model_key() {
        // Store-only commands (list, search) construct the system with no
        // ANTHROPIC_API_KEY in the environment.
        std::env::remove_var("ANTHROPIC_API_KEY");

        let mut settings = Settings::default();
        settings.vector_store.provider = "memory".to_string();
        let rag = RagSystem::new(&settings).unwrap();

        let analytics = rag.analytics().unwrap();
        assert_eq!(analytics.total_courses, 0);
    }

    #[tokio::test]
    async fn test_raw_search_unknown_course_errors() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let rag = system(model);

        let err = rag.search("q", 5, Some("missing"), None).await.unwrap_err();
        assert!(matches!(err, CorsoError::CourseNotFound(_)));
    }
}
