use std::sync::Arc;

use super::types::{ChatResponse, EMPTY_QUERY_ANSWER, NO_RESULTS_ANSWER};
use crate::context::{build_prompt, join_passages};
use crate::core::config::RetrievalConfig;
use crate::core::errors::RagResult;
use crate::language::detect_language;
use crate::llm::{AnswerGenerator, EmbeddingProvider};
use crate::rag::VectorIndex;

/// Composes embedding, retrieval, prompt assembly and generation into one
/// request/response cycle.
///
/// The collaborators are created once at startup and shared read-only by
/// every request.
#[derive(Clone)]
pub struct ChatOrchestrator {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn AnswerGenerator>,
    top_k: usize,
    context_passages: usize,
}

impl ChatOrchestrator {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        let defaults = RetrievalConfig::default();
        Self {
            embedder,
            index,
            generator,
            top_k: defaults.top_k,
            context_passages: defaults.context_passages,
        }
    }

    // TODO: top_k=3 with only two passages used mirrors the deployed behaviour;
    // revisit once answer quality can be measured with the third passage included.
    pub fn with_retrieval(mut self, retrieval: &RetrievalConfig) -> Self {
        self.top_k = retrieval.top_k;
        self.context_passages = retrieval.context_passages;
        self
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Answers one query. Never fails: collaborator errors collapse into the
    /// fixed apology with the cause kept in `error`.
    pub async fn respond(&self, query: &str) -> ChatResponse {
        if query.trim().is_empty() {
            return ChatResponse::message(EMPTY_QUERY_ANSWER);
        }

        match self.retrieve_and_generate(query).await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("Error processing query: {}", err);
                ChatResponse::failed(err)
            }
        }
    }

    /// Answer text only.
    pub async fn answer(&self, query: &str) -> String {
        self.respond(query).await.answer
    }

    async fn retrieve_and_generate(&self, query: &str) -> RagResult<ChatResponse> {
        let query_embedding = self.embedder.embed(query).await?;
        let hits = self.index.search(&query_embedding, self.top_k)?;
        if hits.is_empty() {
            return Ok(ChatResponse::message(NO_RESULTS_ANSWER));
        }

        let texts: Vec<&str> = hits.iter().map(|hit| hit.passage.text.as_str()).collect();
        let context = join_passages(&texts, self.context_passages);
        let locale = detect_language(query);
        tracing::debug!(
            hits = hits.len(),
            locale = %locale,
            top_score = hits[0].score,
            "retrieved context"
        );

        let prompt = build_prompt(locale, &context, query);
        let answer = self.generator.generate(&prompt).await?;

        Ok(ChatResponse::answered(answer.trim().to_string(), context))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::chat::FAILURE_ANSWER;
    use crate::core::errors::RagError;
    use crate::rag::{Passage, SearchHit};

    struct FakeEmbedder {
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        fn name(&self) -> &str {
            "fake"
        }

        fn model(&self) -> &str {
            "fake-model"
        }

        async fn embed(&self, _text: &str) -> RagResult<Vec<f32>> {
            if self.fail {
                return Err(RagError::Embedding {
                    provider: "fake".into(),
                    message: "model not loaded".into(),
                });
            }
            Ok(vec![1.0, 0.0])
        }
    }

    struct FakeIndex {
        texts: Vec<&'static str>,
        searches: AtomicUsize,
        requested_k: Mutex<Option<usize>>,
    }

    impl FakeIndex {
        fn with(texts: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                texts,
                searches: AtomicUsize::new(0),
                requested_k: Mutex::new(None),
            })
        }
    }

    impl VectorIndex for FakeIndex {
        fn search(&self, _query: &[f32], k: usize) -> RagResult<Vec<SearchHit>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            *self.requested_k.lock().unwrap() = Some(k);
            Ok(self
                .texts
                .iter()
                .take(k)
                .enumerate()
                .map(|(i, text)| SearchHit {
                    passage: Passage::new(format!("p{i}"), *text),
                    score: 1.0 - i as f32 * 0.1,
                })
                .collect())
        }

        fn len(&self) -> usize {
            self.texts.len()
        }
    }

    #[derive(Default)]
    struct FakeGenerator {
        fail: bool,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AnswerGenerator for FakeGenerator {
        fn name(&self) -> &str {
            "fake"
        }

        async fn generate(&self, prompt: &str) -> RagResult<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(RagError::Generation {
                    provider: "fake".into(),
                    message: "quota exceeded".into(),
                });
            }
            Ok("  Shumbhunath Sen  \n".to_string())
        }
    }

    fn orchestrator(
        index: Arc<FakeIndex>,
        generator: Arc<FakeGenerator>,
        embed_fails: bool,
    ) -> ChatOrchestrator {
        ChatOrchestrator::new(
            Arc::new(FakeEmbedder { fail: embed_fails }),
            index,
            generator,
        )
    }

    #[tokio::test]
    async fn blank_queries_skip_retrieval() {
        let index = FakeIndex::with(vec!["a"]);
        let chat = orchestrator(index.clone(), Arc::new(FakeGenerator::default()), false);

        for query in ["", "   ", "\n\t"] {
            let response = chat.respond(query).await;
            assert_eq!(response, ChatResponse::message(EMPTY_QUERY_ANSWER));
        }
        assert_eq!(index.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_hits_yield_informational_message() {
        let generator = Arc::new(FakeGenerator::default());
        let chat = orchestrator(FakeIndex::with(vec![]), generator.clone(), false);

        let response = chat.respond("Who is Anupom?").await;
        assert_eq!(response.answer, NO_RESULTS_ANSWER);
        assert_eq!(response.context, None);
        assert_eq!(response.error, None);
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn context_uses_first_two_of_three_hits() {
        let index = FakeIndex::with(vec!["first", "second", "third"]);
        let generator = Arc::new(FakeGenerator::default());
        let chat = orchestrator(index.clone(), generator.clone(), false);

        let response = chat.respond("Who is Kalyani's father?").await;
        assert_eq!(*index.requested_k.lock().unwrap(), Some(3));
        assert_eq!(response.context.as_deref(), Some("first\n\nsecond"));
        assert_eq!(response.answer, "Shumbhunath Sen");
        assert_eq!(response.error, None);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].starts_with("Read the following context"));
        assert!(!prompts[0].contains("third"));
    }

    #[tokio::test]
    async fn single_hit_context_has_no_separator() {
        let chat = orchestrator(
            FakeIndex::with(vec!["only"]),
            Arc::new(FakeGenerator::default()),
            false,
        );
        let response = chat.respond("question").await;
        assert_eq!(response.context.as_deref(), Some("only"));
    }

    #[tokio::test]
    async fn bengali_queries_get_bengali_prompt() {
        let generator = Arc::new(FakeGenerator::default());
        let chat = orchestrator(FakeIndex::with(vec!["ক", "খ"]), generator.clone(), false);

        chat.respond("বিয়ের সময় কল্যাণীর প্রকৃত বয়স কত ছিল?").await;
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("প্রসঙ্গে উত্তর নেই"));
    }

    #[tokio::test]
    async fn generation_failure_collapses_to_apology() {
        let generator = Arc::new(FakeGenerator {
            fail: true,
            ..Default::default()
        });
        let chat = orchestrator(FakeIndex::with(vec!["a", "b"]), generator, false);

        let response = chat.respond("question").await;
        assert_eq!(response.answer, FAILURE_ANSWER);
        assert_eq!(response.context, None);
        assert!(response.error.as_deref().unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn embedding_failure_collapses_to_apology() {
        let index = FakeIndex::with(vec!["a"]);
        let chat = orchestrator(index.clone(), Arc::new(FakeGenerator::default()), true);

        let response = chat.respond("question").await;
        assert!(response.is_failure());
        assert_eq!(response.answer, FAILURE_ANSWER);
        assert_eq!(index.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn retrieval_settings_are_configurable() {
        let index = FakeIndex::with(vec!["a", "b", "c", "d"]);
        let chat = orchestrator(index.clone(), Arc::new(FakeGenerator::default()), false)
            .with_retrieval(&RetrievalConfig {
                top_k: 4,
                context_passages: 3,
            });

        let response = chat.respond("question").await;
        assert_eq!(*index.requested_k.lock().unwrap(), Some(4));
        assert_eq!(response.context.as_deref(), Some("a\n\nb\n\nc"));
        assert_eq!(chat.answer("question").await, "Shumbhunath Sen");
    }
}
