//! End-to-end assessment pipeline
//!
//! One [`AssessmentEngine::next_step`] call is one quiz step: assemble
//! tenant-scoped context, decide difficulty and focus from history, run
//! the provider orchestrator, fall back deterministically when it yields
//! nothing, and report events along the way. When the history already
//! covers the session, the step is a summary instead of a question.

use crate::events::{EventSink, QuestionEvent, RetrievalEvent, TracingEventSink};
use crate::fallback::fallback_question;
use crate::history::{next_difficulty, next_focus_concept};
use crate::summary::{build_summary, QuizSummary};
use adaptiq_core::{
    AdaptiqResult, GeneratedQuestion, KnowledgeLevel, QuizTurn, SourceSelection, TenantFilter,
};
use adaptiq_context::ContextAssembler;
use adaptiq_llm::{GenerationRequest, QuestionOrchestrator};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

const DEFAULT_TOTAL_QUESTIONS: usize = 5;
const DEFAULT_RETRIEVAL_LIMIT: usize = 6;
/// Source names shown in a label before collapsing to a count.
const SOURCE_LABEL_LIMIT: usize = 3;

// ============================================================================
// REQUEST AND STEP TYPES
// ============================================================================

/// One quiz-step request. History is the full ordered session so far.
#[derive(Debug, Clone)]
pub struct NextStepRequest {
    pub topic: Option<String>,
    pub knowledge_level: Option<KnowledgeLevel>,
    pub history: Vec<QuizTurn>,
    pub total_questions: usize,
    pub retrieval_limit: usize,
    pub tenant: TenantFilter,
    pub selection: SourceSelection,
}

impl NextStepRequest {
    pub fn new(tenant: TenantFilter) -> Self {
        Self {
            topic: None,
            knowledge_level: None,
            history: Vec::new(),
            total_questions: DEFAULT_TOTAL_QUESTIONS,
            retrieval_limit: DEFAULT_RETRIEVAL_LIMIT,
            tenant,
            selection: SourceSelection::default(),
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_knowledge_level(mut self, level: KnowledgeLevel) -> Self {
        self.knowledge_level = Some(level);
        self
    }

    pub fn with_history(mut self, history: Vec<QuizTurn>) -> Self {
        self.history = history;
        self
    }

    pub fn with_total_questions(mut self, total: usize) -> Self {
        self.total_questions = total.max(1);
        self
    }

    pub fn with_selection(mut self, selection: SourceSelection) -> Self {
        self.selection = selection;
        self
    }
}

/// A generated question plus session progress.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionStep {
    pub question: GeneratedQuestion,
    pub total_questions: usize,
    pub remaining_questions: usize,
    /// Human-readable label of the sources that fed the question.
    pub source_label: Option<String>,
}

/// Outcome of one step: another question, or the session summary.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizStep {
    Question(QuestionStep),
    Complete(QuizSummary),
}

// ============================================================================
// ENGINE
// ============================================================================

/// The assembled pipeline. Stateless across requests; all session state
/// arrives in the request history.
pub struct AssessmentEngine {
    assembler: ContextAssembler,
    orchestrator: QuestionOrchestrator,
    events: Arc<dyn EventSink>,
}

impl AssessmentEngine {
    pub fn new(assembler: ContextAssembler, orchestrator: QuestionOrchestrator) -> Self {
        Self {
            assembler,
            orchestrator,
            events: Arc::new(TracingEventSink),
        }
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Produce the next quiz step.
    ///
    /// Errors surface only from the retrieval layer (store or embedder
    /// unreachable); generation itself cannot fail, because exhausted
    /// providers resolve to the deterministic fallback.
    pub async fn next_step(&self, request: &NextStepRequest) -> AdaptiqResult<QuizStep> {
        if request.history.len() >= request.total_questions {
            info!(
                total = request.total_questions,
                "session complete, building summary"
            );
            return Ok(QuizStep::Complete(build_summary(
                request.topic.as_deref(),
                &request.history,
            )));
        }

        let difficulty = next_difficulty(request.knowledge_level, &request.history);
        let focus = next_focus_concept(request.topic.as_deref(), &request.history);

        let retrieval_start = Instant::now();
        let context = self
            .assembler
            .assemble(
                request.topic.as_deref(),
                request.retrieval_limit,
                &request.tenant,
                &request.selection,
            )
            .await?;
        let latency_ms = retrieval_start.elapsed().as_millis() as u64;
        let source_label = describe_sources(&context.sources);

        self.events.record_retrieval(&RetrievalEvent {
            topic: request.topic.clone(),
            hit_count: context.snippets.len(),
            requested_limit: request.retrieval_limit,
            latency_ms,
            source_label: source_label.clone(),
        });

        let generation = GenerationRequest {
            topic: request.topic.as_deref(),
            focus_concept: focus.as_deref(),
            difficulty,
            snippets: &context.snippets,
            source_names: &context.sources,
            history: &request.history,
        };
        let question = match self.orchestrator.generate(&generation).await {
            Some(question) => question,
            None => {
                warn!("provider generation yielded nothing; using deterministic fallback");
                fallback_question(
                    request.topic.as_deref(),
                    &context.snippets,
                    difficulty,
                    focus.as_deref(),
                    &request.history,
                )
            }
        };

        let remaining = request
            .total_questions
            .saturating_sub(request.history.len() + 1);
        self.events.record_question(&QuestionEvent {
            question_id: question.question_id.clone(),
            difficulty: question.difficulty,
            total_questions: request.total_questions,
            remaining_questions: remaining,
            source_label: source_label.clone(),
        });

        Ok(QuizStep::Question(QuestionStep {
            question,
            total_questions: request.total_questions,
            remaining_questions: remaining,
            source_label,
        }))
    }
}

/// Collapse source names into a short label: one name stands alone, up
/// to three are joined, more become "a, b, c (+N more)".
pub fn describe_sources(sources: &[String]) -> Option<String> {
    match sources.len() {
        0 => None,
        1 => Some(sources[0].clone()),
        n if n <= SOURCE_LABEL_LIMIT => Some(sources.join(", ")),
        n => Some(format!(
            "{} (+{} more)",
            sources[..SOURCE_LABEL_LIMIT].join(", "),
            n - SOURCE_LABEL_LIMIT
        )),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MemoryEventSink;
    use adaptiq_context::{MockContextStore, MockEmbedder};
    use adaptiq_core::{ContextSnippet, Difficulty};
    use adaptiq_llm::MockCompletionProvider;

    fn tenant() -> TenantFilter {
        TenantFilter::unrestricted()
            .with("university", "A")
            .with("roll_no", "1")
    }

    fn seeded_store() -> Arc<MockContextStore> {
        let store = Arc::new(MockContextStore::new());
        let mut snippet =
            ContextSnippet::new("The mitochondria is the powerhouse of the cell.")
                .with_source("bio.pdf");
        snippet
            .meta
            .extra
            .insert("university".to_string(), "A".to_string());
        snippet
            .meta
            .extra
            .insert("roll_no".to_string(), "1".to_string());
        store.insert(snippet);
        store
    }

    fn engine_with(
        store: Arc<MockContextStore>,
        provider: Arc<MockCompletionProvider>,
        sink: Arc<MemoryEventSink>,
    ) -> AssessmentEngine {
        let assembler = ContextAssembler::new(store, Arc::new(MockEmbedder::default()));
        let orchestrator = QuestionOrchestrator::new(vec![provider]);
        AssessmentEngine::new(assembler, orchestrator).with_event_sink(sink)
    }

    fn provider_body(prompt: &str) -> String {
        serde_json::json!({
            "prompt": prompt,
            "questionType": "mcq",
            "options": [
                {"id": "A", "text": "Right answer"},
                {"id": "B", "text": "Wrong answer"},
            ],
            "answer": "A",
            "answerText": "Right answer",
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_step_returns_provider_question_and_events() {
        let provider = Arc::new(MockCompletionProvider::new("mock"));
        provider.push_content(provider_body("From the provider?"));
        let sink = Arc::new(MemoryEventSink::new());
        let engine = engine_with(seeded_store(), provider, sink.clone());

        let request = NextStepRequest::new(tenant()).with_topic("mitochondria");
        let step = engine.next_step(&request).await.unwrap();
        let QuizStep::Question(step) = step else {
            panic!("expected a question step");
        };
        assert_eq!(step.question.prompt, "From the provider?");
        assert_eq!(step.total_questions, DEFAULT_TOTAL_QUESTIONS);
        assert_eq!(step.remaining_questions, DEFAULT_TOTAL_QUESTIONS - 1);
        assert_eq!(step.source_label.as_deref(), Some("bio.pdf"));

        assert_eq!(sink.retrievals().len(), 1);
        assert_eq!(sink.retrievals()[0].hit_count, 1);
        assert_eq!(sink.questions().len(), 1);
        assert_eq!(sink.questions()[0].remaining_questions, 4);
    }

    #[tokio::test]
    async fn test_exhausted_providers_fall_back_deterministically() {
        // Empty response queue: every provider call errors out.
        let provider = Arc::new(MockCompletionProvider::new("mock"));
        let sink = Arc::new(MemoryEventSink::new());
        let engine = engine_with(seeded_store(), provider, sink.clone());

        let request = NextStepRequest::new(tenant()).with_topic("mitochondria");
        let step = engine.next_step(&request).await.unwrap();
        let QuizStep::Question(step) = step else {
            panic!("expected a question step");
        };
        assert!(step.question.question_id.starts_with("fallback-"));
        assert_eq!(
            step.question.options[0].text,
            "The mitochondria is the powerhouse of the cell."
        );
        assert_eq!(step.question.correct_option_id, "A");
        assert!(step.question.validate().is_ok());
        // Fallback questions are reported like any other.
        assert_eq!(sink.questions().len(), 1);
        assert!(sink.questions()[0].question_id.starts_with("fallback-"));
    }

    #[tokio::test]
    async fn test_no_context_yields_topic_miss_question() {
        let provider = Arc::new(MockCompletionProvider::new("mock"));
        let sink = Arc::new(MemoryEventSink::new());
        let store = Arc::new(MockContextStore::new());
        let engine = engine_with(store, provider.clone(), sink);

        let request = NextStepRequest::new(tenant()).with_topic("quantum computing");
        let step = engine.next_step(&request).await.unwrap();
        let QuizStep::Question(step) = step else {
            panic!("expected a question step");
        };
        // Provider chain is never invoked without snippets.
        assert_eq!(provider.call_count(), 0);
        assert!(step
            .question
            .prompt
            .contains("do not contain enough details about quantum computing"));
    }

    #[tokio::test]
    async fn test_completed_session_returns_summary() {
        let provider = Arc::new(MockCompletionProvider::new("mock"));
        let sink = Arc::new(MemoryEventSink::new());
        let engine = engine_with(seeded_store(), provider, sink.clone());

        let history = vec![
            QuizTurn::new("Q1", Difficulty::Easy, true).with_concept("Cells"),
            QuizTurn::new("Q2", Difficulty::Medium, false).with_concept("Cells"),
        ];
        let request = NextStepRequest::new(tenant())
            .with_topic("biology")
            .with_history(history)
            .with_total_questions(2);
        let step = engine.next_step(&request).await.unwrap();
        let QuizStep::Complete(summary) = step else {
            panic!("expected a summary");
        };
        assert_eq!(summary.total_questions, 2);
        assert_eq!(summary.correct_count, 1);
        assert_eq!(summary.accuracy, 0.5);
        // No retrieval happens for a finished session.
        assert!(sink.retrievals().is_empty());
    }

    #[tokio::test]
    async fn test_difficulty_ratchets_from_last_turn() {
        let provider = Arc::new(MockCompletionProvider::new("mock"));
        provider.push_content(provider_body("Harder one?"));
        let sink = Arc::new(MemoryEventSink::new());
        let engine = engine_with(seeded_store(), provider, sink.clone());

        let history = vec![QuizTurn::new("Q1", Difficulty::Medium, true)];
        let request = NextStepRequest::new(tenant())
            .with_topic("mitochondria")
            .with_history(history);
        let step = engine.next_step(&request).await.unwrap();
        let QuizStep::Question(step) = step else {
            panic!("expected a question step");
        };
        assert_eq!(step.question.difficulty, Difficulty::Hard);
        assert_eq!(sink.questions()[0].difficulty, Difficulty::Hard);
    }

    #[tokio::test]
    async fn test_tenant_filter_scopes_retrieval() {
        let store = seeded_store();
        let mut foreign = ContextSnippet::new("Another student's notes about mitochondria.")
            .with_source("foreign.pdf");
        foreign
            .meta
            .extra
            .insert("university".to_string(), "B".to_string());
        store.insert(foreign);

        let provider = Arc::new(MockCompletionProvider::new("mock"));
        let sink = Arc::new(MemoryEventSink::new());
        let engine = engine_with(store, provider, sink.clone());

        let request = NextStepRequest::new(tenant())
            .with_topic("mitochondria")
            .with_selection(SourceSelection::All);
        let step = engine.next_step(&request).await.unwrap();
        let QuizStep::Question(step) = step else {
            panic!("expected a question step");
        };
        assert_eq!(step.source_label.as_deref(), Some("bio.pdf"));
        assert_eq!(sink.retrievals()[0].hit_count, 1);
    }

    #[test]
    fn test_describe_sources_label_shapes() {
        assert_eq!(describe_sources(&[]), None);
        assert_eq!(
            describe_sources(&["a.pdf".to_string()]),
            Some("a.pdf".to_string())
        );
        let three = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(describe_sources(&three), Some("a, b, c".to_string()));
        let five = vec![
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "d".to_string(),
            "e".to_string(),
        ];
        assert_eq!(describe_sources(&five), Some("a, b, c (+2 more)".to_string()));
    }
}
