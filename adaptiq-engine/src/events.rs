//! Assessment event logging
//!
//! The engine reports what it did; an [`EventSink`] decides where that
//! goes. Recording is fire-and-forget: sinks must not fail, block, or
//! influence the pipeline.

use adaptiq_core::Difficulty;
use std::sync::Mutex;

/// One context-retrieval pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalEvent {
    pub topic: Option<String>,
    pub hit_count: usize,
    pub requested_limit: usize,
    pub latency_ms: u64,
    pub source_label: Option<String>,
}

/// One question handed back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionEvent {
    pub question_id: String,
    pub difficulty: Difficulty,
    pub total_questions: usize,
    pub remaining_questions: usize,
    pub source_label: Option<String>,
}

/// Fire-and-forget sink for engine events.
pub trait EventSink: Send + Sync {
    fn record_retrieval(&self, event: &RetrievalEvent);
    fn record_question(&self, event: &QuestionEvent);
}

/// Sink that logs events through `tracing` and keeps nothing.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record_retrieval(&self, event: &RetrievalEvent) {
        tracing::info!(
            topic = event.topic.as_deref().unwrap_or(""),
            hits = event.hit_count,
            latency_ms = event.latency_ms,
            "retrieval completed"
        );
    }

    fn record_question(&self, event: &QuestionEvent) {
        tracing::info!(
            question_id = %event.question_id,
            difficulty = %event.difficulty,
            remaining = event.remaining_questions,
            "question generated"
        );
    }
}

/// In-memory sink for tests.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    retrievals: Mutex<Vec<RetrievalEvent>>,
    questions: Mutex<Vec<QuestionEvent>>,
}

impl MemoryEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retrievals(&self) -> Vec<RetrievalEvent> {
        self.retrievals.lock().unwrap().clone()
    }

    pub fn questions(&self) -> Vec<QuestionEvent> {
        self.questions.lock().unwrap().clone()
    }
}

impl EventSink for MemoryEventSink {
    fn record_retrieval(&self, event: &RetrievalEvent) {
        self.retrievals.lock().unwrap().push(event.clone());
    }

    fn record_question(&self, event: &QuestionEvent) {
        self.questions.lock().unwrap().push(event.clone());
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemoryEventSink::new();
        sink.record_retrieval(&RetrievalEvent {
            topic: Some("cells".to_string()),
            hit_count: 4,
            requested_limit: 6,
            latency_ms: 12,
            source_label: Some("bio.pdf".to_string()),
        });
        sink.record_question(&QuestionEvent {
            question_id: "llm-1".to_string(),
            difficulty: Difficulty::Medium,
            total_questions: 5,
            remaining_questions: 4,
            source_label: Some("bio.pdf".to_string()),
        });
        assert_eq!(sink.retrievals().len(), 1);
        assert_eq!(sink.retrievals()[0].hit_count, 4);
        assert_eq!(sink.questions()[0].question_id, "llm-1");
    }
}
