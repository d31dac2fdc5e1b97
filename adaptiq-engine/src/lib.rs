//! Adaptiq Engine - Adaptive Assessment Pipeline
//!
//! Ties the retrieval, history-analysis, generation, and fallback layers
//! into one pipeline with a single guarantee: every step request gets a
//! well-formed answer, whatever the remote providers did. The engine is
//! stateless across requests; the caller carries session history.

pub mod engine;
pub mod events;
pub mod fallback;
pub mod history;
pub mod summary;

pub use engine::{describe_sources, AssessmentEngine, NextStepRequest, QuestionStep, QuizStep};
pub use events::{EventSink, MemoryEventSink, QuestionEvent, RetrievalEvent, TracingEventSink};
pub use fallback::fallback_question;
pub use history::{next_difficulty, next_focus_concept};
pub use summary::{build_summary, ConceptBreakdown, DifficultyBreakdown, QuizSummary};
