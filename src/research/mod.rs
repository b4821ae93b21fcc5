//! Recursive research expansion
//!
//! This module turns a topic into a report by repeatedly planning sub-queries,
//! gathering and filtering sources, and recursing on the follow-up questions
//! raised by what was learned.
//!
//! # Architecture
//!
//! - [`planner::QueryPlanner`] - prompt → sub-queries
//! - [`evaluator::ResultEvaluator`] - sub-query → admitted, unseen, relevant results
//! - [`extractor::LearningExtractor`] - result → learning + follow-up questions
//! - [`orchestrator::ResearchOrchestrator`] - the depth/breadth-bounded recursion
//! - [`synthesizer::ReportSynthesizer`] - accumulated state → Markdown report
//! - [`store::ResearchStore`] - shared accumulator for one run
//! - [`session::ResearchSession`] - wires everything together for one run
//!
//! # Usage
//!
//! ```ignore
//! use deep_research::research::ResearchSession;
//!
//! let session = ResearchSession::new(client, search, options, config.research);
//! let outcome = session.run("How do solid-state batteries work?").await?;
//!
//! println!("{}", outcome.report);
//! println!("{} learnings", outcome.snapshot.learnings.len());
//! ```
//!
//! # Research Workflow
//!
//! 1. **Planning** - Break the prompt into `breadth` sub-queries
//! 2. **Evaluation** - Search each sub-query and judge the result's relevance
//! 3. **Extraction** - Distill a learning and follow-up questions
//! 4. **Recursion** - Re-plan from follow-ups with `depth - 1` and half the breadth
//! 5. **Synthesis** - Write the report from everything gathered

/// Optional global call cap and metering wrappers.
pub mod budget;
pub mod evaluator;
pub mod extractor;
pub mod orchestrator;
pub mod planner;
/// Top-level run.
pub mod session;
pub mod store;
pub mod synthesizer;

pub use budget::ResearchBudget;
pub use evaluator::ResultEvaluator;
pub use extractor::LearningExtractor;
pub use orchestrator::ResearchOrchestrator;
pub use planner::QueryPlanner;
pub use session::{ResearchOutcome, ResearchSession};
pub use store::{ResearchSnapshot, ResearchStore};
pub use synthesizer::{ReportSynthesizer, FALLBACK_REPORT};
