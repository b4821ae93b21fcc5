use crate::llm::client::LLMClient;
use crate::search::{SearchOptions, SearchProvider};
use crate::types::{AppError, Result};
use crate::utils::config::EngineConfig;
use std::sync::Arc;

use super::budget::{MeteredClient, MeteredSearch, ResearchBudget};
use super::evaluator::ResultEvaluator;
use super::extractor::LearningExtractor;
use super::orchestrator::ResearchOrchestrator;
use super::planner::QueryPlanner;
use super::store::{ResearchSnapshot, ResearchStore};
use super::synthesizer::ReportSynthesizer;

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub report: String,
    pub snapshot: ResearchSnapshot,
}

/// One top-level research run: a fresh store, the recursive expansion, then
/// the report.
pub struct ResearchSession {
    client: Arc<dyn LLMClient>,
    search: Arc<dyn SearchProvider>,
    search_options: SearchOptions,
    config: EngineConfig,
}

impl ResearchSession {
    pub fn new(
        client: Arc<dyn LLMClient>,
        search: Arc<dyn SearchProvider>,
        search_options: SearchOptions,
        config: EngineConfig,
    ) -> Self {
        Self {
            client,
            search,
            search_options,
            config,
        }
    }

    /// Research `prompt` and synthesize a report.
    ///
    /// Generation failures abort the run and no report is produced.
    pub async fn run(&self, prompt: &str) -> Result<ResearchOutcome> {
        self.run_with(prompt, self.config.depth, self.config.breadth)
            .await
    }

    /// Like [`run`](Self::run) with explicit depth and breadth
    pub async fn run_with(
        &self,
        prompt: &str,
        depth: u32,
        breadth: usize,
    ) -> Result<ResearchOutcome> {
        if prompt.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Research prompt must not be empty".to_string(),
            ));
        }

        let store = ResearchStore::with_budget(ResearchBudget::new(
            self.config.max_calls,
            self.config.max_learnings,
        ));
        let client: Arc<dyn LLMClient> =
            Arc::new(MeteredClient::new(self.client.clone(), store.clone()));
        let search: Arc<dyn SearchProvider> =
            Arc::new(MeteredSearch::new(self.search.clone(), store.clone()));

        let orchestrator = ResearchOrchestrator::new(
            QueryPlanner::new(client.clone()),
            ResultEvaluator::new(
                client.clone(),
                search,
                self.search_options.clone(),
                self.config.max_tool_iterations,
                self.config.relevance_preview_chars,
            ),
            LearningExtractor::new(client.clone(), self.config.extraction_chars),
        );

        orchestrator
            .research(prompt.to_string(), depth, breadth, &store)
            .await?;

        let report = ReportSynthesizer::new(client)
            .synthesize(&store.snapshot())
            .await?;

        // Taken after synthesis so the call count includes it
        let snapshot = store.snapshot();
        tracing::info!(
            queries = snapshot.queries.len(),
            results = snapshot.search_results.len(),
            learnings = snapshot.learnings.len(),
            calls = snapshot.calls,
            "Research complete"
        );

        Ok(ResearchOutcome { report, snapshot })
    }
}
