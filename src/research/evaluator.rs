//! Search/evaluate tool dialogue for one sub-query.
//!
//! The model is offered two tools. `search` loads a result into a single
//! pending slot; `evaluate` takes that result, rejects it if its URL was
//! already judged anywhere in the run, and otherwise asks for a relevance
//! verdict. The dialogue is driven by
//! an explicit [`EvaluationPhase`]:
//!
//! ```text
//! AwaitingSearch --search (>=1 result)--> AwaitingEvaluation --evaluate--> Done
//!       ^                                       |
//!       +-------------search (0 results)--------+
//! ```
//!
//! The dialogue ends when the phase reaches `Done`, when the model stops
//! calling tools, or after the configured number of turns.

use crate::llm::client::LLMClient;
use crate::llm::coordinator::{ToolCallingConfig, ToolCoordinator};
use crate::llm::structured::generate_object;
use crate::search::{SearchOptions, SearchProvider};
use crate::tools::registry::{Tool, ToolRegistry};
use crate::types::{Result, SearchResult};
use crate::utils::text::truncate_chars;
use async_trait::async_trait;
use parking_lot::Mutex;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::store::ResearchStore;

const EVALUATOR_SYSTEM: &str = "You are a research assistant. Use the search \
tool to find one source for the query, then call the evaluate tool with a short \
justification of whether the source is relevant.";

/// Where a dialogue is in the search/evaluate cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationPhase {
    AwaitingSearch,
    AwaitingEvaluation,
    Done,
}

/// Branch-local dialogue state
#[derive(Debug)]
pub struct EvaluationState {
    phase: EvaluationPhase,
    pending: Option<SearchResult>,
    admitted: Vec<SearchResult>,
}

impl Default for EvaluationState {
    fn default() -> Self {
        Self::new()
    }
}

impl EvaluationState {
    pub fn new() -> Self {
        Self {
            phase: EvaluationPhase::AwaitingSearch,
            pending: None,
            admitted: Vec::new(),
        }
    }

    pub fn phase(&self) -> EvaluationPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == EvaluationPhase::Done
    }

    /// Load search results. The most recent result replaces whatever was
    /// pending; an empty batch clears the slot.
    pub fn load(&mut self, results: Vec<SearchResult>) {
        if self.is_done() {
            return;
        }
        self.pending = results.into_iter().last();
        self.phase = if self.pending.is_some() {
            EvaluationPhase::AwaitingEvaluation
        } else {
            EvaluationPhase::AwaitingSearch
        };
    }

    /// Take the pending result, if any. The phase is left as is until the
    /// evaluation is finished.
    pub fn take_pending(&mut self) -> Option<SearchResult> {
        self.pending.take()
    }

    /// URL of the result awaiting evaluation
    pub fn pending_url(&self) -> Option<String> {
        self.pending.as_ref().map(|r| r.url.clone())
    }

    /// True if this dialogue already admitted a result with `url`
    pub fn has_admitted(&self, url: &str) -> bool {
        self.admitted.iter().any(|r| r.url == url)
    }

    /// Record the outcome of an evaluation and finish the dialogue
    pub fn finish(&mut self, admitted: Option<SearchResult>) {
        if let Some(result) = admitted {
            self.admitted.push(result);
        }
        self.phase = EvaluationPhase::Done;
    }

    pub fn into_admitted(self) -> Vec<SearchResult> {
        self.admitted
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RelevanceVerdict {
    /// Whether the source helps answer the query
    is_relevant: bool,
}

/// `search` tool bound to one dialogue
pub struct SearchTool {
    provider: Arc<dyn SearchProvider>,
    options: SearchOptions,
    sub_query: String,
    state: Arc<Mutex<EvaluationState>>,
}

impl SearchTool {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        options: SearchOptions,
        sub_query: impl Into<String>,
        state: Arc<Mutex<EvaluationState>>,
    ) -> Self {
        Self {
            provider,
            options,
            sub_query: sub_query.into(),
            state,
        }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the web for the query and load the top result for evaluation"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .filter(|q| !q.trim().is_empty())
            .unwrap_or(&self.sub_query)
            .to_string();

        let results = match self.provider.search(&query, &self.options).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "Search failed, continuing without results");
                Vec::new()
            }
        };

        let count = results.len();
        let pending_url = {
            let mut state = self.state.lock();
            state.load(results);
            state.pending_url()
        };

        tracing::debug!(query = %query, count, "Search completed");

        Ok(match pending_url {
            Some(url) => json!({
                "count": count,
                "url": url,
                "message": format!("Found {} result(s). Call evaluate next.", count)
            }),
            None => json!({
                "count": 0,
                "message": "No results found."
            }),
        })
    }
}

/// `evaluate` tool bound to one dialogue
pub struct EvaluateTool {
    client: Arc<dyn LLMClient>,
    store: ResearchStore,
    sub_query: String,
    preview_chars: usize,
    state: Arc<Mutex<EvaluationState>>,
}

impl EvaluateTool {
    pub fn new(
        client: Arc<dyn LLMClient>,
        store: ResearchStore,
        sub_query: impl Into<String>,
        preview_chars: usize,
        state: Arc<Mutex<EvaluationState>>,
    ) -> Self {
        Self {
            client,
            store,
            sub_query: sub_query.into(),
            preview_chars,
            state,
        }
    }

    fn relevance_prompt(&self, candidate: &SearchResult, justification: &str) -> String {
        let processed: Vec<String> = self
            .store
            .processed_urls()
            .into_iter()
            .filter(|url| *url != candidate.url)
            .collect();
        let processed = if processed.is_empty() {
            "(none)".to_string()
        } else {
            processed.join("\n")
        };

        format!(
            "Query: {}\n\nCandidate source:\nTitle: {}\nURL: {}\nContent: {}\n\n\
             Previously processed URLs:\n{}\n\nJustification: {}\n\n\
             Decide whether this source is relevant to the query.",
            self.sub_query,
            candidate.title,
            candidate.url,
            truncate_chars(&candidate.content, self.preview_chars),
            processed,
            justification
        )
    }
}

#[async_trait]
impl Tool for EvaluateTool {
    fn name(&self) -> &str {
        "evaluate"
    }

    fn description(&self) -> &str {
        "Judge whether the most recently found search result is relevant"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "justification": {
                    "type": "string",
                    "description": "Why the result is or is not relevant"
                }
            },
            "required": ["justification"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let justification = args
            .get("justification")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let candidate = {
            let mut state = self.state.lock();
            match state.take_pending() {
                Some(candidate)
                    if state.has_admitted(&candidate.url)
                        || !self.store.mark_judged(&candidate.url) =>
                {
                    state.finish(None);
                    tracing::debug!(url = %candidate.url, "Discarded duplicate result");
                    return Ok(json!({
                        "status": "duplicate",
                        "url": candidate.url,
                        "message": "This result was already processed."
                    }));
                }
                Some(candidate) => candidate,
                None => {
                    return Ok(json!({
                        "status": "no_pending",
                        "message": "No result is pending. Call search first."
                    }))
                }
            }
        };

        let prompt = self.relevance_prompt(&candidate, &justification);
        let verdict: RelevanceVerdict =
            generate_object(self.client.as_ref(), None, &prompt, "relevance").await?;

        tracing::debug!(
            sub_query = %self.sub_query,
            url = %candidate.url,
            relevant = verdict.is_relevant,
            "Evaluated result"
        );

        let url = candidate.url.clone();
        let status = if verdict.is_relevant {
            "admitted"
        } else {
            "rejected"
        };
        self.state
            .lock()
            .finish(verdict.is_relevant.then_some(candidate));

        Ok(json!({
            "status": status,
            "url": url,
            "is_relevant": verdict.is_relevant,
            "justification": justification
        }))
    }
}

/// Finds relevant, unseen results for a sub-query
pub struct ResultEvaluator {
    client: Arc<dyn LLMClient>,
    search: Arc<dyn SearchProvider>,
    options: SearchOptions,
    max_turns: usize,
    preview_chars: usize,
}

impl ResultEvaluator {
    pub fn new(
        client: Arc<dyn LLMClient>,
        search: Arc<dyn SearchProvider>,
        options: SearchOptions,
        max_turns: usize,
        preview_chars: usize,
    ) -> Self {
        Self {
            client,
            search,
            options,
            max_turns,
            preview_chars,
        }
    }

    /// Run the dialogue and return the results it admitted. Nothing is
    /// written to the store; the caller merges the results.
    pub async fn evaluate(
        &self,
        sub_query: &str,
        store: &ResearchStore,
    ) -> Result<Vec<SearchResult>> {
        let state = Arc::new(Mutex::new(EvaluationState::new()));

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(SearchTool::new(
            self.search.clone(),
            self.options.clone(),
            sub_query,
            state.clone(),
        )));
        registry.register(Arc::new(EvaluateTool::new(
            self.client.clone(),
            store.clone(),
            sub_query,
            self.preview_chars,
            state.clone(),
        )));

        let coordinator = ToolCoordinator::new(
            self.client.clone(),
            Arc::new(registry),
            ToolCallingConfig {
                max_iterations: self.max_turns,
                stop_on_error: true,
            },
        );

        let prompt = format!(
            "Query: {}\n\nSearch the web for this query, then evaluate the result you find.",
            sub_query
        );
        let done_state = state.clone();
        let done = move || done_state.lock().is_done();
        let outcome = coordinator
            .execute_until(Some(EVALUATOR_SYSTEM), &prompt, &done)
            .await?;

        let admitted = std::mem::take(&mut *state.lock()).into_admitted();
        tracing::info!(
            sub_query = %sub_query,
            admitted = admitted.len(),
            tool_calls = outcome.tool_calls.len(),
            finish = %outcome.finish_reason,
            "Evaluation finished"
        );

        Ok(admitted)
    }
}
