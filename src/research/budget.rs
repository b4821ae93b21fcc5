//! Optional cap on total work, plus the metering wrappers that feed it.
//!
//! Depth and breadth bound the shape of the recursion but not its size. A
//! [`ResearchBudget`] caps the run by provider calls and/or learnings. The
//! orchestrator checks it before each expansion; running out ends that
//! expansion normally.

use crate::llm::client::{LLMClient, LLMResponse, OutputSchema};
use crate::llm::coordinator::ConversationMessage;
use crate::search::{SearchOptions, SearchProvider};
use crate::types::{Result, SearchResult, ToolDefinition};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::store::ResearchStore;

/// Global limits for a run. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResearchBudget {
    pub max_calls: Option<usize>,
    pub max_learnings: Option<usize>,
}

impl ResearchBudget {
    pub fn new(max_calls: Option<usize>, max_learnings: Option<usize>) -> Self {
        Self {
            max_calls,
            max_learnings,
        }
    }

    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn is_exhausted(&self, calls: usize, learnings: usize) -> bool {
        self.max_calls.is_some_and(|max| calls >= max)
            || self.max_learnings.is_some_and(|max| learnings >= max)
    }
}

/// [`LLMClient`] decorator that counts every generation call in the store
pub struct MeteredClient {
    inner: Arc<dyn LLMClient>,
    store: ResearchStore,
}

impl MeteredClient {
    pub fn new(inner: Arc<dyn LLMClient>, store: ResearchStore) -> Self {
        Self { inner, store }
    }
}

#[async_trait]
impl LLMClient for MeteredClient {
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.store.record_call();
        self.inner.generate_with_system(system, prompt).await
    }

    async fn generate_structured(
        &self,
        system: Option<&str>,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Value> {
        self.store.record_call();
        self.inner.generate_structured(system, prompt, schema).await
    }

    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.store.record_call();
        self.inner
            .generate_with_tools_and_history(messages, tools)
            .await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}

/// [`SearchProvider`] decorator that counts every search in the store
pub struct MeteredSearch {
    inner: Arc<dyn SearchProvider>,
    store: ResearchStore,
}

impl MeteredSearch {
    pub fn new(inner: Arc<dyn SearchProvider>, store: ResearchStore) -> Self {
        Self { inner, store }
    }
}

#[async_trait]
impl SearchProvider for MeteredSearch {
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        self.store.record_call();
        self.inner.search(query, options).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
