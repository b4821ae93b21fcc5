//! Shared accumulator for one research run.
//!
//! Every branch of the recursion reads and writes the same store through a
//! cloneable [`ResearchStore`] handle. Locks are taken per method call and
//! released before returning, so a handle can be used freely across awaits.

use crate::types::{Learning, SearchResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use super::budget::ResearchBudget;

/// One non-terminal orchestrator invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expansion {
    pub prompt: String,
    pub depth: u32,
    pub breadth: usize,
}

#[derive(Debug, Default)]
struct StoreState {
    topic: Option<String>,
    queries: Vec<String>,
    query_set: HashSet<String>,
    completed_queries: HashSet<String>,
    search_results: Vec<SearchResult>,
    result_urls: HashSet<String>,
    judged_urls: Vec<String>,
    judged_set: HashSet<String>,
    learnings: Vec<Learning>,
    expansions: Vec<Expansion>,
    calls: usize,
}

impl StoreState {
    fn record_processed(&mut self, url: &str) -> bool {
        if !self.judged_set.insert(url.to_string()) {
            return false;
        }
        self.judged_urls.push(url.to_string());
        true
    }
}

/// Handle to the run-wide research state
#[derive(Debug, Clone, Default)]
pub struct ResearchStore {
    inner: Arc<Mutex<StoreState>>,
    budget: ResearchBudget,
}

impl ResearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_budget(budget: ResearchBudget) -> Self {
        Self {
            inner: Arc::default(),
            budget,
        }
    }

    /// Set the topic unless one is already recorded. Returns true if this
    /// call set it.
    pub fn set_topic_if_unset(&self, topic: &str) -> bool {
        let mut state = self.inner.lock();
        if state.topic.is_some() {
            return false;
        }
        state.topic = Some(topic.to_string());
        true
    }

    pub fn topic(&self) -> Option<String> {
        self.inner.lock().topic.clone()
    }

    /// Union planned queries into the store, keeping first-seen order
    pub fn add_queries(&self, queries: &[String]) {
        let mut state = self.inner.lock();
        for query in queries {
            if state.query_set.insert(query.clone()) {
                state.queries.push(query.clone());
            }
        }
    }

    pub fn is_completed(&self, query: &str) -> bool {
        self.inner.lock().completed_queries.contains(query)
    }

    /// Mark a planned query as processed. Queries that were never planned
    /// are recorded as planned first.
    pub fn mark_completed(&self, query: &str) {
        let mut state = self.inner.lock();
        if state.query_set.insert(query.to_string()) {
            state.queries.push(query.to_string());
        }
        state.completed_queries.insert(query.to_string());
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.inner.lock().result_urls.contains(url)
    }

    /// Claim `url` for a relevance judgment. Returns false if it was already
    /// judged or admitted, whatever the verdict was.
    pub fn mark_judged(&self, url: &str) -> bool {
        self.inner.lock().record_processed(url)
    }

    /// True once `url` was judged or admitted
    pub fn is_processed(&self, url: &str) -> bool {
        self.inner.lock().judged_set.contains(url)
    }

    /// Every URL judged or admitted so far, rejected ones included, in the
    /// order they were first seen
    pub fn processed_urls(&self) -> Vec<String> {
        self.inner.lock().judged_urls.clone()
    }

    /// Add a result to the pool. Returns false, leaving the pool unchanged,
    /// if its URL is already present.
    pub fn admit_result(&self, result: SearchResult) -> bool {
        let mut state = self.inner.lock();
        if !state.result_urls.insert(result.url.clone()) {
            return false;
        }
        state.record_processed(&result.url);
        state.search_results.push(result);
        true
    }

    pub fn push_learning(&self, learning: Learning) {
        self.inner.lock().learnings.push(learning);
    }

    pub fn record_expansion(&self, prompt: &str, depth: u32, breadth: usize) {
        self.inner.lock().expansions.push(Expansion {
            prompt: prompt.to_string(),
            depth,
            breadth,
        });
    }

    /// Count one provider call
    pub fn record_call(&self) {
        self.inner.lock().calls += 1;
    }

    pub fn calls(&self) -> usize {
        self.inner.lock().calls
    }

    pub fn budget(&self) -> &ResearchBudget {
        &self.budget
    }

    /// True once any configured limit has been reached
    pub fn budget_exhausted(&self) -> bool {
        let state = self.inner.lock();
        self.budget.is_exhausted(state.calls, state.learnings.len())
    }

    /// Immutable copy of the current state
    pub fn snapshot(&self) -> ResearchSnapshot {
        let state = self.inner.lock();
        // mark_completed keeps completed_queries a subset of queries
        let completed_queries: Vec<String> = state
            .queries
            .iter()
            .filter(|q| state.completed_queries.contains(*q))
            .cloned()
            .collect();

        ResearchSnapshot {
            topic: state.topic.clone(),
            queries: state.queries.clone(),
            completed_queries,
            search_results: state.search_results.clone(),
            learnings: state.learnings.clone(),
            expansions: state.expansions.clone(),
            calls: state.calls,
        }
    }
}

/// Serializable view of a [`ResearchStore`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchSnapshot {
    pub topic: Option<String>,
    pub queries: Vec<String>,
    pub completed_queries: Vec<String>,
    pub search_results: Vec<SearchResult>,
    pub learnings: Vec<Learning>,
    pub expansions: Vec<Expansion>,
    pub calls: usize,
}

impl ResearchSnapshot {
    /// Nothing was found
    pub fn is_empty(&self) -> bool {
        self.learnings.is_empty() && self.search_results.is_empty()
    }
}
