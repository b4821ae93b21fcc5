//! Depth/breadth-bounded recursive expansion.
//!
//! Each invocation plans `breadth` sub-queries for its prompt, evaluates them
//! one at a time, extracts a learning from every newly admitted result, and
//! recurses on learnings that raised follow-up questions with one less level
//! of depth and half the breadth (never below one). All work is sequential and
//! depth-first: a recursive call finishes before the next result is touched.

use crate::types::{Learning, Result};
use futures::future::{BoxFuture, FutureExt};

use super::evaluator::ResultEvaluator;
use super::extractor::LearningExtractor;
use super::planner::QueryPlanner;
use super::store::ResearchStore;

/// Breadth for the next level down
pub fn next_breadth(breadth: usize) -> usize {
    breadth.div_ceil(2).max(1)
}

/// Prompt for a recursive expansion seeded by one learning
pub fn follow_up_prompt(topic: &str, sub_query: &str, learning: &Learning) -> String {
    format!(
        "Overall research topic: {}\nSub-query: {}\nLearning: {}\nFollow-up questions: {}",
        topic,
        sub_query,
        learning.learning,
        learning.follow_up_questions.join("; ")
    )
}

pub struct ResearchOrchestrator {
    planner: QueryPlanner,
    evaluator: ResultEvaluator,
    extractor: LearningExtractor,
}

impl ResearchOrchestrator {
    pub fn new(
        planner: QueryPlanner,
        evaluator: ResultEvaluator,
        extractor: LearningExtractor,
    ) -> Self {
        Self {
            planner,
            evaluator,
            extractor,
        }
    }

    /// Expand `prompt` into the store.
    ///
    /// Returns immediately when `depth` is zero or the store's budget is spent.
    /// Any generation failure aborts the whole call tree.
    pub fn research<'a>(
        &'a self,
        prompt: String,
        depth: u32,
        breadth: usize,
        store: &'a ResearchStore,
    ) -> BoxFuture<'a, Result<()>> {
        async move {
            if depth == 0 {
                return Ok(());
            }

            if store.set_topic_if_unset(&prompt) {
                tracing::info!(depth, breadth, "Starting research");
            }

            if store.budget_exhausted() {
                tracing::info!(
                    depth,
                    calls = store.calls(),
                    "Research budget exhausted, not expanding further"
                );
                return Ok(());
            }

            store.record_expansion(&prompt, depth, breadth);

            let queries = self.planner.plan(&prompt, breadth).await?;
            store.add_queries(&queries);

            for sub_query in &queries {
                if store.is_completed(sub_query) {
                    tracing::debug!(sub_query = %sub_query, "Skipping completed query");
                    continue;
                }

                let admitted = self.evaluator.evaluate(sub_query, store).await?;
                let merged: Vec<_> = admitted
                    .into_iter()
                    .filter(|result| store.admit_result(result.clone()))
                    .collect();
                store.mark_completed(sub_query);

                for result in merged {
                    let learning = self.extractor.extract(sub_query, &result, store).await?;
                    store.push_learning(learning.clone());

                    tracing::info!(
                        sub_query = %sub_query,
                        url = %result.url,
                        follow_ups = learning.follow_up_questions.len(),
                        "Recorded learning"
                    );

                    if learning.has_follow_ups() {
                        let topic = store.topic().unwrap_or_else(|| prompt.clone());
                        let next_prompt = follow_up_prompt(&topic, sub_query, &learning);
                        self.research(next_prompt, depth - 1, next_breadth(breadth), store)
                            .await?;
                    }
                }
            }

            Ok(())
        }
        .boxed()
    }
}
