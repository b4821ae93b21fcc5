use crate::llm::client::LLMClient;
use crate::llm::structured::generate_object;
use crate::types::{AppError, Result};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

/// Most queries a single plan may contain
pub const MAX_PLANNED_QUERIES: usize = 5;

const PLANNER_SYSTEM: &str = "You are a research planner. You break a research \
prompt into focused web search queries, each covering a different facet of the \
prompt. Return only the queries.";

#[derive(Debug, Deserialize, JsonSchema)]
struct QueryPlan {
    /// Distinct search queries, each on a different facet of the prompt
    #[schemars(length(min = 1, max = 5))]
    queries: Vec<String>,
}

/// Turns a research prompt into candidate sub-queries
pub struct QueryPlanner {
    client: Arc<dyn LLMClient>,
}

impl QueryPlanner {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    /// Ask for `n` sub-queries, capped at [`MAX_PLANNED_QUERIES`]. The model's
    /// list is returned as-is, without filtering against queries seen earlier
    /// in the run.
    pub async fn plan(&self, prompt: &str, n: usize) -> Result<Vec<String>> {
        let requested = n.clamp(1, MAX_PLANNED_QUERIES);
        let request = format!(
            "Generate {} distinct search queries to research the following prompt. \
             Each query should explore a different aspect.\n\nPrompt: {}",
            requested, prompt
        );

        let plan: QueryPlan =
            generate_object(self.client.as_ref(), Some(PLANNER_SYSTEM), &request, "query_plan")
                .await?;

        if plan.queries.is_empty() || plan.queries.len() > MAX_PLANNED_QUERIES {
            return Err(AppError::Schema(format!(
                "Expected 1-{} queries, got {}",
                MAX_PLANNED_QUERIES,
                plan.queries.len()
            )));
        }

        tracing::debug!(count = plan.queries.len(), requested, "Planned sub-queries");
        Ok(plan.queries)
    }
}
