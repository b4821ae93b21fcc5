use crate::llm::client::LLMClient;
use crate::types::{AppError, Result};
use std::sync::Arc;

use super::store::ResearchSnapshot;

/// Document returned when a run found nothing to report
pub const FALLBACK_REPORT: &str = "# Research Report\n\n\
No learnings or sources were gathered during this research run, so there is \
nothing to summarize.\n\nTry broadening the prompt, increasing the depth or \
breadth, or checking the search provider configuration.\n";

const SYNTHESIS_SYSTEM: &str = "You are a research analyst writing a final \
report in Markdown from accumulated research data. Structure the report as:\n\
1. Summary\n\
2. Key findings, grouped by theme\n\
3. Learnings, citing source URLs where possible\n\
4. Conclusion and next steps\n\
Use only the information in the data provided.";

/// Writes the final report from a research snapshot
pub struct ReportSynthesizer {
    client: Arc<dyn LLMClient>,
}

impl ReportSynthesizer {
    pub fn new(client: Arc<dyn LLMClient>) -> Self {
        Self { client }
    }

    pub async fn synthesize(&self, snapshot: &ResearchSnapshot) -> Result<String> {
        if snapshot.is_empty() {
            tracing::warn!("Nothing was gathered, returning fallback report");
            return Ok(FALLBACK_REPORT.to_string());
        }

        let data = serde_json::to_string_pretty(snapshot)
            .map_err(|e| AppError::Internal(format!("Failed to serialize research data: {}", e)))?;
        let prompt = format!("Research data:\n\n{}", data);

        tracing::info!(
            learnings = snapshot.learnings.len(),
            sources = snapshot.search_results.len(),
            "Synthesizing report"
        );
        self.client.generate_with_system(SYNTHESIS_SYSTEM, &prompt).await
    }
}
