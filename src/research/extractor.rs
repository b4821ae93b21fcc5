use crate::llm::client::LLMClient;
use crate::llm::structured::generate_object;
use crate::types::{AppError, Learning, Result, SearchResult};
use crate::utils::text::truncate_chars;
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;

use super::store::ResearchStore;

/// Most follow-up questions a learning may carry
pub const MAX_FOLLOW_UPS: usize = 2;

const EXTRACTOR_SYSTEM: &str = "You are a research analyst. From one source \
you extract the single most useful insight for the research topic, and suggest \
follow-up questions worth researching next.";

#[derive(Debug, Deserialize, JsonSchema)]
struct ExtractedLearning {
    /// One concise, factual insight drawn from the content
    learning: String,
    /// Questions that would deepen the research
    #[serde(default)]
    #[schemars(length(max = 2))]
    follow_up_questions: Vec<String>,
}

/// Distills one admitted result into a [`Learning`]
pub struct LearningExtractor {
    client: Arc<dyn LLMClient>,
    content_chars: usize,
}

impl LearningExtractor {
    pub fn new(client: Arc<dyn LLMClient>, content_chars: usize) -> Self {
        Self {
            client,
            content_chars,
        }
    }

    /// Extract a learning. Reads the run topic from the store; never writes.
    pub async fn extract(
        &self,
        sub_query: &str,
        result: &SearchResult,
        store: &ResearchStore,
    ) -> Result<Learning> {
        let topic = store.topic().unwrap_or_else(|| sub_query.to_string());
        let prompt = format!(
            "Research topic: {}\nSub-query: {}\n\nTitle: {}\nURL: {}\n<content>\n{}\n</content>\n\n\
             Extract one key learning relevant to the topic and up to {} follow-up questions.",
            topic,
            sub_query,
            result.title,
            result.url,
            truncate_chars(&result.content, self.content_chars),
            MAX_FOLLOW_UPS
        );

        let extracted: ExtractedLearning = generate_object(
            self.client.as_ref(),
            Some(EXTRACTOR_SYSTEM),
            &prompt,
            "learning",
        )
        .await?;

        if extracted.learning.trim().is_empty() {
            return Err(AppError::Schema("Learning text is empty".to_string()));
        }
        if extracted.follow_up_questions.len() > MAX_FOLLOW_UPS {
            return Err(AppError::Schema(format!(
                "Expected at most {} follow-up questions, got {}",
                MAX_FOLLOW_UPS,
                extracted.follow_up_questions.len()
            )));
        }

        tracing::debug!(
            url = %result.url,
            follow_ups = extracted.follow_up_questions.len(),
            "Extracted learning"
        );

        Ok(Learning {
            learning: extracted.learning,
            follow_up_questions: extracted.follow_up_questions,
        })
    }
}
