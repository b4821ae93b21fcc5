//! Keyless search via daedra's DuckDuckGo backend.

use super::{SearchOptions, SearchProvider};
use crate::types::{AppError, Result, SearchResult};
use async_trait::async_trait;

/// DuckDuckGo search. The result snippet stands in for page content and
/// freshness cannot be controlled.
#[derive(Default)]
pub struct DuckDuckGoSearchProvider;

impl DuckDuckGoSearchProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearchProvider {
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: options.num_results.max(1),
                ..Default::default()
            }),
        };

        let response = daedra::tools::search::perform_search(&search_args)
            .await
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        Ok(response
            .data
            .iter()
            .take(options.num_results.max(1))
            .map(|r| {
                SearchResult::new(r.title.to_string(), r.url.to_string(), r.description.to_string())
            })
            .collect())
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}
