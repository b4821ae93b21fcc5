use super::{SearchOptions, SearchProvider};
use crate::types::{AppError, Result, SearchResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaSearchRequest<'a> {
    query: &'a str,
    num_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    livecrawl: Option<&'static str>,
    contents: ExaContents,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaContents {
    text: ExaTextConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExaTextConfig {
    max_characters: usize,
}

#[derive(Deserialize)]
struct ExaSearchResponse {
    #[serde(default)]
    results: Vec<ExaResult>,
}

#[derive(Deserialize)]
struct ExaResult {
    #[serde(default)]
    title: Option<String>,
    url: String,
    #[serde(default)]
    text: Option<String>,
}

/// Search through the Exa API
pub struct ExaSearchProvider {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ExaSearchProvider {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SearchProvider for ExaSearchProvider {
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>> {
        let request = ExaSearchRequest {
            query,
            num_results: options.num_results.max(1),
            livecrawl: options.fresh.then_some("always"),
            contents: ExaContents {
                text: ExaTextConfig {
                    max_characters: options.max_characters,
                },
            },
        };

        let response = self
            .http_client
            .post(format!("{}/search", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Exa request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Search(format!(
                "Exa API error ({}): {}",
                status, text
            )));
        }

        let body: ExaSearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse Exa response: {}", e)))?;

        Ok(body
            .results
            .into_iter()
            .map(|r| {
                SearchResult::new(
                    r.title.unwrap_or_default(),
                    r.url,
                    r.text.unwrap_or_default(),
                )
            })
            .collect())
    }

    fn name(&self) -> &str {
        "exa"
    }
}
