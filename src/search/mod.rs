//! Web search providers
//!
//! A [`SearchProvider`] turns a query into a small, ordered set of
//! [`SearchResult`]s. Two backends are available:
//!
//! - [`ExaSearchProvider`](exa::ExaSearchProvider) - Exa neural search with
//!   live crawling for the freshest content (requires an API key)
//! - [`DuckDuckGoSearchProvider`](duckduckgo::DuckDuckGoSearchProvider) -
//!   keyless fallback via `daedra` (feature `duckduckgo`)

pub mod exa;

#[cfg(feature = "duckduckgo")]
pub mod duckduckgo;

use crate::types::{AppError, Result, SearchResult};
use crate::utils::config::{resolve_env, SearchConfig};
use async_trait::async_trait;
use std::sync::Arc;

pub use exa::ExaSearchProvider;

#[cfg(feature = "duckduckgo")]
pub use duckduckgo::DuckDuckGoSearchProvider;

/// Per-request search options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Maximum number of results to return
    pub num_results: usize,
    /// Ask the backend to crawl live pages rather than serve cached content
    pub fresh: bool,
    /// Upper bound on the content characters returned per result
    pub max_characters: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            num_results: 1,
            fresh: true,
            max_characters: 8000,
        }
    }
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            num_results: config.num_results,
            fresh: config.fresh,
            max_characters: config.max_characters,
        }
    }
}

/// A web search backend
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run a query. Results are ordered as the backend ranked them.
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Vec<SearchResult>>;

    /// Short backend identifier used in logs
    fn name(&self) -> &str;
}

/// Build the configured search provider
pub fn create_provider(config: &SearchConfig) -> Result<Arc<dyn SearchProvider>> {
    match config.provider.as_str() {
        "exa" => {
            let api_key = resolve_env(&config.api_key_env).ok_or_else(|| {
                AppError::Config(format!(
                    "Environment variable '{}' is not set",
                    config.api_key_env
                ))
            })?;
            Ok(Arc::new(ExaSearchProvider::new(
                api_key,
                config.base_url.clone(),
            )))
        }
        #[cfg(feature = "duckduckgo")]
        "duckduckgo" => Ok(Arc::new(DuckDuckGoSearchProvider::new())),
        #[cfg(not(feature = "duckduckgo"))]
        "duckduckgo" => Err(AppError::Config(
            "DuckDuckGo search requires the 'duckduckgo' feature".to_string(),
        )),
        other => Err(AppError::Config(format!(
            "Unknown search provider '{}'",
            other
        ))),
    }
}
