//! TOML-based configuration for the research engine
//!
//! Settings are read from an optional `research.toml`. Every field has a
//! default, so an absent file yields a fully usable configuration; command-line
//! flags are applied on top by the binary.
//!
//! Credentials are never stored in the file. The file names the environment
//! variables that hold them (`api_key_env`), which are resolved at startup.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Root configuration structure loaded from research.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub research: EngineConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// ============= LLM Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Provider name: "openai" or "ollama"
    #[serde(default = "default_llm_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL for OpenAI-compatible APIs
    #[serde(default = "default_openai_base")]
    pub api_base: String,

    /// Environment variable containing the API key
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
}

fn default_llm_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_model(),
            api_base: default_openai_base(),
            api_key_env: default_llm_key_env(),
            ollama_url: default_ollama_url(),
        }
    }
}

// ============= Search Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Provider name: "exa" or "duckduckgo"
    #[serde(default = "default_search_provider")]
    pub provider: String,

    /// Environment variable containing the search API key
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_exa_base")]
    pub base_url: String,

    /// Results requested per search call
    #[serde(default = "default_num_results")]
    pub num_results: usize,

    /// Ask the provider to crawl live content instead of serving its cache
    #[serde(default = "default_true")]
    pub fresh: bool,

    /// Maximum characters of page text returned per result
    #[serde(default = "default_max_characters")]
    pub max_characters: usize,
}

fn default_search_provider() -> String {
    "exa".to_string()
}

fn default_search_key_env() -> String {
    "EXA_API_KEY".to_string()
}

fn default_exa_base() -> String {
    "https://api.exa.ai".to_string()
}

fn default_num_results() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_max_characters() -> usize {
    8000
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            api_key_env: default_search_key_env(),
            base_url: default_exa_base(),
            num_results: default_num_results(),
            fresh: default_true(),
            max_characters: default_max_characters(),
        }
    }
}

// ============= Engine Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Recursion levels below the initial prompt
    #[serde(default = "default_depth")]
    pub depth: u32,

    /// Sub-queries planned at the top level
    #[serde(default = "default_breadth")]
    pub breadth: usize,

    /// Maximum dialogue turns per sub-query evaluation
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,

    #[serde(default = "default_relevance_preview_chars")]
    pub relevance_preview_chars: usize,

    #[serde(default = "default_extraction_chars")]
    pub extraction_chars: usize,

    /// Optional cap on total provider calls for one run
    #[serde(default)]
    pub max_calls: Option<usize>,

    /// Optional cap on total learnings for one run
    #[serde(default)]
    pub max_learnings: Option<usize>,
}

fn default_depth() -> u32 {
    2
}

fn default_breadth() -> usize {
    4
}

fn default_max_tool_iterations() -> usize {
    6
}

fn default_relevance_preview_chars() -> usize {
    500
}

fn default_extraction_chars() -> usize {
    2000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            breadth: default_breadth(),
            max_tool_iterations: default_max_tool_iterations(),
            relevance_preview_chars: default_relevance_preview_chars(),
            extraction_chars: default_extraction_chars(),
            max_calls: None,
            max_learnings: None,
        }
    }
}

// ============= Output & Logging Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("output.md")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' is not set")]
    MissingEnvVar(String),
}

impl ResearchConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: ResearchConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// Load from `path` when it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        match Self::load(path) {
            Err(ConfigError::FileNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Validate value ranges and provider names
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.llm.provider.as_str() {
            "openai" | "ollama" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown LLM provider '{}' (expected 'openai' or 'ollama')",
                    other
                )))
            }
        }

        match self.search.provider.as_str() {
            "exa" | "duckduckgo" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Unknown search provider '{}' (expected 'exa' or 'duckduckgo')",
                    other
                )))
            }
        }

        if self.research.depth > 10 {
            return Err(ConfigError::ValidationError(format!(
                "research.depth must be at most 10, got {}",
                self.research.depth
            )));
        }

        if self.research.breadth == 0 {
            return Err(ConfigError::ValidationError(
                "research.breadth must be at least 1".to_string(),
            ));
        }

        if self.research.breadth > 5 {
            warn!(
                breadth = self.research.breadth,
                "research.breadth above 5; each plan is capped at 5 queries"
            );
        }

        if self.research.max_tool_iterations < 2 {
            return Err(ConfigError::ValidationError(
                "research.max_tool_iterations must allow a search and an evaluation (>= 2)"
                    .to_string(),
            ));
        }

        if self.search.num_results == 0 {
            return Err(ConfigError::ValidationError(
                "search.num_results must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Environment variables that must be present for the configured providers
    pub fn required_env_vars(&self) -> Vec<&str> {
        let mut vars = Vec::new();
        if self.llm.provider == "openai" {
            vars.push(self.llm.api_key_env.as_str());
        }
        if self.search.provider == "exa" {
            vars.push(self.search.api_key_env.as_str());
        }
        vars
    }

    /// Fail with the first required credential missing from the environment
    pub fn check_credentials(&self) -> Result<(), ConfigError> {
        for name in self.required_env_vars() {
            if resolve_env(name).is_none() {
                return Err(ConfigError::MissingEnvVar(name.to_string()));
            }
        }
        Ok(())
    }
}

/// Get a non-empty value from the environment
pub fn resolve_env(env_name: &str) -> Option<String> {
    std::env::var(env_name).ok().filter(|v| !v.trim().is_empty())
}
