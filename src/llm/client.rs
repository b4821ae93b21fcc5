//! LLM Client abstractions and provider management
//!
//! This module provides a unified interface for the three generation modes the
//! research engine relies on:
//! - **Free text** with a system framing (report synthesis)
//! - **Schema-constrained** output (planning, relevance verdicts, learnings)
//! - **Tool dialogue** with conversation history (search/evaluate loop)

use crate::llm::coordinator::ConversationMessage;
use crate::types::{AppError, Result, ToolCall, ToolDefinition};
use crate::utils::config::{resolve_env, LlmConfig};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing application code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate free text with a system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate a JSON value constrained by `schema`
    ///
    /// Returns the parsed value; content that is not valid JSON is an
    /// [`AppError::Schema`].
    async fn generate_structured(
        &self,
        system: Option<&str>,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Value>;

    /// Generate one assistant turn of a tool-calling conversation
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Token accounting reported by a provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Response from an LLM generation request
#[derive(Debug, Clone)]
pub struct LLMResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
    /// Token usage, when the provider reports it
    pub usage: Option<TokenUsage>,
}

/// A named JSON schema for structured output
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: String,
    pub schema: Value,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }

    /// Derive the schema from a type
    pub fn of<T: JsonSchema>(name: impl Into<String>) -> Self {
        let mut schema = serde_json::to_value(schemars::schema_for!(T))
            .unwrap_or_else(|_| serde_json::json!({ "type": "object" }));

        // Providers reject the meta keys
        if let Some(obj) = schema.as_object_mut() {
            obj.remove("$schema");
            obj.remove("title");
        }

        Self::new(name, schema)
    }
}

/// Provider enum for runtime selection
///
/// | Provider | Structured output | Tool calling | Notes |
/// |----------|-------------------|--------------|-------|
/// | OpenAI | `json_schema` response format | ✅ | Any OpenAI-compatible endpoint |
/// | Ollama | `format` schema | ✅ (model dependent) | Local inference |
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including Azure OpenAI and compatible APIs)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4o-mini".to_string(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
    },

    /// Ollama local LLM provider
    ///
    /// Tool calling requires a model that supports it (e.g. `llama3.1`,
    /// `qwen2.5`, `mistral-nemo`).
    Ollama { base_url: String, model: String },
}

impl Provider {
    /// Build a provider from configuration, resolving the API key from the
    /// environment
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        match config.provider.as_str() {
            "openai" => {
                let api_key = resolve_env(&config.api_key_env).ok_or_else(|| {
                    AppError::Config(format!(
                        "Environment variable '{}' is not set",
                        config.api_key_env
                    ))
                })?;
                Ok(Provider::OpenAI {
                    api_key,
                    api_base: config.api_base.clone(),
                    model: config.model.clone(),
                })
            }
            "ollama" => Ok(Provider::Ollama {
                base_url: config.ollama_url.clone(),
                model: config.model.clone(),
            }),
            other => Err(AppError::Config(format!(
                "Unknown LLM provider '{}'",
                other
            ))),
        }
    }

    /// Create a client instance for this provider
    pub fn create_client(&self) -> Result<Arc<dyn LLMClient>> {
        match self {
            Provider::OpenAI {
                api_key,
                api_base,
                model,
            } => Ok(Arc::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
            ))),

            Provider::Ollama { base_url, model } => Ok(Arc::new(
                super::ollama::OllamaClient::new(base_url.clone(), model.clone()),
            )),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }
}
