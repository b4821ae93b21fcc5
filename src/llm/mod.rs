//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for interacting with Large Language
//! Model providers. Provider-specific wire formats live behind the
//! [`LLMClient`] trait so the research engine works with any supported backend.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`Provider`] - Runtime provider selection from configuration
//! - [`ToolCoordinator`] - Multi-turn tool calling loop over any client
//! - [`generate_object`] - Typed, schema-constrained generation
//!
//! # Supported Providers
//!
//! - `openai` - OpenAI API and compatible endpoints
//! - `ollama` - Local Ollama server
//!
//! # Example
//!
//! ```ignore
//! use deep_research::llm::{generate_object, Provider};
//!
//! let client = Provider::from_config(&config.llm)?.create_client()?;
//! let plan: QueryPlan = generate_object(client.as_ref(), None, &prompt, "query_plan").await?;
//! ```

/// Core LLM client trait and provider selection.
pub mod client;
/// Provider-agnostic tool calling coordinator.
pub mod coordinator;
pub mod ollama;
pub mod openai;
/// Typed structured output helpers.
pub mod structured;

pub use client::{LLMClient, LLMResponse, OutputSchema, Provider, TokenUsage};
pub use coordinator::{
    ConversationMessage, CoordinatorResult, FinishReason, MessageRole, ToolCallRecord,
    ToolCallingConfig, ToolCoordinator,
};
pub use structured::generate_object;
