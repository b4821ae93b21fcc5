//! Tool infrastructure for model-driven dialogues
//!
//! A [`Tool`](registry::Tool) is a named capability with a JSON parameter
//! schema. Tools are collected in a [`ToolRegistry`](registry::ToolRegistry)
//! and offered to the model by the
//! [`ToolCoordinator`](crate::llm::coordinator::ToolCoordinator).
//!
//! The research engine's concrete tools (`search` and `evaluate`) live next to
//! the state they mutate in [`research::evaluator`](crate::research::evaluator).
//!
//! ```ignore
//! let mut registry = ToolRegistry::new();
//! registry.register(Arc::new(my_tool));
//! let result = registry.execute("my_tool", json!({"query": "rust"})).await?;
//! ```

/// Tool registry for managing available tools.
pub mod registry;

pub use registry::{Tool, ToolRegistry};
