//! # deep-research
//!
//! A recursive research-expansion engine. Given a topic it plans sub-queries,
//! retrieves and filters web content, distills learnings with follow-up
//! questions, recurses on those follow-ups until a depth budget is spent, and
//! synthesizes everything into a Markdown report.
//!
//! ## Overview
//!
//! deep-research can be used in two ways:
//!
//! 1. **As a CLI** - Run the `deep-research` binary
//! 2. **As a library** - Drive a [`ResearchSession`] from your own code
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use deep_research::{search, Provider, ResearchConfig, ResearchSession, SearchOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResearchConfig::load_or_default("research.toml")?;
//!
//!     let client = Provider::from_config(&config.llm)?.create_client()?;
//!     let search = search::create_provider(&config.search)?;
//!
//!     let session = ResearchSession::new(
//!         client,
//!         search,
//!         SearchOptions::from(&config.search),
//!         config.research.clone(),
//!     );
//!     let outcome = session.run("How do solid-state batteries work?").await?;
//!     println!("{}", outcome.report);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `duckduckgo` | Keyless DuckDuckGo search via `daedra` (default) |
//!
//! ## Modules
//!
//! - [`research`] - Planner, evaluator, extractor, orchestrator, synthesizer
//! - [`llm`] - LLM client implementations and the tool coordinator
//! - [`search`] - Web search providers
//! - [`tools`] - Tool definitions and registry
//! - [`types`] - Common types and error handling
//! - [`utils`] - Configuration and text helpers
//! - [`cli`] - Argument parsing and terminal output for the binary

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Command-line parsing and colored output.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Recursive research expansion.
pub mod research;
/// Web search providers.
pub mod search;
/// Tool trait and registry.
pub mod tools;
/// Core types (results, learnings, errors).
pub mod types;
/// Configuration and text utilities.
pub mod utils;

// Re-export commonly used types
pub use llm::{LLMClient, LLMResponse, Provider, ToolCoordinator};
pub use research::{ResearchOutcome, ResearchSession, ResearchSnapshot, ResearchStore};
pub use search::{SearchOptions, SearchProvider};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Learning, Result, SearchResult};
pub use utils::config::ResearchConfig;
