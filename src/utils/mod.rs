//! Configuration and text helpers.

/// TOML configuration loading and validation.
pub mod config;
/// Character-safe text truncation.
pub mod text;
