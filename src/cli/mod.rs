//! CLI module for deep-research
//!
//! Provides command-line interface parsing for the `deep-research` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use crate::utils::config::ResearchConfig;
use clap::Parser;
use std::path::PathBuf;

/// Default configuration file, used when present
pub const DEFAULT_CONFIG_PATH: &str = "research.toml";

/// deep-research - recursive web research with LLMs
///
/// Plans search queries for a topic, keeps the relevant sources, distills
/// learnings and follow-up questions, recurses on those, and writes a
/// Markdown report.
#[derive(Parser, Debug)]
#[command(
    name = "deep-research",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "Recursive research expansion with LLMs and web search",
    after_help = "EXAMPLES:\n    \
                  deep-research \"How do solid-state batteries work?\"\n    \
                  deep-research -d 3 -b 3 -o batteries.md \"solid-state batteries\"\n    \
                  deep-research --config my.toml           # prompt is read from stdin"
)]
pub struct Cli {
    /// Research prompt (read from stdin when omitted)
    pub prompt: Option<String>,

    /// Recursion depth
    #[arg(short, long)]
    pub depth: Option<u32>,

    /// Sub-queries planned at the top level
    #[arg(short, long)]
    pub breadth: Option<usize>,

    /// Where to write the report
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to the configuration file [default: research.toml, if present]
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Override configuration values with the flags that were given
    pub fn apply_overrides(&self, config: &mut ResearchConfig) {
        if let Some(depth) = self.depth {
            config.research.depth = depth;
        }
        if let Some(breadth) = self.breadth {
            config.research.breadth = breadth;
        }
        if let Some(path) = &self.output {
            config.output.path = path.clone();
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        if self.json_logs {
            config.logging.format = "json".to_string();
        }
    }
}
