//! Colored output helpers for CLI
//!
//! Provides consistent, colored terminal output for the deep-research CLI.

use owo_colors::OwoColorize;
use std::io::{self, Write};

const KEY_WIDTH: usize = 16;

#[derive(Debug, Clone, Copy)]
enum Status {
    Done,
    Note,
    Warn,
    Fail,
}

impl Status {
    fn tag(self) -> &'static str {
        match self {
            Status::Done => "done",
            Status::Note => "info",
            Status::Warn => "warn",
            Status::Fail => "error",
        }
    }
}

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the banner
    pub fn banner(&self) {
        if self.colored {
            println!(
                "\n   {} {}\n",
                "deep-research".bright_cyan().bold(),
                format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
            );
        } else {
            println!("\n   deep-research v{}\n", env!("CARGO_PKG_VERSION"));
        }
    }

    /// A finished stage, or the final report location
    pub fn success(&self, message: &str) {
        println!("{}", self.status(Status::Done, message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.status(Status::Note, message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.status(Status::Warn, message));
    }

    /// Printed to stderr
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.status(Status::Fail, message));
    }

    /// Progress through the run's stages, e.g. `[2/3] Researching`
    pub fn step(&self, step_num: u32, total: u32, message: &str) {
        let counter = format!("[{}/{}]", step_num, total);
        if self.colored {
            println!("  {} {}", counter.cyan(), message.bold());
        } else {
            println!("  {} {}", counter, message);
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.to_uppercase().bright_cyan().bold());
        } else {
            println!("\n  {}", title.to_uppercase());
        }
    }

    /// One summary line, with keys padded into a column
    pub fn kv(&self, key: &str, value: &str) {
        let key = format!("{:<KEY_WIDTH$}", key);
        if self.colored {
            println!("    {} {}", key.dimmed(), value.bold());
        } else {
            println!("    {} {}", key, value);
        }
    }

    fn status(&self, status: Status, message: &str) -> String {
        if !self.colored {
            return format!("  [{}] {}", status.tag(), message);
        }
        let mark = match status {
            Status::Done => "✓".green().bold().to_string(),
            Status::Note => "›".cyan().to_string(),
            Status::Warn => "!".yellow().bold().to_string(),
            Status::Fail => "✗".red().bold().to_string(),
        };
        format!("  {} {}", mark, message)
    }

    /// Ask for a line of input. Returns `None` on EOF, read failure or a
    /// blank answer.
    pub fn ask(&self, message: &str) -> Option<String> {
        if self.colored {
            print!("  {} {} ", "?".bright_yellow().bold(), message.bright_white());
        } else {
            print!("  [?] {} ", message);
        }

        io::stdout().flush().ok();

        let mut input = String::new();
        match io::stdin().read_line(&mut input) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(input.trim().to_string()).filter(|s| !s.is_empty()),
        }
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }
}
