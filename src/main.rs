//! deep-research CLI entry point
//!
//! Loads configuration, checks credentials, runs one research session and
//! writes the report. Any failure exits non-zero without writing a report.

use anyhow::Context;
use deep_research::cli::output::Output;
use deep_research::cli::{Cli, DEFAULT_CONFIG_PATH};
use deep_research::utils::config::{LoggingConfig, ResearchConfig};
use deep_research::{search, Provider, ResearchSession, SearchOptions};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Err(e) = run(cli, &output).await {
        tracing::error!(error = %e, "Research run failed");
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = match &cli.config {
        Some(path) => ResearchConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => ResearchConfig::load_or_default(DEFAULT_CONFIG_PATH)?,
    };
    cli.apply_overrides(&mut config);

    init_tracing(&config.logging);
    config.validate()?;
    config.check_credentials()?;

    output.banner();

    let prompt = match cli.prompt.clone() {
        Some(prompt) => prompt,
        None => output
            .ask("What would you like to research?")
            .context("No research prompt given")?,
    };

    output.step(1, 3, "Connecting providers");
    let provider = Provider::from_config(&config.llm)?;
    let client = provider.create_client()?;
    let search = search::create_provider(&config.search)?;
    output.info(&format!(
        "{} ({}) with {} search",
        provider.name(),
        client.model_name(),
        search.name()
    ));

    output.step(
        2,
        3,
        &format!(
            "Researching (depth {}, breadth {})",
            config.research.depth, config.research.breadth
        ),
    );
    let session = ResearchSession::new(
        client,
        search,
        SearchOptions::from(&config.search),
        config.research.clone(),
    );
    let outcome = session.run(&prompt).await?;

    output.step(3, 3, "Writing report");
    std::fs::write(&config.output.path, &outcome.report)
        .with_context(|| format!("Failed to write {}", config.output.path.display()))?;

    let snapshot = &outcome.snapshot;
    output.header("Summary");
    output.kv("queries", &snapshot.queries.len().to_string());
    output.kv("completed", &snapshot.completed_queries.len().to_string());
    output.kv("sources", &snapshot.search_results.len().to_string());
    output.kv("learnings", &snapshot.learnings.len().to_string());
    output.kv("expansions", &snapshot.expansions.len().to_string());
    output.kv("provider calls", &snapshot.calls.to_string());
    if snapshot.is_empty() {
        output.warning("Nothing relevant was found; wrote the fallback report");
    }
    output.newline();
    output.success(&format!("Report written to {}", config.output.path.display()));

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("deep_research={}", logging.level)));

    let layer = if logging.format == "json" {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}
