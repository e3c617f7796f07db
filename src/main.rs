//! Scout: hybrid candidate search and submission
//!
//! Retrieves, ranks, and submits candidate lists per job category.

use anyhow::Result;
use clap::{Parser, Subcommand};
use scout::{
    config::Config,
    grading::GradingClient,
    runner::{RunSummary, SearchRunner},
    types::SearchStrategy,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "Hybrid candidate search and grading submission")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "scout.toml")]
    config: PathBuf,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search all categories and optionally submit for grading
    Run {
        /// Retrieval strategy (configured default when omitted)
        #[arg(short, long, value_enum)]
        strategy: Option<CliStrategy>,

        /// Override the configured worker count
        #[arg(short, long)]
        workers: Option<usize>,

        /// Submit the payload to the grading endpoint
        #[arg(long)]
        submit: bool,

        /// Write the submission payload JSON to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Search a single configured category and print the ranked list
    Search {
        /// Category name, as configured
        category: String,

        /// Retrieval strategy (configured default when omitted)
        #[arg(short, long, value_enum)]
        strategy: Option<CliStrategy>,

        /// Output format (json, text)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Search and score categories against the evaluation endpoint
    Evaluate {
        /// Restrict to one category (all configured categories by default)
        category: Option<String>,
    },

    /// Initialize a new scout configuration
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

/// CLI strategy enum (mirrors SearchStrategy but with clap support)
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum CliStrategy {
    /// Vector ANN path only
    Vector,
    /// Keyword BM25 path only
    Keyword,
    /// Both paths, merged by weighted score
    Hybrid,
}

impl From<CliStrategy> for SearchStrategy {
    fn from(strategy: CliStrategy) -> Self {
        match strategy {
            CliStrategy::Vector => SearchStrategy::Vector,
            CliStrategy::Keyword => SearchStrategy::Keyword,
            CliStrategy::Hybrid => SearchStrategy::Hybrid,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init writes the config file, so handle it before trying to load one
    if let Commands::Init { path } = &cli.command {
        return init_config(path.clone());
    }

    let config = Config::load(&cli.config)?;

    // Setup logging: -v flags raise the configured base level
    let log_level = match cli.verbose {
        0 => config.logging.tracing_level(),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false);
    if config.logging.format == scout::config::LogFormat::Json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    match cli.command {
        Commands::Run {
            strategy,
            workers,
            submit,
            output,
        } => {
            let strategy = strategy.map(Into::into).unwrap_or(config.search.strategy);
            run_all(config, strategy, workers, submit, output).await
        }
        Commands::Search {
            category,
            strategy,
            format,
        } => {
            let strategy = strategy.map(Into::into).unwrap_or(config.search.strategy);
            search_category(config, category, strategy, format).await
        }
        Commands::Evaluate { category } => evaluate(config, category).await,
        Commands::Init { .. } => unreachable!("handled above"),
    }
}

async fn run_all(
    mut config: Config,
    strategy: SearchStrategy,
    workers: Option<usize>,
    submit: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    if let Some(workers) = workers {
        config.search.workers = workers.max(1);
    }

    // Resolve the submitter before the run: a run that cannot submit
    // should fail before spending money on retrieval.
    let grader = if submit {
        Some(GradingClient::new(&config.grading, &config.search.retry)?)
    } else {
        None
    };

    let runner = Arc::new(SearchRunner::from_config(config)?);
    let summary = runner.run(strategy).await;
    let payload = summary.submission_payload();

    print_run_summary(&summary);

    if payload.is_empty() {
        anyhow::bail!("No category produced candidates; nothing to submit");
    }

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&payload)?;
        std::fs::write(&path, json)?;
        println!("Payload written to {}", path.display());
    }

    match grader {
        Some(grader) => {
            let report = grader.grade(&payload).await?;
            println!("\nGrading complete");
            if let Some(average) = report.average {
                println!("Average score: {:.2}", average);
            }
            for (category, score) in &report.per_category {
                println!("  {}: {:.2}", category, score);
            }
            if report.average.is_none() && report.per_category.is_empty() {
                println!("{}", report.raw);
            }
        }
        None => {
            info!("Dry run: payload not submitted (pass --submit to grade)");
        }
    }

    Ok(())
}

async fn search_category(
    config: Config,
    category_name: String,
    strategy: SearchStrategy,
    format: String,
) -> Result<()> {
    let Some(category) = config
        .categories
        .iter()
        .find(|c| c.name == category_name)
        .cloned()
    else {
        anyhow::bail!(
            "Category '{}' is not configured. Known categories: {}",
            category_name,
            config
                .categories
                .iter()
                .map(|c| c.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    };

    let runner = SearchRunner::from_config(config)?;
    let outcome = runner.search_category(&category, strategy).await;

    match format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&outcome.ranked)?;
            println!("{}", json);
        }
        _ => {
            println!(
                "\nResults for {} ({} found, {}ms):\n",
                outcome.category,
                outcome.ranked.len(),
                outcome.elapsed_ms
            );
            for (i, candidate) in outcome.ranked.iter().enumerate() {
                println!("{}. [Score: {:.4}]", i + 1, candidate.combined_score);
                println!("   ID: {}", candidate.id);
                println!("   Matched by: {:?}", candidate.matched_by);
                println!();
            }
        }
    }

    Ok(())
}

async fn evaluate(config: Config, category: Option<String>) -> Result<()> {
    if let Some(name) = &category {
        if !config.categories.iter().any(|c| c.name == *name) {
            anyhow::bail!("Category '{}' is not configured", name);
        }
    }

    let grader = GradingClient::new(&config.grading, &config.search.retry)?;
    let mut config = config;
    if let Some(name) = &category {
        config.categories.retain(|c| c.name == *name);
    }

    let strategy = config.search.strategy;
    let runner = Arc::new(SearchRunner::from_config(config)?);
    let summary = runner.run(strategy).await;

    let mut scored = 0usize;
    for outcome in summary.outcomes.values() {
        if outcome.ranked.is_empty() {
            warn!("Skipping '{}': no candidates to evaluate", outcome.category);
            continue;
        }
        let ids: Vec<_> = outcome.ranked.iter().map(|c| c.id.clone()).collect();
        let report = grader.evaluate(&outcome.category, &ids).await?;

        println!("\n{}", outcome.category);
        println!("  Final score: {:.2}", report.average_final_score);
        println!("  Candidates scored: {}", report.individual_results.len());
        for entry in &report.average_soft_scores {
            println!("  soft: {}", entry);
        }
        for entry in &report.average_hard_scores {
            println!("  hard: {}", entry);
        }
        scored += 1;
    }

    if scored == 0 {
        anyhow::bail!("No category produced candidates to evaluate");
    }
    Ok(())
}

fn print_run_summary(summary: &RunSummary) {
    println!("\nRun Summary:");
    println!("============");
    for outcome in summary.outcomes.values() {
        println!(
            "{}: {} candidates ({} vector / {} keyword pooled{}, {}ms)",
            outcome.category,
            outcome.ranked.len(),
            outcome.pooled_vector,
            outcome.pooled_keyword,
            if outcome.expanded { ", expanded" } else { "" },
            outcome.elapsed_ms
        );
    }
    let empty = summary.empty_categories();
    if !empty.is_empty() {
        println!("Empty categories: {}", empty.join(", "));
    }
}

fn init_config(path: PathBuf) -> Result<()> {
    let config_path = path.join("scout.toml");
    if config_path.exists() {
        anyhow::bail!("Refusing to overwrite existing {}", config_path.display());
    }
    std::fs::create_dir_all(&path)?;
    std::fs::write(&config_path, Config::template())?;
    println!("Created configuration file: {}", config_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_subscriber_formats_build() {
        let text = FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_target(false)
            .finish();
        drop(text);

        let json = FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_target(false)
            .json()
            .finish();
        drop(json);
    }
}
