use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use launch_planner::config::Config;
use launch_planner::planner::{matched_triggers, parse_goal, PlanExecutor};
use launch_planner::workers::WorkerRegistry;

const DEFAULT_GOAL: &str = concat!(
    "Find the next SpaceX launch, check weather at that location, ",
    "then summarize if it may be delayed."
);

#[derive(Parser)]
#[command(name = "launch-planner")]
#[command(
    about = "Plans and runs launch lookup, weather and summary workers from a free-text goal",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan a goal and run its workers, printing the resulting record
    Run {
        /// Free-text goal (default: next launch + weather + summary)
        goal: Option<String>,
        /// Load configuration from this file instead of the default location
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Per-worker deadline in seconds, overriding the configuration
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Show which workers a goal would run, without running them
    Plan {
        /// Free-text goal
        goal: String,
    },
    /// Show or update the stored configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
        /// Set the OpenWeatherMap API key
        #[arg(long)]
        weather_api_key: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the record
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "launch_planner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            goal,
            config,
            timeout,
        } => {
            run_goal(goal.as_deref().unwrap_or(DEFAULT_GOAL), config, timeout).await?;
        }
        Commands::Plan { goal } => {
            show_plan(&goal);
        }
        Commands::Config {
            show,
            weather_api_key,
        } => {
            handle_config(show, weather_api_key)?;
        }
    }

    Ok(())
}

async fn run_goal(goal: &str, config_path: Option<PathBuf>, timeout: Option<u64>) -> Result<()> {
    let config = match config_path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };

    let registry = WorkerRegistry::with_defaults(&config)?;
    let mut executor = PlanExecutor::from_config(&config.executor);
    if let Some(secs) = timeout {
        executor = executor.with_worker_timeout(Duration::from_secs(secs));
    }

    println!("Processing goal: '{}'", goal);
    let record = executor.execute_plan(goal, &registry).await;

    println!("\n--- Final Result ---");
    println!("{}", record.to_pretty_json()?);

    match record.get_str("summary_text") {
        Some(summary) if record.status() == Some("success") => {
            println!("\n--- Summary Text ---");
            println!("{}", summary);
        }
        Some(summary) => {
            println!("\n--- Partial Summary ---");
            println!("{}", summary);
        }
        None => {
            println!("\nNo summary text produced or an error occurred before summary generation.");
        }
    }

    Ok(())
}

fn show_plan(goal: &str) {
    let plan = parse_goal(goal);

    if plan.is_empty() {
        println!("No workers identified for the goal.");
        return;
    }

    println!("Plan: {}", plan);
    for (i, worker) in plan.iter().enumerate() {
        println!(
            "  {}. {} (matched: {})",
            i + 1,
            worker,
            matched_triggers(goal, worker).join(", ")
        );
    }
}

fn handle_config(show: bool, weather_api_key: Option<String>) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config.redacted())?);
        return Ok(());
    }

    if let Some(key) = weather_api_key {
        config.weather.api_key = Some(key);
        config.save()?;
        println!("Weather API key updated");
        println!("Configuration saved to: {:?}", Config::config_path()?);
    } else {
        println!("No changes made. Use --show to view current configuration.");
    }

    Ok(())
}
