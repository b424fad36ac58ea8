//! `vera` — KPI insight pipeline over an order-line CSV.
//!
//! # Usage
//!
//! ```
//! vera report --data orders.csv --start 2024-01-01 --end 2024-03-31
//! vera eval --runs-dir artifacts/runs
//! ```

mod eval;
mod load;
mod report;
mod settings;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
  name = "vera",
  about = "KPI insights, fact-checked against the data that produced them"
)]
struct Cli {
  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run one insight pipeline pass over a dataset and print the results.
  Report(report::ReportArgs),
  /// Tally verification statuses across saved runs.
  Eval(eval::EvalArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  match Cli::parse().command {
    Command::Report(args) => report::run(args).await,
    Command::Eval(args) => eval::run(args),
  }
}
