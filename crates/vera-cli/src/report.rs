//! The `report` command: one full pipeline pass, printed.

use std::path::PathBuf;

use anyhow::{Context as _, Result, ensure};
use chrono::NaiveDate;
use clap::Args;
use vera_core::dataset::{Dataset, FilterCtx, Period};
use vera_insight::{PassOptions, PassOutcome, run_pass, run_pass_with_backend};
use vera_llm::{LlmClient, LlmConfig};
use vera_runlog::RunSettings;

use crate::{load, settings};

#[derive(Args)]
pub struct ReportArgs {
  /// Path to the orders CSV.
  #[arg(long, value_name = "FILE")]
  data: PathBuf,

  /// Period start (YYYY-MM-DD); defaults to the earliest order date.
  #[arg(long)]
  start: Option<NaiveDate>,

  /// Period end (YYYY-MM-DD); defaults to the latest order date.
  #[arg(long)]
  end: Option<NaiveDate>,

  /// Restrict to one category.
  #[arg(long)]
  category: Option<String>,

  /// Restrict to one store.
  #[arg(long)]
  store: Option<String>,

  /// Skip the previous-period comparison.
  #[arg(long)]
  no_compare: bool,

  /// Verified tolerance, in percent.
  #[arg(long, default_value_t = vera_insight::check::DEFAULT_TOLERANCE_PCT)]
  tolerance: f64,

  /// Persist the run under this directory.
  #[arg(long, value_name = "DIR")]
  log_dir: Option<PathBuf>,

  /// Settings file (TOML).
  #[arg(long, default_value = "vera.toml", value_name = "FILE")]
  config: PathBuf,
}

pub async fn run(args: ReportArgs) -> Result<()> {
  let settings = settings::load(&args.config)?;
  let dataset = load::load_csv(&args.data)?;
  ensure!(
    !dataset.is_empty(),
    "{} contains no usable rows",
    args.data.display()
  );

  let (min_date, max_date) = dataset
    .date_bounds()
    .context("dataset has no date bounds")?;
  let period = Period::new(
    args.start.unwrap_or(min_date),
    args.end.unwrap_or(max_date),
  );
  let filter = FilterCtx {
    category: args.category,
    store:    args.store,
  };
  let options = PassOptions {
    tolerance_pct:    args.tolerance,
    compare_previous: !args.no_compare,
    max_tokens:       settings.max_tokens,
    temperature:      settings.temperature,
  };

  let outcome = if settings.use_backend {
    let client = LlmClient::new(LlmConfig {
      base_url:     settings.base_url.clone(),
      api_key:      settings.api_key.clone(),
      model:        settings.model.clone(),
      timeout_secs: settings.timeout_secs,
    })?;
    run_pass_with_backend(&dataset, period, &filter, &options, &client).await
  } else {
    run_pass(&dataset, period, &filter, &options)
  };

  print_report(&outcome, &dataset, period, &filter);

  if let Some(dir) = &args.log_dir {
    let run_settings = RunSettings {
      model: if settings.use_backend {
        settings.model.clone()
      } else {
        "offline-heuristic".to_string()
      },
      temperature: settings.temperature,
      compare_previous: options.compare_previous,
      tolerance_pct: options.tolerance_pct,
    };
    let path = vera_runlog::save_run(
      dir,
      &outcome.summary,
      &outcome.claims,
      &outcome.checked,
      &run_settings,
      chrono::Local::now().naive_local(),
    )?;
    println!("Run logged to: {}", path.display());
  }

  Ok(())
}

fn print_report(
  outcome: &PassOutcome,
  dataset: &Dataset,
  period: Period,
  filter: &FilterCtx,
) {
  println!("Period: {} .. {}", period.start, period.end);
  if let Some(category) = &filter.category {
    println!("Category: {category}");
  }
  if let Some(store) = &filter.store {
    println!("Store: {store}");
  }

  let current = &outcome.summary.current;
  match current.aov {
    Some(aov) => println!(
      "Revenue: {:.2}  Orders: {}  AOV: {:.2}",
      current.revenue, current.orders as i64, aov
    ),
    None => println!(
      "Revenue: {:.2}  Orders: {}  AOV: n/a",
      current.revenue, current.orders as i64
    ),
  }

  let top = vera_metrics::top_segments(
    dataset.records(),
    &period,
    filter,
    vera_metrics::Dimension::Product,
    5,
  );
  if !top.is_empty() {
    println!();
    println!("Top products:");
    for stat in &top {
      println!(
        "  {:<24} {:>10.2}  ({} order(s))",
        stat.segment, stat.revenue, stat.orders
      );
    }
  }

  println!();
  if outcome.checked.is_empty() {
    println!("No insights generated for this view.");
  } else {
    println!("Fact-checked insights:");
    for claim in &outcome.checked {
      println!(
        "  [{}] {} ({})",
        claim.status, claim.statement, claim.reason
      );
    }
  }

  println!();
  println!("{}", outcome.narrative);
}
