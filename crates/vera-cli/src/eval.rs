//! The `eval` command: tally verification statuses across saved runs.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use vera_runlog::{RunReport, aggregate, evaluate_runs, write_summary_csv};

#[derive(Args)]
pub struct EvalArgs {
  /// Directory containing saved runs.
  #[arg(long, default_value = "artifacts/runs", value_name = "DIR")]
  runs_dir: PathBuf,

  /// Where to write the aggregate table.
  #[arg(
    long,
    default_value = "artifacts/eval_summary.csv",
    value_name = "FILE"
  )]
  out: PathBuf,
}

fn print_row(report: &RunReport) {
  println!(
    "{:<28} {:>5} {:>8} {:>11} {:>8} {:>5} {:>12.1}",
    report.run,
    report.total,
    report.verified,
    report.approximate,
    report.mismatch,
    report.error,
    report.verified_pct(),
  );
}

pub fn run(args: EvalArgs) -> Result<()> {
  if !args.runs_dir.is_dir() {
    println!("No runs found in {}", args.runs_dir.display());
    return Ok(());
  }

  let reports = evaluate_runs(&args.runs_dir)?;
  if reports.is_empty() {
    println!("No runs found in {}", args.runs_dir.display());
    return Ok(());
  }

  println!(
    "{:<28} {:>5} {:>8} {:>11} {:>8} {:>5} {:>12}",
    "run", "total", "verified", "approximate", "mismatch", "error",
    "verified_pct"
  );
  for report in &reports {
    print_row(report);
  }
  print_row(&aggregate(&reports));

  if let Some(parent) = args.out.parent() {
    std::fs::create_dir_all(parent)?;
  }
  write_summary_csv(&args.out, &reports)?;
  println!("\nSaved {}", args.out.display());
  Ok(())
}
