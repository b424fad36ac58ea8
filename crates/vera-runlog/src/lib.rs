//! Content-addressed persistence of pipeline runs, the audit-log export, and
//! the evaluation aggregator that reads saved runs back.
//!
//! A run directory holds `meta.json` (settings), `payload.json` (the KPI
//! summary), `claims_raw.json` (generated claims before checking), and
//! `checked.csv` (the flat audit table).

pub mod error;

use std::{
  fs,
  path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use vera_core::{
  claim::{CheckStatus, CheckedClaim, Claim, MetricKind},
  summary::KpiSummary,
};

pub use error::{Error, Result};

// ─── Settings ────────────────────────────────────────────────────────────────

/// Settings captured alongside each saved run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSettings {
  pub model:            String,
  pub temperature:      f32,
  pub compare_previous: bool,
  pub tolerance_pct:    f64,
}

// ─── Run identifiers ─────────────────────────────────────────────────────────

/// Content-addressed run identifier: a wall-clock prefix plus the first eight
/// hex characters of a SHA-256 over the payload and settings.
///
/// The caller supplies `now` so identifiers stay reproducible under test.
pub fn run_id(
  summary: &KpiSummary,
  settings: &RunSettings,
  now: NaiveDateTime,
) -> Result<String> {
  let key = serde_json::to_vec(&serde_json::json!({
    "payload": summary,
    "settings": settings,
  }))?;
  let digest = Sha256::digest(&key);
  Ok(format!(
    "{}_{}",
    now.format("%Y%m%d_%H%M%S"),
    &hex::encode(digest)[..8]
  ))
}

// ─── Audit table ─────────────────────────────────────────────────────────────

/// One flat audit row per checked claim — the export shape of the run log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRow {
  pub claim_id:       String,
  pub statement:      String,
  pub status:         CheckStatus,
  pub reason:         String,
  pub value_reported: f64,
  pub value_computed: f64,
  pub metric:         MetricKind,
}

impl From<&CheckedClaim> for AuditRow {
  fn from(c: &CheckedClaim) -> Self {
    Self {
      claim_id:       c.claim_id.clone(),
      statement:      c.statement.clone(),
      status:         c.status,
      reason:         c.reason.clone(),
      value_reported: c.value_reported,
      value_computed: c.value_computed,
      metric:         c.metric,
    }
  }
}

/// Render checked claims as a delimited audit table.
pub fn audit_csv(checked: &[CheckedClaim]) -> Result<String> {
  let mut writer = csv::Writer::from_writer(Vec::new());
  for claim in checked {
    writer.serialize(AuditRow::from(claim))?;
  }
  let bytes = writer
    .into_inner()
    .map_err(|e| Error::Io(e.into_error()))?;
  Ok(String::from_utf8(bytes)?)
}

// ─── Persistence ─────────────────────────────────────────────────────────────

/// Persist one run under `dir`, returning the run directory path.
pub fn save_run(
  dir: &Path,
  summary: &KpiSummary,
  claims: &[Claim],
  checked: &[CheckedClaim],
  settings: &RunSettings,
  now: NaiveDateTime,
) -> Result<PathBuf> {
  let rid = run_id(summary, settings, now)?;
  let out = dir.join(&rid);
  fs::create_dir_all(&out)?;

  fs::write(out.join("meta.json"), serde_json::to_string_pretty(settings)?)?;
  fs::write(
    out.join("payload.json"),
    serde_json::to_string_pretty(summary)?,
  )?;
  fs::write(
    out.join("claims_raw.json"),
    serde_json::to_string_pretty(claims)?,
  )?;
  fs::write(out.join("checked.csv"), audit_csv(checked)?)?;

  info!(run = %rid, "run persisted");
  Ok(out)
}

// ─── Evaluation ──────────────────────────────────────────────────────────────

/// Per-run status tally read back from a saved `checked.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub run:         String,
  pub total:       usize,
  pub verified:    usize,
  pub approximate: usize,
  pub mismatch:    usize,
  pub error:       usize,
}

impl RunReport {
  fn empty(run: String) -> Self {
    Self {
      run,
      total: 0,
      verified: 0,
      approximate: 0,
      mismatch: 0,
      error: 0,
    }
  }

  fn tally(&mut self, status: CheckStatus) {
    self.total += 1;
    match status {
      CheckStatus::Verified => self.verified += 1,
      CheckStatus::Approximate => self.approximate += 1,
      CheckStatus::Mismatch => self.mismatch += 1,
      CheckStatus::Error => self.error += 1,
    }
  }

  pub fn verified_pct(&self) -> f64 {
    if self.total == 0 {
      0.0
    } else {
      100.0 * self.verified as f64 / self.total as f64
    }
  }
}

/// Scan `dir` for `<run>/checked.csv` files and tally statuses per run,
/// sorted by run name (the timestamp prefix makes that chronological).
pub fn evaluate_runs(dir: &Path) -> Result<Vec<RunReport>> {
  let mut reports = Vec::new();

  for entry in fs::read_dir(dir)? {
    let entry = entry?;
    let checked = entry.path().join("checked.csv");
    if !checked.is_file() {
      continue;
    }

    let mut report =
      RunReport::empty(entry.file_name().to_string_lossy().into_owned());
    let mut reader = csv::Reader::from_path(&checked)?;
    for row in reader.deserialize::<AuditRow>() {
      report.tally(row?.status);
    }
    reports.push(report);
  }

  reports.sort_by(|a, b| a.run.cmp(&b.run));
  Ok(reports)
}

/// Aggregate totals across runs.
pub fn aggregate(reports: &[RunReport]) -> RunReport {
  let mut total = RunReport::empty("all".to_string());
  for r in reports {
    total.total += r.total;
    total.verified += r.verified;
    total.approximate += r.approximate;
    total.mismatch += r.mismatch;
    total.error += r.error;
  }
  total
}

#[derive(Serialize)]
struct SummaryRow<'a> {
  run:          &'a str,
  total:        usize,
  verified:     usize,
  approximate:  usize,
  mismatch:     usize,
  error:        usize,
  verified_pct: f64,
}

/// Write the aggregate evaluation table to `path`.
pub fn write_summary_csv(path: &Path, reports: &[RunReport]) -> Result<()> {
  let mut writer = csv::Writer::from_path(path)?;
  for report in reports {
    writer.serialize(SummaryRow {
      run:          &report.run,
      total:        report.total,
      verified:     report.verified,
      approximate:  report.approximate,
      mismatch:     report.mismatch,
      error:        report.error,
      verified_pct: (report.verified_pct() * 10.0).round() / 10.0,
    })?;
  }
  writer.flush()?;
  Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
