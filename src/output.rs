//! Run summary persistence: a per-area statistics CSV and a JSON index of
//! every chart written.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::DatasetKind;
use crate::scoring::types::GradeScores;
use crate::scoring::utility::{mean, quartiles};

/// One CSV row: distribution summary for a single area of a single chart.
///
/// Quartiles are left blank for an area with no scored students.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaSummaryRow {
    pub dataset: DatasetKind,
    pub year: u16,
    pub grade: u8,
    pub area: String,
    pub students: usize,
    pub mean: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
}

impl AreaSummaryRow {
    /// Summarizes every area column of `scores`.
    pub fn from_scores(
        dataset: DatasetKind,
        year: u16,
        grade: u8,
        scores: &GradeScores,
    ) -> Vec<Self> {
        scores
            .areas
            .iter()
            .map(|area| {
                let q = quartiles(&area.scores);
                AreaSummaryRow {
                    dataset,
                    year,
                    grade,
                    area: area.name.clone(),
                    students: area.scores.len(),
                    mean: (!area.scores.is_empty()).then(|| mean(&area.scores)),
                    q1: q.map(|q| q.q1),
                    median: q.map(|q| q.median),
                    q3: q.map(|q| q.q3),
                }
            })
            .collect()
    }
}

/// Index entry for a rendered chart.
#[derive(Debug, Clone, Serialize)]
pub struct ChartEntry {
    pub dataset: DatasetKind,
    pub year: u16,
    pub grade: u8,
    pub code: i64,
    pub areas: Vec<String>,
    pub path: PathBuf,
}

/// Top-level index of a batch run, written as `run_index.json`.
#[derive(Debug, Serialize)]
pub struct RunIndex {
    pub generated_at: DateTime<Utc>,
    pub charts: Vec<ChartEntry>,
}

/// Writes `rows` to a fresh CSV file at `path`, header included.
pub fn write_area_summary(path: &Path, rows: &[AreaSummaryRow]) -> Result<()> {
    debug!(path = %path.display(), rows = rows.len(), "Writing area summary");

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes the run index as pretty-printed JSON.
pub fn write_run_index(path: &Path, index: &RunIndex) -> Result<()> {
    let body = serde_json::to_string_pretty(index)?;
    std::fs::write(path, body)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

/// Chart paths relative to `out_dir`, so charts of different datasets stay distinguishable.
pub fn chart_names(index: &RunIndex, out_dir: &Path) -> Vec<String> {
    index
        .charts
        .iter()
        .map(|c| c.path.strip_prefix(out_dir).unwrap_or(&c.path))
        .map(|p| p.to_string_lossy().into_owned())
        .collect()
}

/// Logs the human-readable completion line listing every chart file.
pub fn log_completion(index: &RunIndex, out_dir: &Path) {
    let names = chart_names(index, out_dir);
    info!(charts = names.len(), "Done! Generated {}", names.join(", "));
}
