//! Batch driver: runs every (year, grade) job of each dataset profile.
//!
//! Each generation's cohort is loaded once; jobs then run one after another,
//! each assembling area scores, rendering its chart, and recording a summary.

use anyhow::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{info, info_span};

use crate::cohort::{CohortTable, load_cohort};
use crate::config::{DatasetConfig, Generation, Job};
use crate::output::{
    AreaSummaryRow, ChartEntry, RunIndex, log_completion, write_area_summary, write_run_index,
};
use crate::render::{ChartCanvas, ChartStyle, render_grade_chart};
use crate::scoring::assemble::grade_scores;

pub const SUMMARY_FILE: &str = "area_summary.csv";
pub const INDEX_FILE: &str = "run_index.json";

/// Where inputs are read from and outputs written to.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,
    pub canvas: ChartCanvas,
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            data_dir: PathBuf::from("."),
            out_dir: PathBuf::from("."),
            canvas: ChartCanvas::default(),
        }
    }
}

/// Result of a single job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub chart: ChartEntry,
    pub rows: Vec<AreaSummaryRow>,
}

/// Chart file for a job: `<out>/<profile dir>/violin_<year>_<grade>th.png`.
pub fn chart_path(out_dir: &Path, config: &DatasetConfig, year: u16, grade: u8) -> PathBuf {
    out_dir
        .join(&config.output_dir)
        .join(format!("violin_{year}_{grade}th.png"))
}

/// Scores one grade of an already-loaded cohort and renders its chart.
pub fn run_job(
    cohort: &CohortTable,
    config: &DatasetConfig,
    generation: &Generation,
    job: Job,
    options: &BatchOptions,
) -> Result<JobOutcome> {
    let areas = generation.areas_for(job.code).unwrap_or_default();
    let scores = grade_scores(
        cohort,
        &config.grade_column,
        job.code,
        areas,
        &generation.prefix,
    );

    let path = chart_path(&options.out_dir, config, generation.year, job.grade);
    let style = ChartStyle::for_job(config, generation.year, job.grade);
    render_grade_chart(&options.canvas, &scores, &style, &path)?;

    info!(
        path = %path.display(),
        areas = scores.areas.len(),
        students = scores.max_len(),
        "Chart written"
    );

    Ok(JobOutcome {
        rows: AreaSummaryRow::from_scores(config.kind, generation.year, job.grade, &scores),
        chart: ChartEntry {
            dataset: config.kind,
            year: generation.year,
            grade: job.grade,
            code: job.code,
            areas: scores.area_names().iter().map(|s| s.to_string()).collect(),
            path,
        },
    })
}

/// Runs all jobs of one dataset profile.
///
/// # Errors
///
/// Fails on the first input that cannot be loaded or chart that cannot be written.
pub fn run_dataset(config: &DatasetConfig, options: &BatchOptions) -> Result<Vec<JobOutcome>> {
    let mut outcomes = Vec::new();

    for generation in &config.generations {
        let input = options.data_dir.join(&generation.input);
        info!(
            dataset = %config.kind,
            year = generation.year,
            input = %input.display(),
            "Loading cohort"
        );
        let cohort = load_cohort(&input)?;

        for job in &generation.jobs {
            let _span = info_span!(
                "job",
                dataset = %config.kind,
                year = generation.year,
                grade = job.grade,
                code = job.code,
            )
            .entered();

            outcomes.push(run_job(&cohort, config, generation, *job, options)?);
        }
    }

    Ok(outcomes)
}

/// Runs every profile, then writes the area summary CSV and run index JSON
/// into `options.out_dir`.
pub fn run_batch(configs: &[DatasetConfig], options: &BatchOptions) -> Result<RunIndex> {
    let mut charts = Vec::new();
    let mut rows = Vec::new();

    for config in configs {
        for outcome in run_dataset(config, options)? {
            charts.push(outcome.chart);
            rows.extend(outcome.rows);
        }
    }

    std::fs::create_dir_all(&options.out_dir)?;
    write_area_summary(&options.out_dir.join(SUMMARY_FILE), &rows)?;

    let index = RunIndex {
        generated_at: Utc::now(),
        charts,
    };
    write_run_index(&options.out_dir.join(INDEX_FILE), &index)?;
    log_completion(&index, &options.out_dir);

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetKind;

    #[test]
    fn test_chart_path_encodes_year_and_grade() {
        let config = DatasetConfig::builtin(DatasetKind::Numeracy).unwrap();
        let path = chart_path(Path::new("out"), &config, 2023, 8);
        assert_eq!(path, PathBuf::from("out/figure/numeracy/violin_2023_8th.png"));
    }

    #[test]
    fn test_chart_paths_unique_across_all_jobs() {
        let mut seen = std::collections::HashSet::new();
        for kind in [DatasetKind::Numeracy, DatasetKind::Literacy] {
            let config = DatasetConfig::builtin(kind).unwrap();
            for generation in &config.generations {
                for job in &generation.jobs {
                    let path = chart_path(Path::new("."), &config, generation.year, job.grade);
                    assert!(seen.insert(path), "duplicate output path");
                }
            }
        }
        assert_eq!(seen.len(), 16);
    }

    #[test]
    fn test_missing_input_aborts() {
        let config = DatasetConfig::builtin(DatasetKind::Literacy).unwrap();
        let options = BatchOptions {
            data_dir: std::env::temp_dir().join("area_violin_no_such_dir"),
            ..Default::default()
        };
        assert!(run_dataset(&config, &options).is_err());
    }
}
