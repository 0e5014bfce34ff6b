//! Data types produced by the scoring pipeline.

use serde::Serialize;

/// Per-student scores for one area, in cohort row order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaScores {
    pub name: String,
    pub scores: Vec<f64>,
}

/// One column per area that had resolvable item columns, in mapping order.
///
/// Columns may differ in length: each area drops its own unscored students.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GradeScores {
    pub areas: Vec<AreaScores>,
}

impl GradeScores {
    pub fn area_names(&self) -> Vec<&str> {
        self.areas.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.areas
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.scores.as_slice())
    }

    /// Length of the longest area column.
    pub fn max_len(&self) -> usize {
        self.areas.iter().map(|a| a.scores.len()).max().unwrap_or(0)
    }
}

/// 25th, 50th and 75th percentiles of a score column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

impl Quartiles {
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}
