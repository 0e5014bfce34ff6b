use crate::cohort::CohortTable;
use crate::config::AreaItems;
use crate::scoring::area::area_scores;
use crate::scoring::types::{AreaScores, GradeScores};
use tracing::debug;

/// Filters the cohort to one grade code and scores every mapped area.
///
/// Areas are visited in declared order. An area whose items resolve to no
/// column is left out of the result entirely.
pub fn grade_scores(
    cohort: &CohortTable,
    grade_column: &str,
    code: i64,
    areas: &[AreaItems],
    prefix: &str,
) -> GradeScores {
    let grade = cohort.filter_eq(grade_column, code);
    debug!(code, students = grade.row_count(), "Grade filtered");

    let areas = areas
        .iter()
        .filter_map(|area| match area_scores(&grade, &area.items, prefix) {
            Some(scores) => Some(AreaScores {
                name: area.name.clone(),
                scores,
            }),
            None => {
                debug!(area = %area.name, prefix, "No item columns resolved, area omitted");
                None
            }
        })
        .collect();

    GradeScores { areas }
}
