use crate::cohort::CohortTable;

/// Column name for an item: the prefix followed by the two-digit item number.
pub fn item_column(prefix: &str, item: u32) -> String {
    format!("{prefix}{item:02}")
}

/// Computes each student's fraction correct across an area's items.
///
/// Item columns are resolved by exact name and unknown items are skipped.
/// Returns `None` when none of the items resolve to a column. Each row is
/// averaged over its non-missing cells; rows with no present cell are dropped.
pub fn area_scores(table: &CohortTable, items: &[u32], prefix: &str) -> Option<Vec<f64>> {
    let columns: Vec<&[Option<f64>]> = items
        .iter()
        .filter_map(|&n| table.column(&item_column(prefix, n)))
        .collect();

    if columns.is_empty() {
        return None;
    }

    let scores = (0..table.row_count())
        .filter_map(|row| {
            let (sum, count) = columns
                .iter()
                .filter_map(|c| c[row])
                .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            (count > 0).then(|| sum / count as f64)
        })
        .collect();

    Some(scores)
}
