//! Cohort table loading from CSV exports and spreadsheets.
//!
//! Cells are coerced to numbers; anything that is not numeric (blank cells,
//! free text, spreadsheet error values) is stored as missing.

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Column-major table: one row per student, one column per header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortTable {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    columns: Vec<Vec<Option<f64>>>,
    rows: usize,
}

impl CohortTable {
    /// Builds a table from headers and row-major cells.
    ///
    /// Short rows are padded with missing cells; extra cells are ignored.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Self {
        let mut columns = vec![Vec::with_capacity(rows.len()); headers.len()];
        for row in &rows {
            for (i, column) in columns.iter_mut().enumerate() {
                column.push(row.get(i).copied().flatten());
            }
        }

        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .rev()
            .collect();

        CohortTable {
            headers,
            index,
            columns,
            rows: rows.len(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Cells of the column named exactly `name`.
    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.index.get(name).map(|&i| self.columns[i].as_slice())
    }

    /// Keeps the rows whose `column` cell equals `value`.
    ///
    /// A missing column matches nothing, so the result keeps every header but no rows.
    pub fn filter_eq(&self, column: &str, value: i64) -> CohortTable {
        let keep: Vec<usize> = match self.column(column) {
            Some(cells) => cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| **cell == Some(value as f64))
                .map(|(i, _)| i)
                .collect(),
            None => Vec::new(),
        };

        CohortTable {
            headers: self.headers.clone(),
            index: self.index.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| keep.iter().map(|&i| c[i]).collect())
                .collect(),
            rows: keep.len(),
        }
    }
}

/// Loads a cohort from `path`, choosing the reader by file extension.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or parsed.
pub fn load_cohort(path: &Path) -> Result<CohortTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let table = match ext.as_deref() {
        Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => read_workbook(path),
        _ => read_csv(path),
    }
    .with_context(|| format!("failed to load cohort from {}", path.display()))?;

    debug!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.headers().len(),
        "Cohort loaded"
    );
    Ok(table)
}

fn read_csv(path: &Path) -> Result<CohortTable> {
    let file = std::fs::File::open(path)?;
    parse_csv(file)
}

/// Parses UTF-8 CSV text with a header row. A leading byte-order mark is dropped.
pub fn parse_csv<R: std::io::Read>(reader: R) -> Result<CohortTable> {
    let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
            h.to_string()
        })
        .collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    Ok(CohortTable::from_rows(headers, rows))
}

fn read_workbook(path: &Path) -> Result<CohortTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("workbook has no worksheets"))??;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| c.to_string()).collect(),
        None => Vec::new(),
    };
    let body = rows.map(|r| r.iter().map(workbook_cell).collect()).collect();

    Ok(CohortTable::from_rows(headers, body))
}

fn workbook_cell(cell: &Data) -> Option<f64> {
    match cell {
        Data::Int(i) => Some(*i as f64),
        Data::Float(f) => Some(*f),
        Data::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => parse_cell(s),
        _ => None,
    }
}

/// Coerces a text cell to a number; blanks and free text become missing.
pub fn parse_cell(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw {
        "TRUE" | "True" | "true" => return Some(1.0),
        "FALSE" | "False" | "false" => return Some(0.0),
        _ => {}
    }
    raw.parse::<f64>().ok().filter(|v| !v.is_nan())
}
