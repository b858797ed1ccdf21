// Primitives for reading evaluation spreadsheets.

use log::debug;

use calamine::{open_workbook_auto, DataType, Reader};
use snafu::{ensure, OptionExt, ResultExt};

use job_scoring::{EvaluationRecord, CATEGORY_LABELS, NUM_CATEGORIES};

use crate::eval::*;

/// The identity columns of an evaluation sheet, in record field order.
pub const IDENTITY_COLUMNS: [&str; 4] = ["직군", "직렬", "직무", "평가자"];

const EMPTY_CELL: DataType = DataType::Empty;

/// Reads the first worksheet of the given workbook into evaluation
/// records. The input file is only read, never modified.
pub fn read_excel_file(path: String) -> EvalResult<Vec<EvaluationRecord>> {
    let p = path.clone();
    let mut workbook = open_workbook_auto(p).context(OpeningExcelSnafu { path: path.clone() })?;
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyDatasetSnafu {})?
        .context(OpeningExcelSnafu { path })?;

    let mut rows = wrange.rows();
    let header = rows.next().context(EmptyDatasetSnafu {})?;
    debug!("read_excel_file: header: {:?}", header);
    let data_rows: Vec<&[DataType]> = rows.collect();
    parse_rows(header, &data_rows)
}

/// Converts raw worksheet rows into validated records.
///
/// Column presence is validated once against the header; the rows below
/// are assumed to follow the same layout. A short row reads as empty
/// cells, which the per-cell coercion below still checks.
pub fn parse_rows(header: &[DataType], rows: &[&[DataType]]) -> EvalResult<Vec<EvaluationRecord>> {
    ensure!(!rows.is_empty(), EmptyDatasetSnafu);
    let layout = resolve_columns(header)?;

    let mut res: Vec<EvaluationRecord> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        // 1-based row number in the sheet, accounting for the header.
        let lineno = (idx + 2) as u64;
        debug!("parse_rows: lineno: {:?} row: {:?}", lineno, row);
        res.push(record_from_row(&layout, row, lineno)?);
    }
    Ok(res)
}

// Positions of the required columns in the header row.
struct ColumnLayout {
    identity: [usize; IDENTITY_COLUMNS.len()],
    categories: [usize; NUM_CATEGORIES],
}

fn resolve_columns(header: &[DataType]) -> EvalResult<ColumnLayout> {
    let names: Vec<String> = header.iter().map(identity_cell).collect();
    let position = |label: &str| names.iter().position(|n| n == label);

    let missing: Vec<&str> = IDENTITY_COLUMNS
        .iter()
        .chain(CATEGORY_LABELS.iter())
        .copied()
        .filter(|label| position(label).is_none())
        .collect();
    ensure!(
        missing.is_empty(),
        MissingColumnSnafu {
            columns: missing.join(", ")
        }
    );

    let mut identity = [0usize; IDENTITY_COLUMNS.len()];
    for (slot, label) in identity.iter_mut().zip(IDENTITY_COLUMNS.iter()) {
        if let Some(pos) = position(label) {
            *slot = pos;
        }
    }
    let mut categories = [0usize; NUM_CATEGORIES];
    for (slot, label) in categories.iter_mut().zip(CATEGORY_LABELS.iter()) {
        if let Some(pos) = position(label) {
            *slot = pos;
        }
    }
    Ok(ColumnLayout {
        identity,
        categories,
    })
}

fn record_from_row(
    layout: &ColumnLayout,
    row: &[DataType],
    lineno: u64,
) -> EvalResult<EvaluationRecord> {
    let cell = |idx: usize| row.get(idx).unwrap_or(&EMPTY_CELL);

    let mut scores = [0.0; NUM_CATEGORIES];
    for ((slot, idx), label) in scores
        .iter_mut()
        .zip(layout.categories.iter())
        .zip(CATEGORY_LABELS.iter())
    {
        *slot = numeric_cell(cell(*idx), label, lineno)?;
    }

    Ok(EvaluationRecord {
        job_group: identity_cell(cell(layout.identity[0])),
        job_series: identity_cell(cell(layout.identity[1])),
        job_title: identity_cell(cell(layout.identity[2])),
        rater: identity_cell(cell(layout.identity[3])),
        scores,
    })
}

// Identity cells are coerced to strings. A blank or unreadable cell
// becomes the empty string, which is not a rejection cause.
fn identity_cell(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Int(i) => i.to_string(),
        DataType::Bool(b) => b.to_string(),
        _ => "".to_string(),
    }
}

// Category cells are coerced to finite numbers. A blank cell counts as
// zero, indistinguishable from a rater entering 0.
fn numeric_cell(cell: &DataType, column: &str, lineno: u64) -> EvalResult<f64> {
    match cell {
        DataType::Float(f) => Ok(*f),
        DataType::Int(i) => Ok(*i as f64),
        DataType::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        DataType::Empty => Ok(0.0),
        DataType::String(s) if s.trim().is_empty() => Ok(0.0),
        DataType::String(s) => match s.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(x),
            _ => InvalidNumericValueSnafu {
                lineno,
                column,
                content: s.clone(),
            }
            .fail(),
        },
        other => InvalidNumericValueSnafu {
            lineno,
            column,
            content: format!("{:?}", other),
        }
        .fail(),
    }
}
