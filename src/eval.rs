use log::{info, warn};

use job_scoring::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::eval::session::EvalSession;

pub mod io_excel;
pub mod session;

#[derive(Debug, Snafu)]
pub enum EvalError {
    #[snafu(display("only spreadsheet files (.xlsx, .xls) can be ingested: {path}"))]
    UnsupportedFileType { path: String },
    #[snafu(display("error opening spreadsheet {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("the spreadsheet contains no evaluation rows"))]
    EmptyDataset {},
    #[snafu(display("the following columns are missing: {columns}"))]
    MissingColumn { columns: String },
    #[snafu(display("row {lineno}: column {column:?} does not contain a number: {content:?}"))]
    InvalidNumericValue {
        lineno: u64,
        column: String,
        content: String,
    },
    #[snafu(display("no evaluation records for job {job:?}"))]
    EmptyJobData { source: ScoringErrors, job: String },
    #[snafu(display("error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("error parsing JSON content"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("error writing file {path}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type EvalResult<T> = Result<T, EvalError>;

/// Reads a spreadsheet and derives the full session state from it.
///
/// The session is assembled completely before being returned: on any
/// parse failure nothing is produced and a previously saved session
/// stays untouched.
pub fn ingest_file(path: &str) -> EvalResult<EvalSession> {
    check_extension(path)?;
    info!("Attempting to read evaluation file {:?}", path);
    let records = io_excel::read_excel_file(path.to_string())?;
    info!("ingest_file: parsed {} records", records.len());
    Ok(EvalSession::from_records(records))
}

// The extension gate runs before any parsing is attempted.
fn check_extension(path: &str) -> EvalResult<()> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("xlsx") | Some("xls") => Ok(()),
        _ => UnsupportedFileTypeSnafu { path }.fail(),
    }
}

fn averages_to_json(avg: &JobAverages, num_records: usize) -> JSValue {
    let mut means: JSMap<String, JSValue> = JSMap::new();
    for (label, mean) in CATEGORY_LABELS.iter().zip(avg.mean_by_category.iter()) {
        means.insert(label.to_string(), json!(mean));
    }
    json!({
        "job": avg.job_label,
        "records": num_records,
        "averages": means
    })
}

fn record_scores_json(record: &EvaluationRecord) -> JSValue {
    let mut scores: JSMap<String, JSValue> = JSMap::new();
    for (label, score) in CATEGORY_LABELS.iter().zip(record.scores.iter()) {
        scores.insert(label.to_string(), json!(score));
    }
    json!({
        "job": record.job_key(),
        "scores": scores
    })
}

// The per-job view: averages for one selected job only.
fn job_summary_js(session: &EvalSession, job_key: &str) -> EvalResult<JSValue> {
    let records = session.grouped.job(job_key).unwrap_or(&[]);
    let avg = job_averages(records).context(EmptyJobDataSnafu { job: job_key })?;
    Ok(averages_to_json(&avg, records.len()))
}

// The per-rater view: every score this rater handed out, in sheet order.
fn evaluator_summary_js(session: &EvalSession, name: &str) -> EvalResult<JSValue> {
    let records = match session.grouped.evaluator(name) {
        Some(records) => records,
        None => whatever!("unknown evaluator {:?}", name),
    };
    let scores: Vec<JSValue> = records.iter().map(record_scores_json).collect();
    Ok(json!({
        "evaluator": name,
        "records": records.len(),
        "scores": scores
    }))
}

// The overview: averages for every job plus the rater roster.
fn build_summary_js(session: &EvalSession) -> EvalResult<JSValue> {
    let mut jobs: Vec<JSValue> = Vec::new();
    for (key, records) in session.grouped.by_job.iter() {
        let avg = job_averages(records).context(EmptyJobDataSnafu { job: key.clone() })?;
        jobs.push(averages_to_json(&avg, records.len()));
    }
    Ok(json!({
        "records": session.records.len(),
        "jobs": jobs,
        "evaluators": evaluators_sorted(&session.records)
    }))
}

pub fn read_summary(path: String) -> EvalResult<JSValue> {
    let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

pub fn run_evaluation(args: &Args) -> EvalResult<()> {
    let session = match &args.input {
        Some(path) => {
            let session = ingest_file(path)?;
            // Only a fully parsed dataset may replace the saved state.
            if let Some(state_path) = &args.state {
                session.save(state_path)?;
                info!("run_evaluation: session saved to {:?}", state_path);
            }
            session
        }
        None => match &args.state {
            Some(state_path) => EvalSession::load(state_path)?,
            None => whatever!("nothing to do: pass a spreadsheet with --input or a saved session with --state"),
        },
    };
    info!(
        "run_evaluation: {} records, {} jobs, {} evaluators",
        session.records.len(),
        session.grouped.by_job.len(),
        session.grouped.by_evaluator.len()
    );

    let summary = if let Some(job_key) = &args.job {
        job_summary_js(&session, job_key)?
    } else if let Some(name) = &args.evaluator {
        evaluator_summary_js(&session, name)?
    } else {
        build_summary_js(&session)?
    };

    let pretty_js_summary = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;
    match args.out.as_deref() {
        Some("stdout") | None => println!("{}", pretty_js_summary),
        Some(out_path) => {
            fs::write(out_path, &pretty_js_summary).context(WritingJsonSnafu { path: out_path })?
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &args.reference {
        let summary_ref = read_summary(reference_path.clone())?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_summary {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_summary.as_str(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_gate_accepts_spreadsheets_only() {
        assert!(check_extension("scores.xlsx").is_ok());
        assert!(check_extension("scores.XLSX").is_ok());
        assert!(check_extension("legacy.xls").is_ok());
        assert!(matches!(
            check_extension("scores.csv"),
            Err(EvalError::UnsupportedFileType { .. })
        ));
        assert!(matches!(
            check_extension("scores"),
            Err(EvalError::UnsupportedFileType { .. })
        ));
    }

    #[test]
    fn unsupported_extension_is_reported_before_opening() {
        // The file does not exist. The extension gate must trip first.
        let res = ingest_file("/nonexistent/scores.txt");
        assert!(matches!(res, Err(EvalError::UnsupportedFileType { .. })));
    }

    #[test]
    fn selecting_an_absent_job_is_an_empty_job_error() {
        let session = EvalSession::from_records(vec![]);
        let res = job_summary_js(&session, "개발-백엔드-시니어 개발자");
        assert!(matches!(res, Err(EvalError::EmptyJobData { .. })));
    }
}
