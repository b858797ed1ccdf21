// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The number of scored categories on an evaluation sheet.
pub const NUM_CATEGORIES: usize = 8;

/// The display labels of the categories, in the order they are stored in
/// [EvaluationRecord::scores].
pub const CATEGORY_LABELS: [&str; NUM_CATEGORIES] = [
    "요구지식",
    "복잡성",
    "글로벌",
    "문제해결",
    "의사소통",
    "혁신",
    "전략적영향력",
    "스킬희소성",
];

/// One rater's scoring of one job.
///
/// The identity fields may be empty strings (a blank cell in the source
/// sheet is not a rejection cause). The scores are guaranteed finite by
/// the parser. Records are immutable once built: a new upload replaces
/// the whole collection.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    #[serde(rename = "jobGroup")]
    pub job_group: String,
    #[serde(rename = "jobSeries")]
    pub job_series: String,
    #[serde(rename = "jobTitle")]
    pub job_title: String,
    pub rater: String,
    /// Index 0 holds category 1.
    pub scores: [f64; NUM_CATEGORIES],
}

impl EvaluationRecord {
    /// The composite key identifying the job scored by this record.
    pub fn job_key(&self) -> String {
        job_key(&self.job_group, &self.job_series, &self.job_title)
    }
}

/// Builds the `"<group>-<series>-<title>"` composite key.
///
/// Caveat: an identity field containing `-` can collide with another
/// logically distinct job. Consumers rely on this exact separator and
/// field order for lookups, so the scheme is kept as-is.
pub fn job_key(group: &str, series: &str, title: &str) -> String {
    format!("{}-{}-{}", group, series, title)
}

// ******** Output data structures *********

/// The three-level group/series/title index derived from a record set.
///
/// Ordered association lists are used instead of hash maps so that the
/// first-appearance order of the dataset survives a JSON round-trip.
/// The hierarchy is rebuilt from scratch whenever the record set
/// changes, never patched incrementally.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobHierarchy {
    #[serde(rename = "jobGroups")]
    pub job_groups: Vec<String>,
    /// Distinct series under each group, keyed by group name.
    #[serde(rename = "jobSeriesByGroup")]
    pub series_by_group: Vec<(String, Vec<String>)>,
    /// Distinct titles under each (group, series) pair, keyed by the
    /// `"<group>-<series>"` composite.
    #[serde(rename = "jobTitlesByGroupSeries")]
    pub titles_by_group_series: Vec<(String, Vec<String>)>,
}

impl JobHierarchy {
    pub fn series_in(&self, group: &str) -> Option<&[String]> {
        self.series_by_group
            .iter()
            .find(|(g, _)| g == group)
            .map(|(_, s)| s.as_slice())
    }

    pub fn titles_in(&self, group: &str, series: &str) -> Option<&[String]> {
        let key = format!("{}-{}", group, series);
        self.titles_by_group_series
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, t)| t.as_slice())
    }
}

/// Two independent partitions of the same record set.
///
/// Each record lands in exactly one job partition and exactly one
/// evaluator partition; no record is dropped or duplicated. Keys appear
/// in first-seen order and the original record order is preserved
/// within each partition.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupedData {
    #[serde(rename = "byJob")]
    pub by_job: Vec<(String, Vec<EvaluationRecord>)>,
    #[serde(rename = "byEvaluator")]
    pub by_evaluator: Vec<(String, Vec<EvaluationRecord>)>,
}

impl GroupedData {
    /// The records for one job, keyed by the composite job key.
    pub fn job(&self, key: &str) -> Option<&[EvaluationRecord]> {
        self.by_job
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, recs)| recs.as_slice())
    }

    /// The records scored by one rater.
    pub fn evaluator(&self, name: &str) -> Option<&[EvaluationRecord]> {
        self.by_evaluator
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, recs)| recs.as_slice())
    }
}

/// Per-category arithmetic means for one job.
///
/// No rounding is applied here: rounding for display is the
/// presentation layer's concern.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct JobAverages {
    #[serde(rename = "jobLabel")]
    pub job_label: String,
    /// Index 0 holds the mean of category 1.
    #[serde(rename = "meanByCategory")]
    pub mean_by_category: [f64; NUM_CATEGORIES],
}

/// Errors that prevent an aggregation from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ScoringErrors {
    /// Aggregation was requested on an empty record list. This is a
    /// precondition violation by the caller, not a recoverable state.
    EmptyJobData,
}

impl Error for ScoringErrors {}

impl Display for ScoringErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringErrors::EmptyJobData => write!(f, "no records for the requested job"),
        }
    }
}
