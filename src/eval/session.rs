// The session holds one upload's worth of state: the parsed records and
// every structure derived from them. Storage is the caller's concern,
// the core only ever hands plain in-memory values around.

use serde::{Deserialize, Serialize};
use snafu::ResultExt;

use std::fs;

use job_scoring::{extract_hierarchy, group_records, EvaluationRecord, GroupedData, JobHierarchy};

use crate::eval::{EvalResult, OpeningJsonSnafu, ParsingJsonSnafu, WritingJsonSnafu};

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct EvalSession {
    pub records: Vec<EvaluationRecord>,
    pub hierarchy: JobHierarchy,
    pub grouped: GroupedData,
}

impl EvalSession {
    /// Derives the hierarchy and the groupings together with the record
    /// set, so a consumer never observes a record set paired with stale
    /// derived structures.
    pub fn from_records(records: Vec<EvaluationRecord>) -> EvalSession {
        let hierarchy = extract_hierarchy(&records);
        let grouped = group_records(&records);
        EvalSession {
            records,
            hierarchy,
            grouped,
        }
    }

    pub fn load(path: &str) -> EvalResult<EvalSession> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
        let session: EvalSession =
            serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        Ok(session)
    }

    pub fn save(&self, path: &str) -> EvalResult<()> {
        let contents = serde_json::to_string_pretty(self).context(ParsingJsonSnafu {})?;
        fs::write(path, contents).context(WritingJsonSnafu { path })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(group: &str, series: &str, title: &str, rater: &str) -> EvaluationRecord {
        EvaluationRecord {
            job_group: group.to_string(),
            job_series: series.to_string(),
            job_title: title.to_string(),
            rater: rater.to_string(),
            scores: [2.0, 3.0, 4.0, 5.0, 4.0, 3.0, 2.0, 1.0],
        }
    }

    #[test]
    fn derived_structures_are_built_together() {
        let session = EvalSession::from_records(vec![
            record("개발", "백엔드", "시니어 개발자", "김평가"),
            record("개발", "백엔드", "시니어 개발자", "이평가"),
        ]);
        assert_eq!(session.hierarchy.job_groups, vec!["개발"]);
        assert_eq!(session.grouped.by_job.len(), 1);
        assert_eq!(session.grouped.by_evaluator.len(), 2);
    }

    #[test]
    fn session_round_trips_through_a_file() {
        let session = EvalSession::from_records(vec![
            record("개발", "백엔드", "시니어 개발자", "김평가"),
            record("경영지원", "인사", "채용 담당자", "이평가"),
        ]);
        let path = std::env::temp_dir().join("jobeval_session_roundtrip.json");
        let path_str = path.to_str().unwrap();
        session.save(path_str).unwrap();
        let restored = EvalSession::load(path_str).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(restored, session);
    }

    #[test]
    fn loading_a_missing_session_fails() {
        let res = EvalSession::load("/nonexistent/jobeval_session.json");
        assert!(res.is_err());
    }
}
