mod model;
use log::{debug, info};

use std::collections::{HashMap, HashSet};

pub use crate::model::*;

/// Derives the group/series/title index from a flat record set.
///
/// Distinct values are collected in order of first appearance at every
/// level: groups over the whole set, series among the records of each
/// group, titles among the records of each (group, series) pair. No
/// sorting is applied anywhere, so the presentation order mirrors the
/// order of the source dataset. An empty record set yields an empty
/// hierarchy.
pub fn extract_hierarchy(records: &[EvaluationRecord]) -> JobHierarchy {
    let job_groups = distinct(records.iter().map(|r| r.job_group.as_str()));
    info!(
        "extract_hierarchy: {} records, {} groups",
        records.len(),
        job_groups.len()
    );

    let mut series_by_group: Vec<(String, Vec<String>)> = Vec::new();
    let mut titles_by_group_series: Vec<(String, Vec<String>)> = Vec::new();
    for group in job_groups.iter() {
        let series_in_group = distinct(
            records
                .iter()
                .filter(|r| r.job_group == *group)
                .map(|r| r.job_series.as_str()),
        );

        for series in series_in_group.iter() {
            let titles = distinct(
                records
                    .iter()
                    .filter(|r| r.job_group == *group && r.job_series == *series)
                    .map(|r| r.job_title.as_str()),
            );
            debug!(
                "extract_hierarchy: group {:?} series {:?}: {} titles",
                group,
                series,
                titles.len()
            );
            titles_by_group_series.push((format!("{}-{}", group, series), titles));
        }

        series_by_group.push((group.clone(), series_in_group));
    }

    JobHierarchy {
        job_groups,
        series_by_group,
        titles_by_group_series,
    }
}

/// Partitions the record set by composite job key and by rater name.
///
/// Both partitions cover the input exactly once and preserve the
/// original record order. Empty input yields empty partitions.
pub fn group_records(records: &[EvaluationRecord]) -> GroupedData {
    let by_job = partition_by(records, |r| r.job_key());
    let by_evaluator = partition_by(records, |r| r.rater.clone());
    info!(
        "group_records: {} records into {} jobs, {} evaluators",
        records.len(),
        by_job.len(),
        by_evaluator.len()
    );
    GroupedData {
        by_job,
        by_evaluator,
    }
}

/// Computes the per-category arithmetic means for one job's records.
///
/// Precondition: all records belong to the same job. The label is taken
/// from the first record and the rest are trusted to match, since the
/// caller obtains the list from [GroupedData::job]. This is only
/// checked with a debug assertion.
pub fn job_averages(job_records: &[EvaluationRecord]) -> Result<JobAverages, ScoringErrors> {
    let first = match job_records.first() {
        Some(r) => r,
        None => return Err(ScoringErrors::EmptyJobData),
    };
    let job_label = first.job_key();
    debug_assert!(
        job_records.iter().all(|r| r.job_key() == job_label),
        "job_averages: records with mixed job identities: {:?}",
        job_label
    );

    let n = job_records.len() as f64;
    let mut mean_by_category = [0.0; NUM_CATEGORIES];
    for r in job_records.iter() {
        for (idx, score) in r.scores.iter().enumerate() {
            mean_by_category[idx] += score;
        }
    }
    for mean in mean_by_category.iter_mut() {
        *mean /= n;
    }
    debug!(
        "job_averages: {:?}: {} records, means {:?}",
        job_label,
        job_records.len(),
        mean_by_category
    );

    Ok(JobAverages {
        job_label,
        mean_by_category,
    })
}

/// The distinct rater names of the dataset, in ascending order.
pub fn evaluators_sorted(records: &[EvaluationRecord]) -> Vec<String> {
    let mut res = distinct(records.iter().map(|r| r.rater.as_str()));
    res.sort();
    res
}

// Distinct values in first-appearance order.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut res: Vec<String> = Vec::new();
    for v in values {
        if seen.insert(v) {
            res.push(v.to_string());
        }
    }
    res
}

// Groups the records by the given key, keeping the keys in first-seen
// order and the records in input order within each bucket.
fn partition_by<F>(records: &[EvaluationRecord], key_of: F) -> Vec<(String, Vec<EvaluationRecord>)>
where
    F: Fn(&EvaluationRecord) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut res: Vec<(String, Vec<EvaluationRecord>)> = Vec::new();
    for r in records.iter() {
        let key = key_of(r);
        let idx = *index.entry(key.clone()).or_insert_with(|| {
            res.push((key, Vec::new()));
            res.len() - 1
        });
        res[idx].1.push(r.clone());
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(group: &str, series: &str, title: &str, rater: &str, c1: f64) -> EvaluationRecord {
        EvaluationRecord {
            job_group: group.to_string(),
            job_series: series.to_string(),
            job_title: title.to_string(),
            rater: rater.to_string(),
            scores: [c1, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0],
        }
    }

    fn sample() -> Vec<EvaluationRecord> {
        vec![
            record("개발", "백엔드", "시니어 개발자", "김평가", 2.0),
            record("개발", "백엔드", "시니어 개발자", "이평가", 4.0),
            record("개발", "프론트엔드", "주니어 개발자", "김평가", 5.0),
            record("경영지원", "인사", "채용 담당자", "박평가", 3.0),
            record("개발", "백엔드", "시니어 개발자", "박평가", 6.0),
        ]
    }

    #[test]
    fn hierarchy_keeps_first_seen_order() {
        let h = extract_hierarchy(&sample());
        assert_eq!(h.job_groups, vec!["개발", "경영지원"]);
        assert_eq!(
            h.series_in("개발").unwrap(),
            &["백엔드".to_string(), "프론트엔드".to_string()]
        );
        assert_eq!(
            h.titles_in("개발", "백엔드").unwrap(),
            &["시니어 개발자".to_string()]
        );
    }

    #[test]
    fn hierarchy_triples_are_all_present() {
        let records = sample();
        let h = extract_hierarchy(&records);
        for r in records.iter() {
            assert!(h.job_groups.contains(&r.job_group));
            assert!(h
                .series_in(&r.job_group)
                .unwrap()
                .contains(&r.job_series));
            assert!(h
                .titles_in(&r.job_group, &r.job_series)
                .unwrap()
                .contains(&r.job_title));
        }
    }

    #[test]
    fn hierarchy_of_empty_input_is_empty() {
        let h = extract_hierarchy(&[]);
        assert_eq!(h, JobHierarchy::default());
    }

    #[test]
    fn grouping_conserves_the_record_count() {
        let records = sample();
        let grouped = group_records(&records);
        let by_job_total: usize = grouped.by_job.iter().map(|(_, recs)| recs.len()).sum();
        let by_eval_total: usize = grouped
            .by_evaluator
            .iter()
            .map(|(_, recs)| recs.len())
            .sum();
        assert_eq!(by_job_total, records.len());
        assert_eq!(by_eval_total, records.len());
    }

    #[test]
    fn same_job_different_raters_share_one_job_partition() {
        let records = vec![
            record("개발", "백엔드", "시니어 개발자", "김평가", 2.0),
            record("개발", "백엔드", "시니어 개발자", "이평가", 4.0),
        ];
        let grouped = group_records(&records);
        assert_eq!(grouped.by_job.len(), 1);
        assert_eq!(grouped.job("개발-백엔드-시니어 개발자").unwrap().len(), 2);
        assert_eq!(grouped.by_evaluator.len(), 2);
        assert_eq!(grouped.evaluator("김평가").unwrap().len(), 1);
        assert_eq!(grouped.evaluator("이평가").unwrap().len(), 1);
    }

    #[test]
    fn grouping_preserves_record_order_within_a_job() {
        let records = sample();
        let grouped = group_records(&records);
        let job = grouped.job("개발-백엔드-시니어 개발자").unwrap();
        let raters: Vec<&str> = job.iter().map(|r| r.rater.as_str()).collect();
        assert_eq!(raters, vec!["김평가", "이평가", "박평가"]);
    }

    #[test]
    fn averages_of_a_three_rater_job() {
        let grouped = group_records(&sample());
        let job = grouped.job("개발-백엔드-시니어 개발자").unwrap();
        let avg = job_averages(job).unwrap();
        assert_eq!(avg.job_label, "개발-백엔드-시니어 개발자");
        // Category 1 was scored [2, 4, 6].
        assert_eq!(avg.mean_by_category[0], 4.0);
        assert_eq!(avg.mean_by_category[1], 3.0);
    }

    #[test]
    fn averages_on_empty_input_is_an_error() {
        assert_eq!(job_averages(&[]), Err(ScoringErrors::EmptyJobData));
    }

    #[test]
    fn derivation_is_idempotent() {
        let records = sample();
        assert_eq!(extract_hierarchy(&records), extract_hierarchy(&records));
        assert_eq!(group_records(&records), group_records(&records));
    }

    #[test]
    fn evaluator_roster_is_sorted() {
        assert_eq!(
            evaluators_sorted(&sample()),
            vec!["김평가", "박평가", "이평가"]
        );
    }

    #[test]
    fn structures_round_trip_through_json() {
        let records = sample();
        let h = extract_hierarchy(&records);
        let grouped = group_records(&records);

        let records2: Vec<EvaluationRecord> =
            serde_json::from_str(&serde_json::to_string(&records).unwrap()).unwrap();
        assert_eq!(records2, records);
        let h2: JobHierarchy = serde_json::from_str(&serde_json::to_string(&h).unwrap()).unwrap();
        assert_eq!(h2, h);
        let grouped2: GroupedData =
            serde_json::from_str(&serde_json::to_string(&grouped).unwrap()).unwrap();
        assert_eq!(grouped2, grouped);
    }
}
