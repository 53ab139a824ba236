use normalizer::models::PullRequest;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergeLatency {
    pub number: i64,
    pub hours: f64,
}

/// Hours from creation to merge for every merged pull request, ordered by
/// number. Pull requests that never merged are excluded, not zeroed.
pub fn time_to_merge(pulls: &[PullRequest]) -> Vec<MergeLatency> {
    let mut rows: Vec<MergeLatency> = pulls
        .iter()
        .filter_map(|pull| {
            let elapsed = pull.time_to_merge()?;
            Some(MergeLatency {
                number: pull.number,
                hours: elapsed.num_seconds() as f64 / 3600.0,
            })
        })
        .collect();
    rows.sort_by_key(|row| row.number);
    rows
}
