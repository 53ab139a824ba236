use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};
use normalizer::models::Commit;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekBucket {
    pub week_start: NaiveDate,
    pub commits: u64,
}

/// Commit counts bucketed by calendar week (Monday start), chronological,
/// with empty weeks inside the observed range present at count zero so the
/// series has no gaps.
pub fn weekly_commit_activity(commits: &[Commit]) -> Vec<WeekBucket> {
    let mut counts: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for commit in commits {
        let week = week_start(commit.committed_at.date_naive());
        *counts.entry(week).or_insert(0) += 1;
    }

    let (first, last) = match (counts.keys().next(), counts.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Vec::new(),
    };

    let mut series = Vec::new();
    let mut week = first;
    while week <= last {
        series.push(WeekBucket {
            week_start: week,
            commits: counts.get(&week).copied().unwrap_or(0),
        });
        week = week + Duration::days(7);
    }
    series
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorCount {
    pub author: String,
    pub commits: u64,
}

/// Descending by count; ties broken by identity ascending so the ordering
/// is reproducible run to run.
pub fn author_activity(commits: &[Commit]) -> Vec<AuthorCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for commit in commits {
        *counts.entry(commit.author.as_str()).or_insert(0) += 1;
    }

    let mut rows: Vec<AuthorCount> = counts
        .into_iter()
        .map(|(author, commits)| AuthorCount {
            author: author.to_string(),
            commits,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.commits
            .cmp(&a.commits)
            .then_with(|| a.author.cmp(&b.author))
    });
    rows
}
