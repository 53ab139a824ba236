use std::collections::BTreeMap;

use normalizer::models::{Commit, PullRequest, ReviewEvent};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contributor {
    pub identity: String,
    pub commits: u64,
    pub pull_requests: u64,
    pub reviews: u64,
}

/// Per-identity totals across the three event kinds, ordered by commit
/// count descending then identity ascending.
pub fn contributors(
    commits: &[Commit],
    pulls: &[PullRequest],
    reviews: &[ReviewEvent],
) -> Vec<Contributor> {
    let mut totals: BTreeMap<&str, Contributor> = BTreeMap::new();

    for commit in commits {
        entry(&mut totals, &commit.author).commits += 1;
    }
    for pull in pulls {
        entry(&mut totals, &pull.author).pull_requests += 1;
    }
    for review in reviews {
        entry(&mut totals, &review.reviewer).reviews += 1;
    }

    let mut rows: Vec<Contributor> = totals.into_values().collect();
    rows.sort_by(|a, b| {
        b.commits
            .cmp(&a.commits)
            .then_with(|| a.identity.cmp(&b.identity))
    });
    rows
}

fn entry<'a, 'b>(
    totals: &'a mut BTreeMap<&'b str, Contributor>,
    identity: &'b str,
) -> &'a mut Contributor {
    totals.entry(identity).or_insert_with(|| Contributor {
        identity: identity.to_string(),
        commits: 0,
        pull_requests: 0,
        reviews: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use normalizer::models::{PullState, ReviewState};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn totals_span_all_three_event_kinds() {
        let commits = vec![
            Commit {
                sha: "a".into(),
                author: "amy".into(),
                committed_at: at("2024-01-01T00:00:00Z"),
                summary: "one".into(),
            },
            Commit {
                sha: "b".into(),
                author: "amy".into(),
                committed_at: at("2024-01-02T00:00:00Z"),
                summary: "two".into(),
            },
        ];
        let pulls = vec![PullRequest {
            number: 1,
            author: "amy".into(),
            state: PullState::Open,
            created_at: at("2024-01-03T00:00:00Z"),
            merged_at: None,
            closed_at: None,
        }];
        let reviews = vec![ReviewEvent {
            id: 1,
            pull_number: 1,
            reviewer: "zed".into(),
            state: ReviewState::Commented,
            submitted_at: at("2024-01-04T00:00:00Z"),
        }];

        let rows = contributors(&commits, &pulls, &reviews);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].identity, "amy");
        assert_eq!(rows[0].commits, 2);
        assert_eq!(rows[0].pull_requests, 1);
        assert_eq!(rows[0].reviews, 0);
        assert_eq!(rows[1].identity, "zed");
        assert_eq!(rows[1].reviews, 1);
    }

    #[test]
    fn empty_inputs_produce_an_empty_table() {
        assert!(contributors(&[], &[], &[]).is_empty());
    }
}
