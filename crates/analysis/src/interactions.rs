use std::collections::{BTreeSet, HashMap};

use normalizer::models::{PullRequest, ReviewEvent};
use serde::Serialize;

/// Dense reviewer×author count matrix. Both axes carry the same
/// alphabetically ordered identity union so downstream rendering can read
/// it without reindexing, and so two runs over the same input diff cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InteractionMatrix {
    pub identities: Vec<String>,
    pub counts: Vec<Vec<u64>>,
}

impl InteractionMatrix {
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn count(&self, reviewer: &str, author: &str) -> Option<u64> {
        let row = self.identities.iter().position(|id| id == reviewer)?;
        let col = self.identities.iter().position(|id| id == author)?;
        Some(self.counts[row][col])
    }
}

pub fn interaction_matrix(pulls: &[PullRequest], reviews: &[ReviewEvent]) -> InteractionMatrix {
    let author_by_pull: HashMap<i64, &str> = pulls
        .iter()
        .map(|pull| (pull.number, pull.author.as_str()))
        .collect();

    let mut union: BTreeSet<&str> = pulls.iter().map(|pull| pull.author.as_str()).collect();
    union.extend(reviews.iter().map(|review| review.reviewer.as_str()));

    let identities: Vec<String> = union.iter().map(|id| id.to_string()).collect();
    let index: HashMap<&str, usize> = identities
        .iter()
        .enumerate()
        .map(|(position, id)| (id.as_str(), position))
        .collect();

    let mut counts = vec![vec![0u64; identities.len()]; identities.len()];
    for review in reviews {
        if let Some(author) = author_by_pull.get(&review.pull_number) {
            counts[index[review.reviewer.as_str()]][index[author]] += 1;
        }
    }

    InteractionMatrix { identities, counts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use normalizer::models::{PullState, ReviewState};

    fn pull(number: i64, author: &str) -> PullRequest {
        PullRequest {
            number,
            author: author.into(),
            state: PullState::Open,
            created_at: "2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap(),
            merged_at: None,
            closed_at: None,
        }
    }

    fn review(id: i64, pull_number: i64, reviewer: &str) -> ReviewEvent {
        ReviewEvent {
            id,
            pull_number,
            reviewer: reviewer.into(),
            state: ReviewState::Approved,
            submitted_at: "2024-01-02T00:00:00Z".parse::<DateTime<Utc>>().unwrap(),
        }
    }

    #[test]
    fn matrix_is_square_complete_over_the_identity_union() {
        let pulls = vec![pull(1, "bob"), pull(2, "carol")];
        let reviews = vec![review(1, 1, "alice"), review(2, 1, "alice")];

        let matrix = interaction_matrix(&pulls, &reviews);
        assert_eq!(matrix.identities, vec!["alice", "bob", "carol"]);
        assert_eq!(matrix.count("alice", "bob"), Some(2));
        // Never-reviewed pairs are present at zero, not absent.
        assert_eq!(matrix.count("alice", "carol"), Some(0));
        assert_eq!(matrix.count("bob", "alice"), Some(0));
    }

    #[test]
    fn zero_reviews_still_covers_all_authors() {
        let pulls = vec![pull(1, "bob")];
        let matrix = interaction_matrix(&pulls, &[]);
        assert_eq!(matrix.identities, vec!["bob"]);
        assert_eq!(matrix.counts, vec![vec![0]]);
    }

    #[test]
    fn no_authors_and_no_reviewers_is_an_empty_matrix() {
        let matrix = interaction_matrix(&[], &[]);
        assert!(matrix.is_empty());
        assert!(matrix.counts.is_empty());
    }

    #[test]
    fn ordering_is_alphabetical_and_stable() {
        let pulls = vec![pull(1, "zed"), pull(2, "amy")];
        let reviews = vec![review(1, 1, "mia")];
        let matrix = interaction_matrix(&pulls, &reviews);
        assert_eq!(matrix.identities, vec!["amy", "mia", "zed"]);
    }
}
