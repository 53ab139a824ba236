use std::collections::HashSet;

use futures::TryStreamExt;
use normalizer::models::{PullRequest, ReviewEvent};
use normalizer::{normalize_review, ReviewPayload};
use tracing::debug;

use crate::client::GithubApi;
use crate::error::{CollectorError, CollectorKind};

/// Reviews live behind a per-pull endpoint, so this collector walks the
/// already-collected pull list. Pending (unsubmitted) reviews are skipped.
pub async fn collect_reviews(
    api: &dyn GithubApi,
    owner: &str,
    repo: &str,
    pulls: &[PullRequest],
) -> Result<Vec<ReviewEvent>, CollectorError> {
    let kind = CollectorKind::Reviews;
    let mut seen = HashSet::new();
    let mut events = Vec::new();

    for pull in pulls {
        let mut stream = api.list_pull_reviews(owner, repo, pull.number);
        while let Some(raw) = stream
            .try_next()
            .await
            .map_err(|err| CollectorError::new(kind, err))?
        {
            let payload: ReviewPayload =
                serde_json::from_value(raw).map_err(|err| CollectorError::new(kind, err))?;
            if !seen.insert(payload.id) {
                continue;
            }
            if let Some(event) = normalize_review(pull.number, &payload) {
                events.push(event);
            }
        }
    }

    debug!(owner, repo, count = events.len(), "collected review events");
    Ok(events)
}
