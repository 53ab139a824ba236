use std::collections::HashSet;

use futures::TryStreamExt;
use normalizer::models::PullRequest;
use normalizer::{normalize_pull, PullPayload};
use tracing::debug;

use crate::client::GithubApi;
use crate::error::{CollectorError, CollectorKind};

pub async fn collect_pulls(
    api: &dyn GithubApi,
    owner: &str,
    repo: &str,
) -> Result<Vec<PullRequest>, CollectorError> {
    let kind = CollectorKind::PullRequests;
    let mut stream = api.list_pulls(owner, repo);
    let mut seen = HashSet::new();
    let mut pulls = Vec::new();

    while let Some(raw) = stream
        .try_next()
        .await
        .map_err(|err| CollectorError::new(kind, err))?
    {
        let payload: PullPayload =
            serde_json::from_value(raw).map_err(|err| CollectorError::new(kind, err))?;
        if !seen.insert(payload.number) {
            continue;
        }
        pulls.push(normalize_pull(&payload));
    }

    debug!(owner, repo, count = pulls.len(), "collected pull requests");
    Ok(pulls)
}
