use std::collections::HashSet;

use futures::TryStreamExt;
use normalizer::models::Commit;
use normalizer::{normalize_commit, CommitPayload};
use tracing::debug;

use crate::client::GithubApi;
use crate::error::{CollectorError, CollectorKind};

/// Pages can overlap when the client restarts after a retry; the sha is
/// the dedup key, never the array position.
pub async fn collect_commits(
    api: &dyn GithubApi,
    owner: &str,
    repo: &str,
) -> Result<Vec<Commit>, CollectorError> {
    let kind = CollectorKind::Commits;
    let mut stream = api.list_commits(owner, repo);
    let mut seen = HashSet::new();
    let mut commits = Vec::new();

    while let Some(raw) = stream
        .try_next()
        .await
        .map_err(|err| CollectorError::new(kind, err))?
    {
        let payload: CommitPayload =
            serde_json::from_value(raw).map_err(|err| CollectorError::new(kind, err))?;
        if !seen.insert(payload.sha.clone()) {
            continue;
        }
        let commit = normalize_commit(&payload).map_err(|err| CollectorError::new(kind, err))?;
        commits.push(commit);
    }

    debug!(owner, repo, count = commits.len(), "collected commits");
    Ok(commits)
}
