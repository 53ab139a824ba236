use std::collections::HashSet;

use futures::TryStreamExt;
use normalizer::models::Issue;
use normalizer::{normalize_issue, IssuePayload};
use tracing::debug;

use crate::client::GithubApi;
use crate::error::{CollectorError, CollectorKind};

/// The host's issue listing conflates pull requests into the same
/// numbering space; anything carrying a PR linkage is dropped here so
/// contributor aggregates never double count.
pub async fn collect_issues(
    api: &dyn GithubApi,
    owner: &str,
    repo: &str,
) -> Result<Vec<Issue>, CollectorError> {
    let kind = CollectorKind::Issues;
    let mut stream = api.list_issues(owner, repo);
    let mut seen = HashSet::new();
    let mut issues = Vec::new();
    let mut skipped_pulls = 0usize;

    while let Some(raw) = stream
        .try_next()
        .await
        .map_err(|err| CollectorError::new(kind, err))?
    {
        let payload: IssuePayload =
            serde_json::from_value(raw).map_err(|err| CollectorError::new(kind, err))?;
        if payload.pull_request.is_some() {
            skipped_pulls += 1;
            continue;
        }
        if !seen.insert(payload.number) {
            continue;
        }
        issues.push(normalize_issue(&payload));
    }

    debug!(
        owner,
        repo,
        count = issues.len(),
        skipped_pulls,
        "collected issues"
    );
    Ok(issues)
}
