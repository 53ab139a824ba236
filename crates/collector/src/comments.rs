use std::collections::HashSet;

use futures::stream::BoxStream;
use futures::TryStreamExt;
use gh_client::FetchError;
use normalizer::models::{CommentKind, CommentRecord};
use normalizer::{normalize_comment, CommentPayload};
use serde_json::Value;
use tracing::debug;

use crate::client::GithubApi;
use crate::error::{CollectorError, CollectorKind};

pub async fn collect_review_comments(
    api: &dyn GithubApi,
    owner: &str,
    repo: &str,
) -> Result<Vec<CommentRecord>, CollectorError> {
    let comments = drain_comments(api.list_review_comments(owner, repo), CommentKind::Review).await?;
    debug!(owner, repo, count = comments.len(), "collected review comments");
    Ok(comments)
}

pub async fn collect_issue_comments(
    api: &dyn GithubApi,
    owner: &str,
    repo: &str,
) -> Result<Vec<CommentRecord>, CollectorError> {
    let comments = drain_comments(api.list_issue_comments(owner, repo), CommentKind::Issue).await?;
    debug!(owner, repo, count = comments.len(), "collected issue comments");
    Ok(comments)
}

async fn drain_comments(
    mut stream: BoxStream<'static, Result<Value, FetchError>>,
    kind: CommentKind,
) -> Result<Vec<CommentRecord>, CollectorError> {
    let err_kind = CollectorKind::Comments;
    let mut seen = HashSet::new();
    let mut comments = Vec::new();

    while let Some(raw) = stream
        .try_next()
        .await
        .map_err(|err| CollectorError::new(err_kind, err))?
    {
        let payload: CommentPayload =
            serde_json::from_value(raw).map_err(|err| CollectorError::new(err_kind, err))?;
        if !seen.insert(payload.id) {
            continue;
        }
        let comment =
            normalize_comment(kind, &payload).map_err(|err| CollectorError::new(err_kind, err))?;
        comments.push(comment);
    }

    Ok(comments)
}
