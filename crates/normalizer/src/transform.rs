use crate::models::{
    Commit, CommentKind, CommentRecord, Issue, PullRequest, PullState, ReviewEvent, ReviewState,
    GHOST_AUTHOR,
};
use crate::payloads::{CommentPayload, CommitPayload, IssuePayload, PullPayload, ReviewPayload, UserRef};

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("commit {sha} carries no usable timestamp")]
    MissingTimestamp { sha: String },
    #[error("comment {id} has no parsable parent reference: {url:?}")]
    BadParentRef { id: i64, url: Option<String> },
}

pub fn normalize_commit(payload: &CommitPayload) -> Result<Commit, NormalizeError> {
    let signature = payload
        .commit
        .author
        .as_ref()
        .or(payload.commit.committer.as_ref());
    let committed_at = signature
        .and_then(|sig| sig.date)
        .ok_or_else(|| NormalizeError::MissingTimestamp {
            sha: payload.sha.clone(),
        })?;
    let author = payload
        .author
        .as_ref()
        .map(|user| user.login.clone())
        .or_else(|| signature.and_then(|sig| sig.name.clone()))
        .unwrap_or_else(|| GHOST_AUTHOR.to_string());
    let summary = payload
        .commit
        .message
        .lines()
        .next()
        .unwrap_or_default()
        .to_string();

    Ok(Commit {
        sha: payload.sha.clone(),
        author,
        committed_at,
        summary,
    })
}

pub fn normalize_pull(payload: &PullPayload) -> PullRequest {
    // A non-null merge timestamp wins over the open/closed state string.
    let state = if payload.merged_at.is_some() {
        PullState::Merged
    } else if payload.state == "open" {
        PullState::Open
    } else {
        PullState::Closed
    };

    PullRequest {
        number: payload.number,
        author: author_of(&payload.user),
        state,
        created_at: payload.created_at,
        merged_at: payload.merged_at,
        closed_at: payload.closed_at,
    }
}

pub fn normalize_issue(payload: &IssuePayload) -> Issue {
    Issue {
        number: payload.number,
        author: author_of(&payload.user),
        state: payload.state.clone(),
        created_at: payload.created_at,
        closed_at: payload.closed_at,
    }
}

/// Pending reviews carry no submission timestamp and are not events yet.
pub fn normalize_review(pull_number: i64, payload: &ReviewPayload) -> Option<ReviewEvent> {
    let submitted_at = payload.submitted_at?;
    let state = match payload.state.as_str() {
        "APPROVED" => ReviewState::Approved,
        "CHANGES_REQUESTED" => ReviewState::ChangesRequested,
        _ => ReviewState::Commented,
    };

    Some(ReviewEvent {
        id: payload.id,
        pull_number,
        reviewer: author_of(&payload.user),
        state,
        submitted_at,
    })
}

pub fn normalize_comment(
    kind: CommentKind,
    payload: &CommentPayload,
) -> Result<CommentRecord, NormalizeError> {
    let parent_url = match kind {
        CommentKind::Review => &payload.pull_request_url,
        CommentKind::Issue => &payload.issue_url,
    };
    let parent_number = parent_url
        .as_deref()
        .and_then(trailing_number)
        .ok_or_else(|| NormalizeError::BadParentRef {
            id: payload.id,
            url: parent_url.clone(),
        })?;

    Ok(CommentRecord {
        id: payload.id,
        kind,
        parent_number,
        author: author_of(&payload.user),
        created_at: payload.created_at,
        body_len: payload
            .body
            .as_deref()
            .map(|body| body.chars().count())
            .unwrap_or(0),
    })
}

fn author_of(user: &Option<UserRef>) -> String {
    user.as_ref()
        .map(|user| user.login.clone())
        .unwrap_or_else(|| GHOST_AUTHOR.to_string())
}

fn trailing_number(url: &str) -> Option<i64> {
    url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}
