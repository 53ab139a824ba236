use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitPayload {
    pub sha: String,
    pub commit: CommitDetail,
    /// The linked account; null when the commit email matches no user.
    pub author: Option<UserRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub author: Option<GitSignature>,
    pub committer: Option<GitSignature>,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitSignature {
    pub name: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullPayload {
    pub number: i64,
    pub user: Option<UserRef>,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub merged_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssuePayload {
    pub number: i64,
    /// Present when the host's issue listing conflates pull requests in.
    pub pull_request: Option<serde_json::Value>,
    pub state: String,
    pub user: Option<UserRef>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewPayload {
    pub id: i64,
    pub user: Option<UserRef>,
    pub state: String,
    /// Null while a review is still pending submission.
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentPayload {
    pub id: i64,
    pub user: Option<UserRef>,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub pull_request_url: Option<String>,
    pub issue_url: Option<String>,
}
