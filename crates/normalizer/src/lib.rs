pub mod models;
pub mod payloads;
pub mod transform;

pub use crate::payloads::{
    CommentPayload, CommitPayload, IssuePayload, PullPayload, ReviewPayload, UserRef,
};
pub use crate::transform::{
    normalize_comment, normalize_commit, normalize_issue, normalize_pull, normalize_review,
    NormalizeError,
};
