pub mod client;
pub mod comments;
pub mod commits;
pub mod error;
pub mod issues;
pub mod pulls;
pub mod reviews;

pub use crate::client::{GithubApi, RestGithubApi};
pub use crate::comments::{collect_issue_comments, collect_review_comments};
pub use crate::commits::collect_commits;
pub use crate::error::{CollectorError, CollectorKind};
pub use crate::issues::collect_issues;
pub use crate::pulls::collect_pulls;
pub use crate::reviews::collect_reviews;
