use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorKind {
    Commits,
    PullRequests,
    Issues,
    Reviews,
    Comments,
}

impl CollectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorKind::Commits => "commits",
            CollectorKind::PullRequests => "pull_requests",
            CollectorKind::Issues => "issues",
            CollectorKind::Reviews => "reviews",
            CollectorKind::Comments => "comments",
        }
    }
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A collector failure aborts the whole run; no partial dataset is ever
/// presented as complete.
#[derive(Debug, thiserror::Error)]
#[error("{kind} collector failed: {source}")]
pub struct CollectorError {
    pub kind: CollectorKind,
    #[source]
    pub source: anyhow::Error,
}

impl CollectorError {
    pub fn new(kind: CollectorKind, source: impl Into<anyhow::Error>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }
}
