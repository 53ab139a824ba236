use std::fs;
use std::path::{Path, PathBuf};

use analysis::{AuthorCount, Contributor, InteractionMatrix, MergeLatency, WeekBucket};
use chrono::{DateTime, SecondsFormat, Utc};
use normalizer::models::{Commit, CommentRecord, Issue, PullRequest, ReviewEvent};
use tracing::info;

use crate::csv::CsvBuilder;

pub const COMMITS_FILE: &str = "commits.csv";
pub const PULL_REQUESTS_FILE: &str = "pull_requests.csv";
pub const ISSUES_FILE: &str = "issues.csv";
pub const REVIEW_EVENTS_FILE: &str = "review_events.csv";
pub const REVIEW_COMMENTS_FILE: &str = "review_comments.csv";
pub const ISSUE_COMMENTS_FILE: &str = "issue_comments.csv";
pub const COMMENTS_FILE: &str = "comments.csv";
pub const CONTRIBUTORS_FILE: &str = "contributors.csv";
pub const COMMIT_ACTIVITY_FILE: &str = "commit_activity.csv";
pub const AUTHOR_ACTIVITY_FILE: &str = "author_activity.csv";
pub const TIME_TO_MERGE_FILE: &str = "time_to_merge.csv";
pub const INTERACTION_MATRIX_FILE: &str = "interaction_matrix.csv";

/// Downstream consumers locate tables by these names; renaming any of them
/// is a breaking change.
pub const DATASET_FILES: &[&str] = &[
    COMMITS_FILE,
    PULL_REQUESTS_FILE,
    ISSUES_FILE,
    REVIEW_EVENTS_FILE,
    REVIEW_COMMENTS_FILE,
    ISSUE_COMMENTS_FILE,
    COMMENTS_FILE,
    CONTRIBUTORS_FILE,
    COMMIT_ACTIVITY_FILE,
    AUTHOR_ACTIVITY_FILE,
    TIME_TO_MERGE_FILE,
    INTERACTION_MATRIX_FILE,
];

#[derive(Debug, thiserror::Error)]
#[error("cannot write dataset at {path}: {source}")]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Everything one run produced, normalized records and derived tables both.
#[derive(Debug, Clone, Default)]
pub struct RunDataset {
    pub commits: Vec<Commit>,
    pub pulls: Vec<PullRequest>,
    pub issues: Vec<Issue>,
    pub reviews: Vec<ReviewEvent>,
    pub review_comments: Vec<CommentRecord>,
    pub issue_comments: Vec<CommentRecord>,
    pub contributors: Vec<Contributor>,
    pub weekly_activity: Vec<WeekBucket>,
    pub author_activity: Vec<AuthorCount>,
    pub merge_latency: Vec<MergeLatency>,
    pub interactions: InteractionMatrix,
}

pub fn target_dir(output_root: &Path, owner: &str, repo: &str) -> PathBuf {
    output_root.join(slug(owner, repo))
}

pub fn staging_dir(output_root: &Path, owner: &str, repo: &str) -> PathBuf {
    output_root.join(format!("{}.staging", slug(owner, repo)))
}

fn slug(owner: &str, repo: &str) -> String {
    format!("{owner}__{repo}")
}

/// Writes one run's tables into a staging directory, then swaps the whole
/// directory over the previously promoted output. A run that dies before
/// `promote` leaves the promoted dataset untouched.
pub struct DatasetWriter {
    staging: PathBuf,
    target: PathBuf,
}

impl DatasetWriter {
    pub fn stage(output_root: &Path, owner: &str, repo: &str) -> Result<Self, WriteError> {
        let target = target_dir(output_root, owner, repo);
        let staging = staging_dir(output_root, owner, repo);
        if staging.exists() {
            remove_dir(&staging)?;
        }
        fs::create_dir_all(&staging).map_err(|source| WriteError {
            path: staging.clone(),
            source,
        })?;
        Ok(Self { staging, target })
    }

    pub fn write_all(&self, dataset: &RunDataset) -> Result<(), WriteError> {
        self.write_file(COMMITS_FILE, commits_table(&dataset.commits))?;
        self.write_file(PULL_REQUESTS_FILE, pulls_table(&dataset.pulls))?;
        self.write_file(ISSUES_FILE, issues_table(&dataset.issues))?;
        self.write_file(REVIEW_EVENTS_FILE, reviews_table(&dataset.reviews))?;
        self.write_file(
            REVIEW_COMMENTS_FILE,
            comments_table(&dataset.review_comments),
        )?;
        self.write_file(ISSUE_COMMENTS_FILE, comments_table(&dataset.issue_comments))?;
        self.write_file(
            COMMENTS_FILE,
            combined_comments_table(&dataset.review_comments, &dataset.issue_comments),
        )?;
        self.write_file(CONTRIBUTORS_FILE, contributors_table(&dataset.contributors))?;
        self.write_file(
            COMMIT_ACTIVITY_FILE,
            weekly_table(&dataset.weekly_activity),
        )?;
        self.write_file(
            AUTHOR_ACTIVITY_FILE,
            author_activity_table(&dataset.author_activity),
        )?;
        self.write_file(TIME_TO_MERGE_FILE, latency_table(&dataset.merge_latency))?;
        self.write_file(
            INTERACTION_MATRIX_FILE,
            matrix_table(&dataset.interactions),
        )?;
        Ok(())
    }

    pub fn promote(self) -> Result<PathBuf, WriteError> {
        if self.target.exists() {
            remove_dir(&self.target)?;
        }
        fs::rename(&self.staging, &self.target).map_err(|source| WriteError {
            path: self.target.clone(),
            source,
        })?;
        info!(path = %self.target.display(), "dataset promoted");
        Ok(self.target)
    }

    /// Best effort; a failed or timed-out run must not leave files a later
    /// run could mistake for its own staging.
    pub fn discard(self) {
        let _ = fs::remove_dir_all(&self.staging);
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    fn write_file(&self, name: &str, content: String) -> Result<(), WriteError> {
        let path = self.staging.join(name);
        fs::write(&path, content).map_err(|source| WriteError { path, source })
    }
}

fn remove_dir(path: &Path) -> Result<(), WriteError> {
    fs::remove_dir_all(path).map_err(|source| WriteError {
        path: path.to_path_buf(),
        source,
    })
}

fn stamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn opt_stamp(at: Option<DateTime<Utc>>) -> String {
    at.map(stamp).unwrap_or_default()
}

fn commits_table(commits: &[Commit]) -> String {
    let mut rows: Vec<&Commit> = commits.iter().collect();
    rows.sort_by(|a, b| {
        a.committed_at
            .cmp(&b.committed_at)
            .then_with(|| a.sha.cmp(&b.sha))
    });

    let mut table = CsvBuilder::new(&["sha", "author", "committed_at", "summary"]);
    for commit in rows {
        table.row([
            commit.sha.clone(),
            commit.author.clone(),
            stamp(commit.committed_at),
            commit.summary.clone(),
        ]);
    }
    table.finish()
}

fn pulls_table(pulls: &[PullRequest]) -> String {
    let mut rows: Vec<&PullRequest> = pulls.iter().collect();
    rows.sort_by_key(|pull| pull.number);

    let mut table = CsvBuilder::new(&[
        "number",
        "author",
        "state",
        "created_at",
        "merged_at",
        "closed_at",
    ]);
    for pull in rows {
        table.row([
            pull.number.to_string(),
            pull.author.clone(),
            pull.state.as_str().to_string(),
            stamp(pull.created_at),
            opt_stamp(pull.merged_at),
            opt_stamp(pull.closed_at),
        ]);
    }
    table.finish()
}

fn issues_table(issues: &[Issue]) -> String {
    let mut rows: Vec<&Issue> = issues.iter().collect();
    rows.sort_by_key(|issue| issue.number);

    let mut table = CsvBuilder::new(&["number", "author", "state", "created_at", "closed_at"]);
    for issue in rows {
        table.row([
            issue.number.to_string(),
            issue.author.clone(),
            issue.state.clone(),
            stamp(issue.created_at),
            opt_stamp(issue.closed_at),
        ]);
    }
    table.finish()
}

fn reviews_table(reviews: &[ReviewEvent]) -> String {
    let mut rows: Vec<&ReviewEvent> = reviews.iter().collect();
    rows.sort_by_key(|review| (review.pull_number, review.id));

    let mut table =
        CsvBuilder::new(&["id", "pull_number", "reviewer", "state", "submitted_at"]);
    for review in rows {
        table.row([
            review.id.to_string(),
            review.pull_number.to_string(),
            review.reviewer.clone(),
            review.state.as_str().to_string(),
            stamp(review.submitted_at),
        ]);
    }
    table.finish()
}

fn comments_table(comments: &[CommentRecord]) -> String {
    let mut table =
        CsvBuilder::new(&["id", "parent_number", "author", "created_at", "body_len"]);
    for comment in sorted_comments(comments) {
        table.row([
            comment.id.to_string(),
            comment.parent_number.to_string(),
            comment.author.clone(),
            stamp(comment.created_at),
            comment.body_len.to_string(),
        ]);
    }
    table.finish()
}

fn combined_comments_table(review: &[CommentRecord], issue: &[CommentRecord]) -> String {
    let mut table = CsvBuilder::new(&[
        "kind",
        "id",
        "parent_number",
        "author",
        "created_at",
        "body_len",
    ]);
    for comment in sorted_comments(review).into_iter().chain(sorted_comments(issue)) {
        table.row([
            comment.kind.as_str().to_string(),
            comment.id.to_string(),
            comment.parent_number.to_string(),
            comment.author.clone(),
            stamp(comment.created_at),
            comment.body_len.to_string(),
        ]);
    }
    table.finish()
}

fn sorted_comments(comments: &[CommentRecord]) -> Vec<&CommentRecord> {
    let mut rows: Vec<&CommentRecord> = comments.iter().collect();
    rows.sort_by_key(|comment| comment.id);
    rows
}

fn contributors_table(contributors: &[Contributor]) -> String {
    let mut table = CsvBuilder::new(&["identity", "commits", "pull_requests", "reviews"]);
    for contributor in contributors {
        table.row([
            contributor.identity.clone(),
            contributor.commits.to_string(),
            contributor.pull_requests.to_string(),
            contributor.reviews.to_string(),
        ]);
    }
    table.finish()
}

fn weekly_table(weeks: &[WeekBucket]) -> String {
    let mut table = CsvBuilder::new(&["week_start", "commits"]);
    for week in weeks {
        table.row([week.week_start.to_string(), week.commits.to_string()]);
    }
    table.finish()
}

fn author_activity_table(rows: &[AuthorCount]) -> String {
    let mut table = CsvBuilder::new(&["author", "commits"]);
    for row in rows {
        table.row([row.author.clone(), row.commits.to_string()]);
    }
    table.finish()
}

fn latency_table(rows: &[MergeLatency]) -> String {
    let mut table = CsvBuilder::new(&["number", "hours"]);
    for row in rows {
        table.row([row.number.to_string(), row.hours.to_string()]);
    }
    table.finish()
}

fn matrix_table(matrix: &InteractionMatrix) -> String {
    let mut header: Vec<&str> = vec!["reviewer"];
    header.extend(matrix.identities.iter().map(String::as_str));

    let mut table = CsvBuilder::new(&header);
    for (row_index, reviewer) in matrix.identities.iter().enumerate() {
        let mut cells = Vec::with_capacity(matrix.identities.len() + 1);
        cells.push(reviewer.clone());
        cells.extend(matrix.counts[row_index].iter().map(u64::to_string));
        table.row(cells);
    }
    table.finish()
}
