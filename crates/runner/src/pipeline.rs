use std::path::PathBuf;
use std::sync::Arc;

use analysis::{
    author_activity, contributors, interaction_matrix, time_to_merge, weekly_commit_activity,
};
use collector::{
    collect_commits, collect_issue_comments, collect_issues, collect_pulls,
    collect_review_comments, collect_reviews, GithubApi,
};
use dataset::{DatasetWriter, RunDataset};
use tracing::instrument;

use crate::context::RunContext;
use crate::error::RunError;

/// One batch job: collect, aggregate, write, promote. Data flows one way;
/// nothing here survives past the run.
#[instrument(skip_all, fields(owner = %ctx.owner, repo = %ctx.repo))]
pub async fn execute(
    ctx: RunContext,
    api: Arc<dyn GithubApi>,
    output_root: PathBuf,
) -> Result<(), RunError> {
    let owner = ctx.owner.as_str();
    let repo = ctx.repo.as_str();

    // Independent event streams; pagination inside each stays sequential.
    let (commits, pulls, issues) = tokio::try_join!(
        collect_commits(api.as_ref(), owner, repo),
        collect_pulls(api.as_ref(), owner, repo),
        collect_issues(api.as_ref(), owner, repo),
    )?;
    ctx.log(format!(
        "collected {} commits, {} pull requests, {} issues",
        commits.len(),
        pulls.len(),
        issues.len()
    ));

    // Reviews hang off individual pulls, so they follow the pull list.
    let reviews = collect_reviews(api.as_ref(), owner, repo, &pulls).await?;
    let (review_comments, issue_comments) = tokio::try_join!(
        collect_review_comments(api.as_ref(), owner, repo),
        collect_issue_comments(api.as_ref(), owner, repo),
    )?;
    ctx.log(format!(
        "collected {} review events, {} review comments, {} issue comments",
        reviews.len(),
        review_comments.len(),
        issue_comments.len()
    ));

    let dataset = RunDataset {
        contributors: contributors(&commits, &pulls, &reviews),
        weekly_activity: weekly_commit_activity(&commits),
        author_activity: author_activity(&commits),
        merge_latency: time_to_merge(&pulls),
        interactions: interaction_matrix(&pulls, &reviews),
        commits,
        pulls,
        issues,
        reviews,
        review_comments,
        issue_comments,
    };

    let writer = DatasetWriter::stage(&output_root, owner, repo)?;
    if let Err(err) = writer.write_all(&dataset) {
        writer.discard();
        return Err(err.into());
    }
    let promoted = writer.promote()?;
    ctx.log(format!("dataset written to {}", promoted.display()));

    Ok(())
}
