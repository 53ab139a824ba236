use futures::stream::BoxStream;
use gh_client::{FetchError, RestClient};
use serde_json::Value;

/// Raw event listings, one lazy stream per endpoint. Collectors drive the
/// streams; implementations own pagination and rate limiting.
pub trait GithubApi: Send + Sync {
    fn list_commits(&self, owner: &str, repo: &str)
        -> BoxStream<'static, Result<Value, FetchError>>;

    fn list_pulls(&self, owner: &str, repo: &str) -> BoxStream<'static, Result<Value, FetchError>>;

    fn list_issues(&self, owner: &str, repo: &str)
        -> BoxStream<'static, Result<Value, FetchError>>;

    fn list_pull_reviews(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> BoxStream<'static, Result<Value, FetchError>>;

    fn list_review_comments(
        &self,
        owner: &str,
        repo: &str,
    ) -> BoxStream<'static, Result<Value, FetchError>>;

    fn list_issue_comments(
        &self,
        owner: &str,
        repo: &str,
    ) -> BoxStream<'static, Result<Value, FetchError>>;
}

pub struct RestGithubApi {
    client: RestClient,
}

impl RestGithubApi {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

impl GithubApi for RestGithubApi {
    fn list_commits(
        &self,
        owner: &str,
        repo: &str,
    ) -> BoxStream<'static, Result<Value, FetchError>> {
        self.client
            .fetch_paginated(&format!("repos/{owner}/{repo}/commits"), &[])
    }

    fn list_pulls(&self, owner: &str, repo: &str) -> BoxStream<'static, Result<Value, FetchError>> {
        self.client.fetch_paginated(
            &format!("repos/{owner}/{repo}/pulls"),
            &[
                ("state", "all".to_string()),
                ("sort", "created".to_string()),
                ("direction", "asc".to_string()),
            ],
        )
    }

    fn list_issues(
        &self,
        owner: &str,
        repo: &str,
    ) -> BoxStream<'static, Result<Value, FetchError>> {
        self.client.fetch_paginated(
            &format!("repos/{owner}/{repo}/issues"),
            &[("state", "all".to_string())],
        )
    }

    fn list_pull_reviews(
        &self,
        owner: &str,
        repo: &str,
        number: i64,
    ) -> BoxStream<'static, Result<Value, FetchError>> {
        self.client
            .fetch_paginated(&format!("repos/{owner}/{repo}/pulls/{number}/reviews"), &[])
    }

    fn list_review_comments(
        &self,
        owner: &str,
        repo: &str,
    ) -> BoxStream<'static, Result<Value, FetchError>> {
        self.client
            .fetch_paginated(&format!("repos/{owner}/{repo}/pulls/comments"), &[])
    }

    fn list_issue_comments(
        &self,
        owner: &str,
        repo: &str,
    ) -> BoxStream<'static, Result<Value, FetchError>> {
        self.client
            .fetch_paginated(&format!("repos/{owner}/{repo}/issues/comments"), &[])
    }
}
