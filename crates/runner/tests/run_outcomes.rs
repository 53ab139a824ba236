use std::fs;
use std::sync::Arc;
use std::time::Duration;

use collector::GithubApi;
use common::config::RunnerConfig;
use dataset::writer;
use futures::stream::{self, BoxStream, StreamExt};
use gh_client::{Credential, FetchError};
use http::StatusCode;
use runner::{RunRequest, RunState, RunStatus, Runner};
use serde_json::{json, Value};
use temp_dir::TempDir;

#[derive(Clone, Copy)]
enum Behaviour {
    Healthy,
    FailingCommits,
    HangingCommits,
    SlowEmpty,
}

struct StubApi {
    behaviour: Behaviour,
}

fn items(values: Vec<Value>) -> BoxStream<'static, Result<Value, FetchError>> {
    stream::iter(values.into_iter().map(Ok)).boxed()
}

fn empty() -> BoxStream<'static, Result<Value, FetchError>> {
    stream::iter(Vec::<Result<Value, FetchError>>::new()).boxed()
}

impl GithubApi for StubApi {
    fn list_commits(&self, _: &str, _: &str) -> BoxStream<'static, Result<Value, FetchError>> {
        match self.behaviour {
            Behaviour::Healthy => items(vec![
                json!({
                    "sha": "aaa",
                    "commit": {
                        "author": {"name": "Amy", "date": "2024-01-01T00:00:00Z"},
                        "committer": {"name": "Amy", "date": "2024-01-01T00:00:00Z"},
                        "message": "initial"
                    },
                    "author": {"id": 1, "login": "amy"}
                }),
                json!({
                    "sha": "bbb",
                    "commit": {
                        "author": {"name": "Zed", "date": "2024-01-08T00:00:00Z"},
                        "committer": {"name": "Zed", "date": "2024-01-08T00:00:00Z"},
                        "message": "follow-up"
                    },
                    "author": {"id": 2, "login": "zed"}
                }),
            ]),
            Behaviour::FailingCommits => stream::once(async {
                Err::<Value, _>(FetchError::Status {
                    status: StatusCode::BAD_GATEWAY,
                    endpoint: "repos/o/r/commits".into(),
                })
            })
            .boxed(),
            Behaviour::HangingCommits => {
                stream::pending::<Result<Value, FetchError>>().boxed()
            }
            Behaviour::SlowEmpty => stream::once(async {
                tokio::time::sleep(Duration::from_millis(250)).await;
                Ok::<_, FetchError>(Value::Null)
            })
            .filter(|_| async { false })
            .boxed(),
        }
    }

    fn list_pulls(&self, _: &str, _: &str) -> BoxStream<'static, Result<Value, FetchError>> {
        match self.behaviour {
            Behaviour::Healthy => items(vec![json!({
                "number": 1,
                "user": {"id": 1, "login": "amy"},
                "state": "closed",
                "created_at": "2024-01-01T00:00:00Z",
                "merged_at": "2024-01-02T12:00:00Z",
                "closed_at": "2024-01-02T12:00:00Z"
            })]),
            _ => empty(),
        }
    }

    fn list_issues(&self, _: &str, _: &str) -> BoxStream<'static, Result<Value, FetchError>> {
        empty()
    }

    fn list_pull_reviews(
        &self,
        _: &str,
        _: &str,
        _: i64,
    ) -> BoxStream<'static, Result<Value, FetchError>> {
        match self.behaviour {
            Behaviour::Healthy => items(vec![json!({
                "id": 10,
                "user": {"id": 2, "login": "zed"},
                "state": "APPROVED",
                "submitted_at": "2024-01-02T00:00:00Z"
            })]),
            _ => empty(),
        }
    }

    fn list_review_comments(
        &self,
        _: &str,
        _: &str,
    ) -> BoxStream<'static, Result<Value, FetchError>> {
        empty()
    }

    fn list_issue_comments(
        &self,
        _: &str,
        _: &str,
    ) -> BoxStream<'static, Result<Value, FetchError>> {
        empty()
    }
}

fn test_runner(output_dir: &std::path::Path, timeout_secs: u64, behaviour: Behaviour) -> Runner {
    let config = RunnerConfig {
        timeout_secs,
        output_dir: output_dir.to_string_lossy().into_owned(),
    };
    let factory = move |_ctx: &runner::RunContext| -> anyhow::Result<Arc<dyn GithubApi>> {
        Ok(Arc::new(StubApi { behaviour }))
    };
    Runner::with_api_factory(config, Arc::new(factory))
}

fn request(owner: &str, repo: &str) -> RunRequest {
    RunRequest {
        owner: owner.into(),
        repo: repo.into(),
        credential: Credential::new("token"),
    }
}

#[tokio::test]
async fn successful_run_promotes_a_complete_dataset() {
    let root = TempDir::new().unwrap();
    let runner = test_runner(root.path(), 30, Behaviour::Healthy);

    let report = runner.run(request("octo", "demo")).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    assert!(report.error.is_none());
    assert!(report.output.contains("collected 2 commits"));
    assert_eq!(runner.state("octo", "demo"), RunState::Succeeded);

    let target = writer::target_dir(root.path(), "octo", "demo");
    for name in dataset::DATASET_FILES {
        assert!(target.join(name).is_file(), "missing {name}");
    }
    let latency = fs::read_to_string(target.join(writer::TIME_TO_MERGE_FILE)).unwrap();
    assert_eq!(latency, "number,hours\n1,36\n");
}

#[tokio::test]
async fn rerunning_unchanged_input_is_byte_identical() {
    let root = TempDir::new().unwrap();
    let runner = test_runner(root.path(), 30, Behaviour::Healthy);
    let target = writer::target_dir(root.path(), "octo", "demo");

    assert_eq!(
        runner.run(request("octo", "demo")).await.status,
        RunStatus::Succeeded
    );
    let before: Vec<Vec<u8>> = dataset::DATASET_FILES
        .iter()
        .map(|name| fs::read(target.join(name)).unwrap())
        .collect();

    assert_eq!(
        runner.run(request("octo", "demo")).await.status,
        RunStatus::Succeeded
    );
    for (name, old) in dataset::DATASET_FILES.iter().zip(before) {
        assert_eq!(fs::read(target.join(name)).unwrap(), old, "{name} drifted");
    }
}

#[tokio::test]
async fn empty_target_is_rejected_up_front() {
    let root = TempDir::new().unwrap();
    let runner = test_runner(root.path(), 30, Behaviour::Healthy);

    let report = runner.run(request("", "demo")).await;
    assert_eq!(report.status, RunStatus::Failed);
    assert!(report.error.unwrap().contains("non-empty"));
}

#[tokio::test]
async fn collector_failure_fails_the_run_with_no_partial_output() {
    let root = TempDir::new().unwrap();
    let runner = test_runner(root.path(), 30, Behaviour::FailingCommits);

    let report = runner.run(request("octo", "demo")).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert!(report
        .error
        .as_deref()
        .unwrap()
        .contains("commits collector failed"));
    assert_eq!(runner.state("octo", "demo"), RunState::Failed);
    assert!(!writer::target_dir(root.path(), "octo", "demo").exists());
}

#[tokio::test(start_paused = true)]
async fn timeout_aborts_the_run_and_keeps_the_previous_dataset() {
    let root = TempDir::new().unwrap();
    let target = writer::target_dir(root.path(), "octo", "demo");

    let healthy = test_runner(root.path(), 30, Behaviour::Healthy);
    assert_eq!(
        healthy.run(request("octo", "demo")).await.status,
        RunStatus::Succeeded
    );
    let commits_before = fs::read(target.join(writer::COMMITS_FILE)).unwrap();

    let hanging = test_runner(root.path(), 1, Behaviour::HangingCommits);
    let report = hanging.run(request("octo", "demo")).await;

    assert_eq!(report.status, RunStatus::TimedOut);
    assert!(report.error.unwrap().contains("wall-clock budget"));
    assert_eq!(hanging.state("octo", "demo"), RunState::TimedOut);
    // The promoted dataset is untouched and no staging is left to merge.
    assert_eq!(
        fs::read(target.join(writer::COMMITS_FILE)).unwrap(),
        commits_before
    );
    assert!(!writer::staging_dir(root.path(), "octo", "demo").exists());
}

#[tokio::test(start_paused = true)]
async fn concurrent_runs_for_the_same_target_are_rejected() {
    let root = TempDir::new().unwrap();
    let runner = Arc::new(test_runner(root.path(), 30, Behaviour::SlowEmpty));

    let first = tokio::spawn({
        let runner = runner.clone();
        async move { runner.run(request("octo", "demo")).await }
    });
    // Let the first run reach its Running state before asking again.
    while runner.state("octo", "demo") != RunState::Running {
        tokio::task::yield_now().await;
    }

    let second = runner.run(request("octo", "demo")).await;
    assert_eq!(second.status, RunStatus::Failed);
    assert!(second.error.unwrap().contains("already in progress"));

    let first = first.await.unwrap();
    assert_eq!(first.status, RunStatus::Succeeded);
}

#[tokio::test]
async fn different_targets_run_independently() {
    let root = TempDir::new().unwrap();
    let runner = test_runner(root.path(), 30, Behaviour::Healthy);

    assert_eq!(
        runner.run(request("octo", "one")).await.status,
        RunStatus::Succeeded
    );
    assert_eq!(
        runner.run(request("octo", "two")).await.status,
        RunStatus::Succeeded
    );
    assert!(writer::target_dir(root.path(), "octo", "one").exists());
    assert!(writer::target_dir(root.path(), "octo", "two").exists());
}
