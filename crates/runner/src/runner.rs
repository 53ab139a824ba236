use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use collector::{GithubApi, RestGithubApi};
use common::config::{GithubConfig, RunnerConfig};
use gh_client::{Credential, RestClient};
use tracing::{instrument, warn};

use crate::context::RunContext;
use crate::error::RunError;
use crate::metrics::{self, ActiveRunGuard};
use crate::pipeline;

pub struct RunRequest {
    pub owner: String,
    pub repo: String,
    pub credential: Credential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Succeeded,
    Failed,
    TimedOut,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
            RunStatus::TimedOut => "timed_out",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: RunStatus,
    pub output: String,
    pub error: Option<String>,
}

impl RunReport {
    fn failed(output: String, error: String) -> Self {
        Self {
            status: RunStatus::Failed,
            output,
            error: Some(error),
        }
    }
}

/// Per-target view of the run lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Succeeded,
    Failed,
    TimedOut,
}

pub type ApiFactory =
    dyn Fn(&RunContext) -> anyhow::Result<Arc<dyn GithubApi>> + Send + Sync + 'static;

/// Sequences one analytics run per request under a hard wall-clock budget.
/// A second request for a target that is still running is rejected rather
/// than queued, so two writers can never race on one output path.
pub struct Runner {
    runner_config: RunnerConfig,
    api_factory: Arc<ApiFactory>,
    states: Mutex<HashMap<String, RunState>>,
}

impl Runner {
    pub fn new(runner_config: RunnerConfig, github_config: GithubConfig) -> Self {
        let factory = move |ctx: &RunContext| -> anyhow::Result<Arc<dyn GithubApi>> {
            let client = RestClient::new(ctx.credential.clone(), &github_config)?;
            Ok(Arc::new(RestGithubApi::new(client)))
        };
        Self::with_api_factory(runner_config, Arc::new(factory))
    }

    pub fn with_api_factory(runner_config: RunnerConfig, api_factory: Arc<ApiFactory>) -> Self {
        Self {
            runner_config,
            api_factory,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn state(&self, owner: &str, repo: &str) -> RunState {
        self.states
            .lock()
            .expect("run states poisoned")
            .get(&format!("{owner}/{repo}"))
            .copied()
            .unwrap_or(RunState::Idle)
    }

    #[instrument(skip_all, fields(owner = %request.owner, repo = %request.repo))]
    pub async fn run(&self, request: RunRequest) -> RunReport {
        if request.owner.trim().is_empty() || request.repo.trim().is_empty() {
            return RunReport::failed(String::new(), RunError::InvalidTarget.to_string());
        }

        let target = format!("{}/{}", request.owner, request.repo);
        if !self.begin(&target) {
            return RunReport::failed(
                String::new(),
                RunError::AlreadyRunning { target }.to_string(),
            );
        }

        metrics::RUNS_TOTAL.inc();
        let _active = ActiveRunGuard::new();
        let timer = metrics::RUN_DURATION.start_timer();

        let budget_secs = self.runner_config.timeout_secs;
        let deadline = Instant::now() + Duration::from_secs(budget_secs);
        let ctx = RunContext::new(&request.owner, &request.repo, request.credential, deadline);
        let log = ctx.log_handle();
        let output_root = PathBuf::from(&self.runner_config.output_dir);

        let report = match (self.api_factory)(&ctx) {
            Err(err) => RunReport::failed(
                log.snapshot(),
                format!("failed to initialise the API client: {err}"),
            ),
            Ok(api) => {
                let budget = ctx.deadline.saturating_duration_since(Instant::now());
                let mut handle = tokio::spawn(pipeline::execute(ctx, api, output_root.clone()));

                match tokio::time::timeout(budget, &mut handle).await {
                    Err(_elapsed) => {
                        // Forced cancellation: an orphaned pipeline would keep
                        // burning API quota after the caller has given up.
                        handle.abort();
                        let _ = (&mut handle).await;
                        let staging =
                            dataset::staging_dir(&output_root, &request.owner, &request.repo);
                        let _ = std::fs::remove_dir_all(staging);
                        warn!(target = %target, budget_secs, "run timed out");
                        RunReport {
                            status: RunStatus::TimedOut,
                            output: log.snapshot(),
                            error: Some(RunError::TimedOut { budget_secs }.to_string()),
                        }
                    }
                    Ok(Ok(Ok(()))) => RunReport {
                        status: RunStatus::Succeeded,
                        output: log.snapshot(),
                        error: None,
                    },
                    Ok(Ok(Err(err))) => {
                        warn!(target = %target, error = %err, "run failed");
                        RunReport::failed(log.snapshot(), err.to_string())
                    }
                    Ok(Err(join_err)) => {
                        warn!(target = %target, error = %join_err, "run task died");
                        RunReport::failed(log.snapshot(), format!("run task died: {join_err}"))
                    }
                }
            }
        };

        timer.observe_duration();
        metrics::RUN_OUTCOMES_TOTAL
            .with_label_values(&[report.status.as_str()])
            .inc();
        self.finish(&target, report.status);
        report
    }

    fn begin(&self, target: &str) -> bool {
        let mut states = self.states.lock().expect("run states poisoned");
        if matches!(states.get(target), Some(RunState::Running)) {
            return false;
        }
        states.insert(target.to_string(), RunState::Running);
        true
    }

    fn finish(&self, target: &str, status: RunStatus) {
        let state = match status {
            RunStatus::Succeeded => RunState::Succeeded,
            RunStatus::Failed => RunState::Failed,
            RunStatus::TimedOut => RunState::TimedOut,
        };
        self.states
            .lock()
            .expect("run states poisoned")
            .insert(target.to_string(), state);
    }
}
