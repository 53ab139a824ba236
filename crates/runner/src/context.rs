use std::sync::{Arc, Mutex};
use std::time::Instant;

use gh_client::Credential;
use tracing::info;

/// Captured diagnostic output for one run, returned to the caller with the
/// final report. Shared between the orchestrator and the pipeline task.
#[derive(Clone, Default)]
pub struct RunLog {
    inner: Arc<Mutex<String>>,
}

impl RunLog {
    pub fn push(&self, line: &str) {
        let mut buf = self.inner.lock().expect("run log poisoned");
        buf.push_str(line);
        buf.push('\n');
    }

    pub fn snapshot(&self) -> String {
        self.inner.lock().expect("run log poisoned").clone()
    }
}

/// Per-invocation handle carrying everything a pipeline stage needs to
/// know about its run. There is no process-wide "current run" state; each
/// run gets its own context.
#[derive(Clone)]
pub struct RunContext {
    pub owner: String,
    pub repo: String,
    pub credential: Credential,
    pub deadline: Instant,
    log: RunLog,
}

impl RunContext {
    pub fn new(owner: &str, repo: &str, credential: Credential, deadline: Instant) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            credential,
            deadline,
            log: RunLog::default(),
        }
    }

    pub fn target(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    pub fn log(&self, line: impl AsRef<str>) {
        let line = line.as_ref();
        info!(owner = %self.owner, repo = %self.repo, "{line}");
        self.log.push(line);
    }

    pub fn log_handle(&self) -> RunLog {
        self.log.clone()
    }
}
