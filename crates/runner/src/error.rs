use collector::CollectorError;
use dataset::WriteError;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Collector(#[from] CollectorError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("owner and repo must be non-empty")]
    InvalidTarget,
    #[error("a run for {target} is already in progress")]
    AlreadyRunning { target: String },
    #[error("run exceeded the {budget_secs}s wall-clock budget")]
    TimedOut { budget_secs: u64 },
}
