use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    Histogram, IntCounter, IntCounterVec, IntGauge,
};

pub static RUNS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("runner_runs_total", "Total number of analytics runs attempted")
        .expect("runner runs total")
});

pub static RUN_OUTCOMES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "runner_run_outcomes_total",
        "Completed analytics runs grouped by outcome",
        &["outcome"]
    )
    .expect("runner run outcomes")
});

pub static RUN_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "runner_run_duration_seconds",
        "Wall-clock duration of analytics runs in seconds",
        vec![1.0, 5.0, 15.0, 30.0, 60.0, 90.0, 120.0, 180.0]
    )
    .expect("runner run duration histogram")
});

pub static ACTIVE_RUNS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "runner_active_runs",
        "Number of analytics runs currently executing"
    )
    .expect("runner active runs gauge")
});

pub struct ActiveRunGuard;

impl Default for ActiveRunGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl ActiveRunGuard {
    pub fn new() -> Self {
        ACTIVE_RUNS.inc();
        Self
    }
}

impl Drop for ActiveRunGuard {
    fn drop(&mut self) {
        ACTIVE_RUNS.dec();
    }
}
