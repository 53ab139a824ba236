use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(".")
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Config::builder()
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/default")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/local")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(Environment::default().separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    #[serde(default = "GithubConfig::default_api_base")]
    pub api_base: String,
    #[serde(default = "GithubConfig::default_user_agent")]
    pub user_agent: String,
    #[serde(default = "GithubConfig::default_page_size")]
    pub page_size: u32,
    #[serde(default = "GithubConfig::default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "GithubConfig::default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "GithubConfig::default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    #[serde(default = "GithubConfig::default_jitter_frac")]
    pub jitter_frac: f32,
}

impl GithubConfig {
    fn default_api_base() -> String {
        "https://api.github.com/".to_string()
    }

    fn default_user_agent() -> String {
        "repo-pulse".to_string()
    }

    const fn default_page_size() -> u32 {
        100
    }

    const fn default_max_retries() -> u32 {
        4
    }

    const fn default_backoff_base_ms() -> u64 {
        500
    }

    const fn default_backoff_max_ms() -> u64 {
        60_000
    }

    const fn default_jitter_frac() -> f32 {
        0.2
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_base: Self::default_api_base(),
            user_agent: Self::default_user_agent(),
            page_size: Self::default_page_size(),
            max_retries: Self::default_max_retries(),
            backoff_base_ms: Self::default_backoff_base_ms(),
            backoff_max_ms: Self::default_backoff_max_ms(),
            jitter_frac: Self::default_jitter_frac(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    #[serde(default = "RunnerConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "RunnerConfig::default_output_dir")]
    pub output_dir: String,
}

impl RunnerConfig {
    const fn default_timeout_secs() -> u64 {
        120
    }

    fn default_output_dir() -> String {
        "data".to_string()
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout_secs(),
            output_dir: Self::default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "ApiConfig::default_bind")]
    pub bind: String,
}

impl ApiConfig {
    fn default_bind() -> String {
        "0.0.0.0:3000".to_string()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
        }
    }
}
