use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chrono::Utc;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use http::{header, Request, Response, StatusCode};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use common::config::GithubConfig;

use crate::backoff::retry_delay;
use crate::credential::Credential;
use crate::error::FetchError;
use crate::exec::{HttpExec, ReqwestExecutor};
use crate::rate_limit::rate_limit_wait;

/// Authenticated client for the hosting service's REST API. Cheap to
/// clone; one instance lives for exactly one run.
#[derive(Clone)]
pub struct RestClient {
    exec: Arc<dyn HttpExec>,
    base: Url,
    user_agent: String,
    credential: Credential,
    page_size: u32,
    max_retries: u32,
    backoff_base: Duration,
    backoff_max: Duration,
    jitter: f32,
}

impl RestClient {
    pub fn new(credential: Credential, config: &GithubConfig) -> anyhow::Result<Self> {
        Ok(Self {
            exec: Arc::new(ReqwestExecutor::new()),
            base: Url::parse(&config.api_base)?,
            user_agent: config.user_agent.clone(),
            credential,
            page_size: config.page_size,
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
            jitter: config.jitter_frac,
        })
    }

    pub fn with_exec(mut self, exec: Arc<dyn HttpExec>) -> Self {
        self.exec = exec;
        self
    }

    /// Follows page-numbered pagination from page 1 until the host serves a
    /// short page, yielding raw items as they arrive. Restarting means
    /// re-invoking; no cursor is persisted.
    pub fn fetch_paginated(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> BoxStream<'static, Result<Value, FetchError>> {
        let client = self.clone();
        let path = path.to_string();
        let query: Vec<(String, String)> = query
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();

        // Page 0 is the stop sentinel after the final short page.
        stream::try_unfold(1u32, move |page| {
            let client = client.clone();
            let path = path.clone();
            let query = query.clone();
            async move {
                if page == 0 {
                    return Ok(None);
                }
                let url = client.page_url(&path, &query, page)?;
                let items = client.get_json_array(url).await?;
                let next = if (items.len() as u32) < client.page_size {
                    0
                } else {
                    page + 1
                };
                debug!(path = %path, page, items = items.len(), "fetched page");
                Ok(Some((
                    stream::iter(items.into_iter().map(Ok::<_, FetchError>)),
                    next,
                )))
            }
        })
        .try_flatten()
        .boxed()
    }

    pub async fn get_json(&self, url: Url) -> Result<Value, FetchError> {
        let endpoint = endpoint_of(&url);
        let mut attempt = 0u32;
        loop {
            let response = match self.execute_once(&url).await {
                Ok(response) => response,
                Err(err) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        return Err(FetchError::RetriesExhausted {
                            endpoint,
                            attempts: attempt,
                            source: err,
                        });
                    }
                    let delay =
                        retry_delay(attempt - 1, self.backoff_base, self.backoff_max, self.jitter);
                    warn!(
                        endpoint = %endpoint,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transport error, backing off"
                    );
                    sleep(delay).await;
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                return serde_json::from_slice(response.body()).map_err(|source| {
                    FetchError::Decode {
                        endpoint,
                        source,
                    }
                });
            }

            if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                if let Some(advice) = rate_limit_wait(response.headers(), Utc::now()) {
                    info!(
                        endpoint = %endpoint,
                        wait_secs = advice.wait.as_secs(),
                        reason = advice.reason,
                        "rate limited, suspending until the window resets"
                    );
                    // Waiting out the quota window is recovery, not a retry.
                    sleep(advice.wait).await;
                    continue;
                }
            }

            if status.is_server_error() {
                attempt += 1;
                if attempt > self.max_retries {
                    return Err(FetchError::RetriesExhausted {
                        endpoint,
                        attempts: attempt,
                        source: anyhow!("unexpected status {}", status),
                    });
                }
                let delay =
                    retry_delay(attempt - 1, self.backoff_base, self.backoff_max, self.jitter);
                warn!(
                    endpoint = %endpoint,
                    status = %status,
                    attempt,
                    "server error, backing off"
                );
                sleep(delay).await;
                continue;
            }

            return Err(FetchError::Status { status, endpoint });
        }
    }

    async fn get_json_array(&self, url: Url) -> Result<Vec<Value>, FetchError> {
        let endpoint = endpoint_of(&url);
        match self.get_json(url).await? {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            other => {
                use serde::de::Error as _;
                Err(FetchError::Decode {
                    endpoint,
                    source: serde_json::Error::custom(format!(
                        "expected array response, got {}",
                        json_kind(&other)
                    )),
                })
            }
        }
    }

    async fn execute_once(&self, url: &Url) -> anyhow::Result<Response<Vec<u8>>> {
        let uri: http::Uri = url.as_str().parse()?;
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::USER_AGENT, self.user_agent.clone())
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header(header::AUTHORIZATION, self.credential.header_value())
            .body(Vec::new())?;

        self.exec.execute(request).await
    }

    fn page_url(
        &self,
        path: &str,
        query: &[(String, String)],
        page: u32,
    ) -> Result<Url, FetchError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|err| FetchError::Transport {
                endpoint: path.to_string(),
                source: err.into(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("page", &page.to_string());
            pairs.append_pair("per_page", &self.page_size.to_string());
        }
        Ok(url)
    }
}

fn endpoint_of(url: &Url) -> String {
    url.path().trim_start_matches('/').to_string()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
