use http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unexpected status {status} for {endpoint}")]
    Status {
        status: StatusCode,
        endpoint: String,
    },
    #[error("transport error for {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("retries exhausted for {endpoint} after {attempts} attempts: {source}")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        #[source]
        source: anyhow::Error,
    },
    #[error("malformed response body for {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    pub fn endpoint(&self) -> &str {
        match self {
            FetchError::Status { endpoint, .. }
            | FetchError::Transport { endpoint, .. }
            | FetchError::RetriesExhausted { endpoint, .. }
            | FetchError::Decode { endpoint, .. } => endpoint,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
