pub mod backoff;
pub mod client;
pub mod credential;
pub mod error;
pub mod exec;
pub mod rate_limit;

pub use client::RestClient;
pub use credential::Credential;
pub use error::FetchError;
pub use exec::{HttpExec, ReqwestExecutor};
