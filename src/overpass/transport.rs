use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::instrument;

use crate::types::overpass::OverpassResponse;

/// Why a single request to a mirror did not produce a result set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rate limited by mirror")]
    RateLimited,
    #[error("mirror responded with status {0}")]
    Status(u16),
    #[error("invalid result set: {0}")]
    Decode(String),
    #[error("query failed on mirror: {0}")]
    Remark(String),
    #[error("no mirrors configured")]
    NoMirrors,
}

impl From<reqwest::Error> for AttemptError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            AttemptError::Timeout
        } else if error.is_decode() {
            AttemptError::Decode(error.to_string())
        } else {
            AttemptError::Transport(error.to_string())
        }
    }
}

/// Sends one Overpass QL query to one mirror, giving up after `timeout`.
#[async_trait]
pub trait OverpassTransport: Send + Sync {
    async fn execute(
        &self,
        mirror: &str,
        query: &str,
        timeout: Duration,
    ) -> Result<OverpassResponse, AttemptError>;
}

pub struct ReqwestOverpassTransport {
    client: reqwest::Client,
}

impl ReqwestOverpassTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OverpassTransport for ReqwestOverpassTransport {
    #[instrument(skip(self, query))]
    async fn execute(
        &self,
        mirror: &str,
        query: &str,
        timeout: Duration,
    ) -> Result<OverpassResponse, AttemptError> {
        let response = self
            .client
            .post(mirror)
            .timeout(timeout)
            .form(&[("data", query)])
            .send()
            .await?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AttemptError::RateLimited);
        }
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }
        let body = response.text().await?;
        let result: OverpassResponse =
            serde_json::from_str(&body).map_err(|e| AttemptError::Decode(e.to_string()))?;
        if let Some(remark) = result.runtime_error() {
            return Err(AttemptError::Remark(remark.to_owned()));
        }
        Ok(result)
    }
}
