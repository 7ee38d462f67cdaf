//! Category queries against a prioritised list of Overpass mirrors.

pub mod failover;
pub mod query;
pub mod transport;

use std::{sync::Arc, time::Duration};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::Config,
    types::{Category, Coordinate, RawElement},
};
pub use failover::{FailoverState, RetryPolicy};
pub use query::AdminArea;
pub use transport::{AttemptError, OverpassTransport, ReqwestOverpassTransport};

/// Every mirror was exhausted for one category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Overpass failed on all mirrors for {category} after {calls} calls: {last_error}")]
pub struct OverpassUnavailable {
    pub category: Category,
    pub calls: usize,
    pub last_error: AttemptError,
}

pub struct OverpassOrchestrator {
    transport: Arc<dyn OverpassTransport>,
    mirrors: Vec<String>,
    policy: RetryPolicy,
    query_timeout: Duration,
    region_timeout: Duration,
}

impl OverpassOrchestrator {
    pub fn new(transport: Arc<dyn OverpassTransport>, config: &Config) -> Self {
        Self {
            transport,
            mirrors: config.overpass_urls.clone(),
            policy: RetryPolicy {
                attempts: config.overpass_retry_attempts.max(1),
                backoff_step: config.retry_backoff,
                backoff_cap: config.retry_backoff_cap,
                rate_limit_backoff: config.rate_limit_backoff,
            },
            query_timeout: config.http_timeout,
            region_timeout: config.region_query_timeout,
        }
    }

    /// Runs the category query around `origin` with per-mirror retries and
    /// failover. An empty result set from a mirror is a success.
    #[instrument(skip(self, category), fields(%category))]
    pub async fn query(
        &self,
        origin: Coordinate,
        radius_m: u32,
        category: Category,
    ) -> Result<Vec<RawElement>, OverpassUnavailable> {
        let query = query::build_around_query(
            origin,
            radius_m,
            category.tag_rules(),
            self.query_timeout.as_secs().max(1),
        );
        self.run(&query, category, self.query_timeout).await
    }

    /// Same as [`query`](Self::query) but over a whole administrative area,
    /// using the longer region timeout.
    #[instrument(skip(self, area, category), fields(area = area.name, %category))]
    pub async fn query_area(
        &self,
        area: &AdminArea,
        category: Category,
    ) -> Result<Vec<RawElement>, OverpassUnavailable> {
        let query = query::build_admin_area_query(
            area,
            category.tag_rules(),
            self.region_timeout.as_secs().max(1),
        );
        self.run(&query, category, self.region_timeout).await
    }

    /// Sends a prebuilt query through the mirror failover. `category` only
    /// labels the failure.
    pub async fn run(
        &self,
        query: &str,
        category: Category,
        timeout: Duration,
    ) -> Result<Vec<RawElement>, OverpassUnavailable> {
        let mut state = FailoverState::start(self.mirrors.len());
        let mut response = None;
        let mut last_error = AttemptError::NoMirrors;
        let mut calls = 0;

        while !state.is_terminal() {
            state = match state {
                FailoverState::Trying { mirror, attempt } => {
                    let Some(url) = self.mirrors.get(mirror) else {
                        break;
                    };
                    calls += 1;
                    match self.transport.execute(url, query, timeout).await {
                        Ok(result) => {
                            info!(
                                mirror = %url,
                                attempt,
                                elements = result.elements.len(),
                                "overpass query succeeded"
                            );
                            response = Some(result);
                            state.on_success()
                        }
                        Err(err) => {
                            warn!(mirror = %url, attempt, error = %err, "overpass attempt failed");
                            let next = state.on_failure(self.policy.attempts);
                            if let FailoverState::Trying { .. } = next {
                                tokio::time::sleep(self.policy.delay_after(attempt, &err)).await;
                            }
                            last_error = err;
                            next
                        }
                    }
                }
                FailoverState::ExhaustedMirror { mirror } => {
                    debug!(mirror, "mirror exhausted, failing over");
                    state.advance(self.mirrors.len())
                }
                terminal => terminal,
            };
        }

        match response {
            Some(result) if state == FailoverState::Succeeded => Ok(result.into_raw_elements()),
            _ => Err(OverpassUnavailable {
                category,
                calls,
                last_error,
            }),
        }
    }
}
