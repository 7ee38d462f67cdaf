//! Best-effort email discovery from place websites.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

use crate::types::Place;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}\b").expect("email pattern compiles")
});

const CONTACT_PATHS: [&str; 2] = ["/contact", "/contact-us"];
const PLACEHOLDER_MARKERS: [&str; 3] = ["example.com", "email@", "your@"];
const ASSET_SUFFIXES: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp"];

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("site responded with status {0}")]
    Status(u16),
}

/// Fetches the text of one web page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

pub struct ReqwestPageFetcher {
    client: reqwest::Client,
}

impl ReqwestPageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for ReqwestPageFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

/// First plausible contact address in `text`, skipping placeholders and
/// image file names such as `logo@2x.png`.
pub fn extract_email(text: &str) -> Option<String> {
    EMAIL_REGEX
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|candidate| {
            let lower = candidate.to_ascii_lowercase();
            !PLACEHOLDER_MARKERS.iter().any(|marker| lower.contains(marker))
                && !ASSET_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
        })
        .map(str::to_owned)
}

/// Root page followed by the usual contact pages. Bare hosts get `http://`.
pub fn contact_candidates(website: &str) -> Vec<Url> {
    let website = website.trim();
    if website.is_empty() {
        return Vec::new();
    }
    let absolute = if website.starts_with("http://") || website.starts_with("https://") {
        website.to_owned()
    } else {
        format!("http://{website}")
    };
    let Ok(root) = Url::parse(&absolute) else {
        return Vec::new();
    };

    let mut candidates = vec![root.clone()];
    for path in CONTACT_PATHS {
        if let Ok(url) = root.join(path) {
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        }
    }
    candidates
}

pub struct EmailCrawler {
    fetcher: Arc<dyn PageFetcher>,
    concurrency: usize,
    timeout: Duration,
    crawl_delay: Duration,
}

impl EmailCrawler {
    pub fn new(fetcher: Arc<dyn PageFetcher>, concurrency: usize, timeout: Duration) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
            timeout,
            crawl_delay: Duration::ZERO,
        }
    }

    /// Pause between successive pages of the same website.
    pub fn with_crawl_delay(mut self, crawl_delay: Duration) -> Self {
        self.crawl_delay = crawl_delay;
        self
    }

    /// Fills `email` for places that have a website but no email. Order and
    /// every other field are preserved; failures leave the place untouched.
    #[instrument(skip_all, fields(places = places.len()))]
    pub async fn enrich(&self, places: Vec<Place>) -> Vec<Place> {
        let enriched: Vec<Place> = stream::iter(places)
            .map(|place| self.enrich_place(place))
            .buffered(self.concurrency)
            .collect()
            .await;
        info!("email enrichment finished");
        enriched
    }

    async fn enrich_place(&self, mut place: Place) -> Place {
        if place.email.is_some() {
            return place;
        }
        let Some(website) = place.website.as_deref() else {
            return place;
        };
        if let Some(email) = self.discover(website).await {
            debug!(osm_id = %place.osm_id, %email, "discovered email");
            place.email = Some(email);
        }
        place
    }

    pub async fn discover(&self, website: &str) -> Option<String> {
        for (index, url) in contact_candidates(website).into_iter().enumerate() {
            if index > 0 && !self.crawl_delay.is_zero() {
                tokio::time::sleep(self.crawl_delay).await;
            }
            match tokio::time::timeout(self.timeout, self.fetcher.fetch(&url)).await {
                Ok(Ok(body)) => {
                    if let Some(email) = extract_email(&body) {
                        return Some(email);
                    }
                }
                Ok(Err(err)) => debug!(%url, error = %err, "website fetch failed"),
                Err(_) => debug!(%url, "website fetch timed out"),
            }
        }
        None
    }
}
