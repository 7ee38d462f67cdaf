//! In-process fakes for the outbound seams.

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use url::Url;

use crate::{
    config::Config,
    enrich::{FetchError, PageFetcher},
    error::SearchError,
    geocode::Geocoder,
    overpass::{AttemptError, OverpassTransport},
    types::{
        overpass::{OverpassElement, OverpassResponse},
        Coordinate, GeocodeResult,
    },
};

pub fn test_config() -> Config {
    Config {
        overpass_urls: vec!["http://mirror-a".to_owned()],
        retry_backoff: Duration::ZERO,
        retry_backoff_cap: Duration::ZERO,
        rate_limit_backoff: Duration::ZERO,
        http_timeout: Duration::from_secs(2),
        ..Config::default()
    }
}

/// Nodes located at the San Diego test origin.
pub fn overpass_response(ids: &[(&str, i64)]) -> OverpassResponse {
    OverpassResponse {
        elements: ids
            .iter()
            .map(|(kind, id)| element(kind, *id, 32.7157, -117.1611, &[("name", "Place")]))
            .collect(),
        remark: None,
    }
}

pub fn element(kind: &str, id: i64, lat: f64, lon: f64, tags: &[(&str, &str)]) -> OverpassElement {
    OverpassElement {
        element_type: kind.to_owned(),
        id,
        lat: Some(lat),
        lon: Some(lon),
        center: None,
        tags: tags
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect::<BTreeMap<_, _>>(),
    }
}

type TransportFn = dyn Fn(&str, &str) -> Result<OverpassResponse, AttemptError> + Send + Sync;

pub struct FnTransport {
    handler: Box<TransportFn>,
    pub calls: AtomicUsize,
    mirrors: Mutex<Vec<String>>,
}

impl FnTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &str) -> Result<OverpassResponse, AttemptError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: AtomicUsize::new(0),
            mirrors: Mutex::new(Vec::new()),
        }
    }

    pub fn mirrors_called(&self) -> Vec<String> {
        self.mirrors.lock().unwrap().clone()
    }
}

#[async_trait]
impl OverpassTransport for FnTransport {
    async fn execute(
        &self,
        mirror: &str,
        query: &str,
        _timeout: Duration,
    ) -> Result<OverpassResponse, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.mirrors.lock().unwrap().push(mirror.to_owned());
        (self.handler)(mirror, query)
    }
}

pub struct StaticGeocoder(pub Option<GeocodeResult>);

impl StaticGeocoder {
    pub fn san_diego() -> Self {
        Self(Some(GeocodeResult {
            coordinate: Coordinate::new(32.7157, -117.1611).unwrap(),
            label: "San Diego, CA".to_owned(),
        }))
    }
}

#[async_trait]
impl Geocoder for StaticGeocoder {
    async fn resolve(&self, location: &str) -> Result<GeocodeResult, SearchError> {
        self.0
            .clone()
            .ok_or_else(|| SearchError::LocationNotFound(location.to_owned()))
    }
}

type FetchFn = dyn Fn(&Url) -> Result<String, FetchError> + Send + Sync;

pub struct FnFetcher {
    handler: Box<FetchFn>,
    pub requested: Mutex<Vec<String>>,
}

impl FnFetcher {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Url) -> Result<String, FetchError> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PageFetcher for FnFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        (self.handler)(url)
    }
}
