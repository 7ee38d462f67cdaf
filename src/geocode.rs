use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::{
    error::{FieldError, SearchError, ValidationErrors},
    types::{nominatim::NominatimPlace, Coordinate, GeocodeResult},
};

/// Resolves free text to a coordinate. No retries happen at this layer.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, location: &str) -> Result<GeocodeResult, SearchError>;
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    url: String,
}

impl NominatimGeocoder {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn resolve(&self, location: &str) -> Result<GeocodeResult, SearchError> {
        let query = location.trim();
        if query.is_empty() {
            return Err(SearchError::InvalidRequest(ValidationErrors {
                fields: vec![FieldError::new("location", "Location cannot be empty.")],
            }));
        }

        let response = self
            .client
            .get(&self.url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| SearchError::UpstreamUnavailable(e.to_string()))?;
        if !response.status().is_success() {
            debug!(status = %response.status(), "geocoder returned non-success status");
            return Err(SearchError::LocationNotFound(query.to_owned()));
        }
        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| SearchError::UpstreamUnavailable(e.to_string()))?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::LocationNotFound(query.to_owned()))?;
        let coordinate = place
            .lat
            .parse::<f64>()
            .ok()
            .zip(place.lon.parse::<f64>().ok())
            .and_then(|(lat, lon)| Coordinate::new(lat, lon))
            .ok_or_else(|| SearchError::LocationNotFound(query.to_owned()))?;

        Ok(GeocodeResult {
            coordinate,
            label: place
                .display_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| query.to_owned()),
        })
    }
}
