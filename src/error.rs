use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::overpass::OverpassUnavailable;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    pub fields: Vec<FieldError>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid search request: {0}")]
    InvalidRequest(ValidationErrors),
    #[error("could not geocode location: {0}")]
    LocationNotFound(String),
    #[error("geocoding service unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error(transparent)]
    OverpassUnavailable(#[from] OverpassUnavailable),
    #[error("failed to write CSV export: {0}")]
    Export(#[from] csv::Error),
    #[error("failed to serialize tags: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SearchError {
    /// Machine readable error kind used in response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            SearchError::InvalidRequest(_) => "invalid_request",
            SearchError::LocationNotFound(_) => "location_not_found",
            SearchError::UpstreamUnavailable(_) => "upstream_unavailable",
            SearchError::OverpassUnavailable(_) => "overpass_unavailable",
            SearchError::Export(_) | SearchError::Serialize(_) => "export_failed",
        }
    }
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
