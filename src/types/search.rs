use serde::{Deserialize, Serialize};

use super::{category::Category, place::Place};
use crate::error::{FieldError, SearchError, ValidationErrors};

pub const MIN_RADIUS_KM: f64 = 1.0;
pub const MAX_RADIUS_KM: f64 = 20.0;
pub const DEFAULT_RADIUS_KM: f64 = 5.0;

/// Request body as posted to `/api/search` and `/api/export`. Every field is
/// optional on the wire so that validation can report all problems at once.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct SearchRequestBody {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub radius_km: Option<f64>,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub with_email_enrichment: bool,
}

/// A validated search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub location: String,
    pub radius_km: f64,
    /// Non-empty, duplicate free, in the order requested.
    pub categories: Vec<Category>,
    /// Opt-in; only honoured when website email discovery is enabled.
    pub with_email_enrichment: bool,
}

impl SearchRequest {
    pub fn new(
        location: impl Into<String>,
        radius_km: f64,
        categories: &[Category],
    ) -> Result<Self, SearchError> {
        SearchRequestBody {
            location: Some(location.into()),
            radius_km: Some(radius_km),
            categories: Some(categories.iter().map(|c| c.as_str().to_owned()).collect()),
            with_email_enrichment: false,
        }
        .try_into()
    }

    pub fn radius_m(&self) -> u32 {
        (self.radius_km * 1000.0).round() as u32
    }
}

impl TryFrom<SearchRequestBody> for SearchRequest {
    type Error = SearchError;

    fn try_from(body: SearchRequestBody) -> Result<Self, Self::Error> {
        let mut errors = Vec::new();

        let location = body.location.unwrap_or_default().trim().to_owned();
        if location.is_empty() {
            errors.push(FieldError::new("location", "Location cannot be empty."));
        }

        let radius_km = body.radius_km.unwrap_or(DEFAULT_RADIUS_KM);
        if !radius_km.is_finite() || !(MIN_RADIUS_KM..=MAX_RADIUS_KM).contains(&radius_km) {
            errors.push(FieldError::new(
                "radius_km",
                format!("Radius must be between {MIN_RADIUS_KM} and {MAX_RADIUS_KM} km."),
            ));
        }

        let mut categories = Vec::new();
        let mut unknown = Vec::new();
        for name in body.categories.unwrap_or_default() {
            match name.parse::<Category>() {
                Ok(category) if !categories.contains(&category) => categories.push(category),
                Ok(_) => {}
                Err(_) => unknown.push(name),
            }
        }
        if !unknown.is_empty() {
            errors.push(FieldError::new(
                "categories",
                format!("Unsupported categories: {}", unknown.join(", ")),
            ));
        }
        if categories.is_empty() {
            categories = Category::ALL.to_vec();
        }

        if !errors.is_empty() {
            return Err(SearchError::InvalidRequest(ValidationErrors { fields: errors }));
        }
        Ok(Self {
            location,
            radius_km,
            categories,
            with_email_enrichment: body.with_email_enrichment,
        })
    }
}

/// A category whose query exhausted every mirror.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CategoryWarning {
    pub category: Category,
    pub message: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct SearchResult {
    pub location_label: String,
    pub radius_km: f64,
    pub categories: Vec<Category>,
    pub results: Vec<Place>,
    pub warnings: Vec<CategoryWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(
        location: &str,
        radius_km: Option<f64>,
        categories: Option<&[&str]>,
    ) -> SearchRequestBody {
        SearchRequestBody {
            location: Some(location.to_owned()),
            radius_km,
            categories: categories.map(|c| c.iter().map(|s| (*s).to_owned()).collect()),
            with_email_enrichment: false,
        }
    }

    #[test]
    fn defaults_to_all_categories_and_five_km() {
        let request = SearchRequest::try_from(body("  San Diego, CA ", None, None)).unwrap();
        assert_eq!(request.location, "San Diego, CA");
        assert_eq!(request.radius_km, 5.0);
        assert_eq!(request.categories, Category::ALL.to_vec());
        assert_eq!(request.radius_m(), 5000);
    }

    #[test]
    fn keeps_request_order_and_collapses_duplicates() {
        let categories: &[&str] = &["hotel", "school", "hotel"];
        let request = SearchRequest::try_from(body("Austin", Some(2.0), Some(categories))).unwrap();
        assert_eq!(request.categories, vec![Category::Hotel, Category::School]);
    }

    #[test]
    fn empty_category_list_means_all() {
        let request = SearchRequest::try_from(body("Austin", Some(2.0), Some(&[]))).unwrap();
        assert_eq!(request.categories.len(), 4);
    }

    #[test]
    fn collects_every_field_error() {
        let err = SearchRequest::try_from(body("   ", Some(25.0), Some(&["museum"]))).unwrap_err();
        let errors = match err {
            SearchError::InvalidRequest(errors) => errors,
            other => panic!("expected validation failure, got {other:?}"),
        };
        let fields: Vec<&str> = errors.fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(fields, ["location", "radius_km", "categories"]);
    }

    #[test]
    fn radius_bounds_are_inclusive() {
        assert!(SearchRequest::new("x", 1.0, &[Category::School]).is_ok());
        assert!(SearchRequest::new("x", 20.0, &[Category::School]).is_ok());
        assert!(SearchRequest::new("x", 0.5, &[Category::School]).is_err());
        assert!(SearchRequest::new("x", f64::NAN, &[Category::School]).is_err());
    }

    #[test]
    fn enrichment_is_off_unless_asked_for() {
        let body: SearchRequestBody = serde_json::from_str(r#"{"location": "Austin"}"#).unwrap();
        assert!(!SearchRequest::try_from(body).unwrap().with_email_enrichment);

        let body: SearchRequestBody =
            serde_json::from_str(r#"{"location": "Austin", "with_email_enrichment": true}"#)
                .unwrap();
        assert!(SearchRequest::try_from(body).unwrap().with_email_enrichment);
    }
}
