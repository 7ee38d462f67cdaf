use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::header,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::instrument;

use crate::{
    error::{FieldError, SearchError, ValidationErrors},
    export::{self, CsvExport},
    net::response::Result,
    overpass::AdminArea,
    search::SearchService,
    types::{SearchRequest, SearchRequestBody, SearchResult},
};

#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
}

impl AppState {
    pub fn new(search: SearchService) -> Self {
        Self {
            search: Arc::new(search),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/search", post(search_places))
        .route("/api/export", post(export_places))
        .route("/api/california/export", get(export_california))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Deserialize, Debug, Default)]
struct AreaExportParams {
    #[serde(default)]
    with_email_enrichment: bool,
}

/// A body that does not deserialize is reported like any other invalid field.
fn malformed(field: &str, message: String) -> SearchError {
    SearchError::InvalidRequest(ValidationErrors {
        fields: vec![FieldError::new(field, message)],
    })
}

fn validate(
    body: std::result::Result<Json<SearchRequestBody>, JsonRejection>,
) -> std::result::Result<SearchRequest, SearchError> {
    let Json(body) = body.map_err(|rejection| malformed("body", rejection.body_text()))?;
    SearchRequest::try_from(body)
}

fn csv_response(export: CsvExport) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export.filename),
            ),
        ],
        export.bytes,
    )
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "FindYourPlace API is running" }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[instrument(skip(state, body))]
async fn search_places(
    State(state): State<AppState>,
    body: std::result::Result<Json<SearchRequestBody>, JsonRejection>,
) -> Result<Json<SearchResult>> {
    let request = validate(body)?;
    Ok(Json(state.search.search(&request).await?))
}

#[instrument(skip(state, body))]
async fn export_places(
    State(state): State<AppState>,
    body: std::result::Result<Json<SearchRequestBody>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let request = validate(body)?;
    let export = export::export(&state.search, &request).await?;
    Ok(csv_response(export))
}

#[instrument(skip(state, params))]
async fn export_california(
    State(state): State<AppState>,
    params: std::result::Result<Query<AreaExportParams>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(params) = params.map_err(|rejection| malformed("query", rejection.body_text()))?;
    let export = export::export_area(
        &state.search,
        &AdminArea::CALIFORNIA,
        params.with_email_enrichment,
    )
    .await?;
    Ok(csv_response(export))
}
