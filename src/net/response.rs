use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::error::SearchError;

pub struct ResponseError(Response);

impl IntoResponse for ResponseError {
    fn into_response(self) -> Response {
        self.0
    }
}

impl From<SearchError> for ResponseError {
    fn from(error: SearchError) -> Self {
        let status = status_for(&error);
        if status.is_server_error() {
            warn!(error = %error, %status, "search request failed");
        }
        let body = match &error {
            SearchError::InvalidRequest(errors) => json!({
                "error": error.code(),
                "fields": errors.fields,
            }),
            _ => json!({
                "error": error.code(),
                "detail": error.to_string(),
            }),
        };
        Self::with_status(status, Json(body))
    }
}

pub fn status_for(error: &SearchError) -> StatusCode {
    match error {
        SearchError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SearchError::LocationNotFound(_) => StatusCode::NOT_FOUND,
        SearchError::UpstreamUnavailable(_) | SearchError::OverpassUnavailable(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        SearchError::Export(_) | SearchError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError {
    pub fn with_status<T>(status_code: StatusCode, data: T) -> Self
    where
        (StatusCode, T): IntoResponse,
    {
        ResponseError((status_code, data).into_response())
    }
}

pub type Result<T, E = ResponseError> = axum::response::Result<T, E>;
