// HTTP request handlers
use crate::application::errors::ReportError;
use crate::application::report_request::{ReportParams, ReportRequest};
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub title: &'static str,
    pub description: String,
}

impl From<&ReportError> for ErrorBody {
    fn from(error: &ReportError) -> Self {
        match error {
            ReportError::Validation { field } => Self {
                title: "API.BAD_REQUEST",
                description: field.to_string(),
            },
            ReportError::NotFound { what } => Self {
                title: "API.NOT_FOUND",
                description: what.to_string(),
            },
            ReportError::DataSource(_) | ReportError::Render(_) => Self {
                title: "API.INTERNAL_ERROR",
                description: error.to_string(),
            },
        }
    }
}

fn status_of(error: &ReportError) -> StatusCode {
    match error {
        ReportError::Validation { .. } => StatusCode::BAD_REQUEST,
        ReportError::NotFound { .. } => StatusCode::NOT_FOUND,
        ReportError::DataSource(_) | ReportError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn error_response(error: ReportError, compress: bool) -> Response {
    let status = status_of(&error);
    if status.is_server_error() {
        tracing::error!(error = %error, "Space statistics report failed");
    } else {
        tracing::warn!(error = %error, "Rejected space statistics request");
    }

    match json_response(status, &ErrorBody::from(&error), compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Space statistics report for one space and period type
pub async fn space_statistics(
    Query(params): Query<ReportParams>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);
    let service = &state.report_service;

    let request = match ReportRequest::parse(&params, service.utc_offset()) {
        Ok(request) => request,
        Err(error) => return error_response(error, compress).await,
    };

    match service.build(&request).await {
        Ok(document) => match json_response(StatusCode::OK, &document, compress).await {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        Err(error) => error_response(error, compress).await,
    }
}
