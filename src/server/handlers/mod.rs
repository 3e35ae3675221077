//! HTTP handlers for the server.

pub mod devices;
pub mod renderers;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::DotmateError;
use crate::registry::Params;

/// A library error rendered as `{"error": "..."}` with a matching status.
pub struct ApiError(pub StatusCode, pub String);

impl From<DotmateError> for ApiError {
    fn from(e: DotmateError) -> Self {
        let status = match &e {
            DotmateError::UnknownRendererKind(_)
            | DotmateError::ParameterValidationFailed { .. }
            | DotmateError::Image(_) => StatusCode::BAD_REQUEST,
            DotmateError::ExternalDataUnavailable { .. } | DotmateError::Transport(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

/// Parameters that read the server's filesystem; refused over HTTP.
const LOCAL_ONLY_PARAMS: &[&str] = &["image_path"];

fn reject_local_params(params: &Params) -> Result<(), ApiError> {
    match LOCAL_ONLY_PARAMS.iter().find(|name| params.contains_key(**name)) {
        Some(name) => Err(ApiError(
            StatusCode::BAD_REQUEST,
            format!("'{}' is not allowed over the API", name),
        )),
        None => Ok(()),
    }
}
