//! Manual push and schedule listing handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, reject_local_params};
use crate::registry::Params;
use crate::schedule::EntrySnapshot;

use super::super::state::AppState;

#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub device_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: &'static str,
}

/// POST /api/devices/:device/push/:kind - Render and deliver now.
pub async fn push(
    State(state): State<Arc<AppState>>,
    Path((device, kind)): Path<(String, String)>,
    Json(params): Json<Params>,
) -> Result<Json<PushResponse>, ApiError> {
    reject_local_params(&params)?;
    let device = state
        .device(&device)
        .ok_or_else(|| ApiError(StatusCode::NOT_FOUND, format!("Device '{}' not found", device)))?;

    let payload = state.engine.fire_now(&device.device_id, &kind, params).await?;

    Ok(Json(PushResponse {
        device_id: device.device_id.clone(),
        kind,
        payload: payload.shape(),
    }))
}

/// GET /api/schedules - Loaded schedule entries and their next fire times.
pub async fn schedules(State(state): State<Arc<AppState>>) -> Json<Vec<EntrySnapshot>> {
    Json(state.engine.entries())
}
