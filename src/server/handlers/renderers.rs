//! Renderer introspection and preview handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::{ApiError, reject_local_params};
use crate::payload::RenderedPayload;
use crate::registry::{Params, RendererInfo};
use crate::renderers::RenderRequest;

use super::super::state::AppState;

/// Device id used for previews; nothing is delivered.
const PREVIEW_DEVICE: &str = "preview";

/// GET /api/renderers - Registered types with their parameter contracts.
pub async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<RendererInfo>> {
    Json(state.registry.list_types())
}

/// POST /api/renderers/:kind/preview - Render without delivering.
///
/// Bitmaps come back as `image/png`, text cards as JSON. Local file
/// parameters are refused; `image_url` is still fetched.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Json(params): Json<Params>,
) -> Result<Response, ApiError> {
    reject_local_params(&params)?;
    let entry = state.registry.resolve(&kind)?;
    entry.contract.validate(&kind, &params)?;

    let request = RenderRequest::new(PREVIEW_DEVICE, params);
    match entry.renderer.produce(&state.context, &request).await? {
        RenderedPayload::Bitmap(bitmap) => {
            let png = bitmap.to_png()?;
            Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
        }
        RenderedPayload::Text(text) => Ok(Json(text).into_response()),
    }
}
