//! # Preview and Administration HTTP Server
//!
//! A small JSON API for config editors and manual pushes.
//!
//! ## Usage
//!
//! ```bash
//! dotmate serve --listen 127.0.0.1:8080
//! curl -X POST localhost:8080/api/renderers/title_image/preview \
//!      -H 'content-type: application/json' -d '{"main_title": "Lunch"}' > lunch.png
//! ```
//!
//! ## Routes
//!
//! | Method | Path                               | Result                           |
//! |--------|------------------------------------|----------------------------------|
//! | GET    | `/api/renderers`                   | types and parameter contracts    |
//! | POST   | `/api/renderers/:kind/preview`     | PNG (bitmap) or JSON (text card) |
//! | POST   | `/api/devices/:device/push/:kind`  | renders and delivers now         |
//! | GET    | `/api/schedules`                   | loaded schedule entries          |
//!
//! ## Exposure
//!
//! There is no authentication. Bind to localhost unless the network is
//! trusted. `image_path` is refused on every route; `image_url` is fetched
//! by the server, so any caller can make it issue GET requests.

mod handlers;
mod state;

pub use state::{AppState, ServerConfig};

use axum::{
    Router,
    routing::{get, post},
};
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::DotmateError;

/// Build the router (also used by tests with an ephemeral listener).
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/renderers", get(handlers::renderers::list))
        .route(
            "/api/renderers/:kind/preview",
            post(handlers::renderers::preview),
        )
        .route(
            "/api/devices/:device/push/:kind",
            post(handlers::devices::push),
        )
        .route("/api/schedules", get(handlers::devices::schedules))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server and run until `shutdown` resolves.
pub async fn serve(
    config: ServerConfig,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), DotmateError> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            DotmateError::Config(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    info!(listen = %config.listen_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
