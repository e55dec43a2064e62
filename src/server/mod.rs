//! HTTP service exposing the extraction pipeline to the web client.

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, Method, header},
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::settings::Settings;
use handlers::{handle_extract, handle_health};

/// Shared application state. Requests never mutate it.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
}

/// CORS policy for the browser client: any origin, GET/POST/OPTIONS and the
/// two headers the client sends.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
        ])
}

pub fn router(settings: Arc<Settings>) -> Router {
    let body_limit = settings.max_upload_bytes;
    let state = AppState { settings };

    Router::new()
        .route("/health", get(handle_health))
        .route("/api/manual", post(handle_extract))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer())
        .with_state(state)
}

pub async fn serve(settings: Settings) -> crate::error::Result<()> {
    let addr = settings.bind_addr();
    let app = router(Arc::new(settings));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
