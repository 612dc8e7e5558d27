//! HTTP service
//!
//! Routes:
//! - `GET /` liveness message
//! - `POST /upload/` rewrite page margins of an uploaded PDF
//! - `POST /login` issue a session token
//! - `POST /logout` invalidate a session token

pub mod error;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::Result;

pub use error::ApiError;
pub use state::AppState;

/// CORS policy allowing credentialed requests from the configured origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Build the application router
pub fn router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/upload/", post(handlers::upload))
        .route("/upload", post(handlers::upload))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

/// Open the user store and serve until the process is stopped
pub async fn serve(config: ServerConfig) -> Result<()> {
    let state = Arc::new(AppState::from_config(&config).await?);
    let app = router(state, &config);

    info!("Starting PDF margin API on http://{}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
