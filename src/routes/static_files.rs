//! Generated artifacts (chart, report, downloaded response) under `/static`

use axum::Router;
use tower_http::services::ServeDir;
use tracing::info;

use crate::config::StorageConfig;

pub fn router(storage: &StorageConfig) -> Router {
    let static_dir = storage.static_dir();
    info!(path = %static_dir.display(), "Serving static artifacts");
    Router::new().nest_service("/static", ServeDir::new(static_dir))
}
