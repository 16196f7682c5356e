//! HTTP Routes
//!
//! Form posts answer with a redirect to `/`; outcomes are shown as flash
//! messages on the next page render.
//! - `/` - home page
//! - `/upload`, `/get_file/{filename}` - documents
//! - `/chat`, `/download_response`, `/copy_response` - questions and answers
//! - `/logout` - clear the session
//! - `/static/*` - generated chart, report and response files
//! - `/api/health` - health check

pub mod chat;
pub mod files;
pub mod health;
pub mod session;
pub mod static_files;
pub mod ui;

use axum::{extract::DefaultBodyLimit, middleware::from_fn_with_state, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::session_layer;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    // Only the pages and form posts carry a session
    let pages = Router::new()
        .merge(ui::router(state.clone()))
        .merge(files::router(state.clone()))
        .merge(chat::router(state.clone()))
        .merge(session::router(state.clone()))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(from_fn_with_state(state.clone(), session_layer));

    Router::new()
        .merge(pages)
        .merge(health::router(state.clone()))
        .merge(static_files::router(&state.config.storage))
        .layer(TraceLayer::new_for_http())
}
