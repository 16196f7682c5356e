use axum::{
    extract::State,
    response::Redirect,
    routing::get,
    Extension, Router,
};
use tracing::info;

use crate::middleware::CurrentSession;
use crate::models::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/logout", get(logout))
        .with_state(state)
}

/// Clear the session and delete its uploads that no other session still references
pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Redirect {
    let removed = {
        let mut session = current.handle.lock().await;
        let removed = session.clear();
        session.flash("You have been logged out.");
        removed
    };

    let orphaned = state
        .sessions
        .documents()
        .release_all(&removed, &state.storage())
        .await;

    info!(session_id = %current.id, removed = orphaned.len(), "Session cleared");
    Redirect::to("/")
}
