use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Form, Router,
};
use tracing::{error, info};

use crate::middleware::CurrentSession;
use crate::models::{AppState, ChatForm};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/download_response", get(download_response))
        .route("/copy_response", post(copy_response))
        .with_state(state)
}

pub async fn chat(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Form(form): Form<ChatForm>,
) -> Redirect {
    info!(session_id = %current.id, question_len = form.question.len(), "Received question");

    // held for the whole turn so same-session requests queue up
    let mut session = current.handle.lock().await;
    if let Err(e) = state.pipeline().run(&mut session, &form.question).await {
        session.flash(e.to_string());
    }

    Redirect::to("/")
}

pub async fn download_response(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Response {
    let mut session = current.handle.lock().await;
    let Some(response) = session.response.clone().filter(|r| !r.is_empty()) else {
        session.flash("No response available to download.");
        return Redirect::to("/").into_response();
    };

    let path = state.config.storage.response_path();
    if let Err(e) = write_response_file(&path, &response).await {
        error!(path = %path.display(), error = %e, "Failed to write response file");
        session.flash(e.to_string());
        return Redirect::to("/").into_response();
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"response.txt\""),
        ],
        response,
    )
        .into_response()
}

async fn write_response_file(path: &std::path::Path, response: &str) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(path, response).await
}

pub async fn copy_response(Extension(current): Extension<CurrentSession>) -> Redirect {
    let mut session = current.handle.lock().await;
    if session.has_response() {
        session.flash("Response copied to clipboard.");
    } else {
        session.flash("No response available to copy.");
    }
    Redirect::to("/")
}
