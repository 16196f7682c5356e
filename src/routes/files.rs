use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Extension, Router,
};
use tracing::{error, info, warn};

use crate::middleware::CurrentSession;
use crate::models::{AppState, Document};
use crate::storage::Storage;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload", post(upload))
        .route("/get_file/{filename}", get(get_file))
        .with_state(state)
}

/// Outcome of reading the multipart body
enum UploadField {
    Missing,
    Unnamed,
    File { filename: String, data: Vec<u8> },
}

async fn read_file_field(multipart: &mut Multipart) -> UploadField {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return UploadField::Missing,
            Err(e) => {
                warn!(error = %e, "Malformed multipart body");
                return UploadField::Missing;
            }
        };

        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return UploadField::Unnamed;
        }

        return match field.bytes().await {
            Ok(data) => UploadField::File {
                filename,
                data: data.to_vec(),
            },
            Err(e) => {
                warn!(error = %e, file = %filename, "Failed to read upload");
                UploadField::Missing
            }
        };
    }
}

pub async fn upload(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    mut multipart: Multipart,
) -> Redirect {
    let field = read_file_field(&mut multipart).await;
    let mut session = current.handle.lock().await;

    let (filename, data) = match field {
        UploadField::Missing => {
            session.flash("No file part");
            return Redirect::to("/");
        }
        UploadField::Unnamed => {
            session.flash("No selected file");
            return Redirect::to("/");
        }
        UploadField::File { filename, data } => (filename, data),
    };

    let name = match Storage::accept_filename(&filename) {
        Ok((name, _)) => name,
        Err(e) => {
            info!(file = %filename, "Rejected upload");
            session.flash(e.to_string());
            return Redirect::to("/");
        }
    };

    let storage = state.storage();
    let refs = state.sessions.documents();
    let path = storage.documents_dir().join(&name);

    // Retained before writing; a concurrent release of the same path keeps the file
    refs.retain(&path).await;
    match storage.save_document(&name, &data).await {
        Ok(path) => {
            info!(session_id = %current.id, file = %name, "Document uploaded");
            session.documents.push(Document {
                name: name.clone(),
                path,
            });
            session.flash(format!("Loaded document: {}", name));
        }
        Err(e) => {
            error!(file = %name, error = %e, "Failed to store upload");
            refs.release(&path).await;
            session.flash(e.to_string());
        }
    }

    Redirect::to("/")
}

pub async fn get_file(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(filename): Path<String>,
) -> Response {
    let storage = state.storage();
    let found = match storage.document_path(&filename) {
        Some(path) => tokio::fs::read(&path).await.ok(),
        None => None,
    };

    let Some(data) = found else {
        warn!(file = %filename, "Requested file not found");
        current.handle.lock().await.flash("File not found.");
        return Redirect::to("/").into_response();
    };

    let mime = mime_guess::from_path(&filename).first_or_octet_stream();
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        data,
    )
        .into_response()
}
