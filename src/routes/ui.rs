use std::path::Path;

use axum::{extract::State, response::Html, routing::get, Extension, Router};
use chrono::Datelike;

use crate::middleware::CurrentSession;
use crate::models::AppState;
use crate::session::Session;
use crate::utils::escape_html;

pub fn router(state: AppState) -> Router {
    Router::new().route("/", get(index)).with_state(state)
}

async fn index(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
) -> Html<String> {
    let (snapshot, flashes) = {
        let mut session = current.handle.lock().await;
        let flashes = session.take_flashes();
        (session.clone(), flashes)
    };
    Html(render_page(&snapshot, &flashes, &state.config.storage.static_dir()))
}

/// `/static/...` URL for an artifact stored under `static_dir`
fn static_url(path: &Path, static_dir: &Path) -> Option<String> {
    let relative = path.strip_prefix(static_dir).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(format!("/static/{}", parts.join("/")))
}

const HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>DocuChat</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 2rem auto; max-width: 960px; color: #1d1d1f; }
    h1 { margin-bottom: 0.5rem; }
    .card { border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; }
    .flash { background: #fff8e1; border-left: 4px solid #ffb300; padding: 0.5rem 1rem; margin-bottom: 0.5rem; }
    textarea { width: 100%; padding: 0.5rem; }
    button { margin-top: 0.5rem; padding: 0.5rem 1rem; }
    .history dt { font-weight: 600; margin-top: 0.75rem; }
    img.chart { max-width: 100%; }
    footer { margin-top: 2rem; color: #777; font-size: 0.9em; }
  </style>
</head>
<body>
  <h1>DocuChat</h1>
  <p>Upload documents, then ask questions about them.</p>
"#;

pub fn render_page(session: &Session, flashes: &[String], static_dir: &Path) -> String {
    let mut page = String::from(HEAD);

    for message in flashes {
        page.push_str(&format!("  <div class=\"flash\">{}</div>\n", escape_html(message)));
    }

    page.push_str(
        r#"  <div class="card">
    <h2>Upload a document</h2>
    <form action="/upload" method="post" enctype="multipart/form-data">
      <input type="file" name="file" accept=".txt,.pdf,.docx,.csv,.xls,.xlsx" />
      <button type="submit">Upload</button>
    </form>
"#,
    );
    if session.documents.is_empty() {
        page.push_str("    <p>No documents loaded.</p>\n");
    } else {
        page.push_str("    <ul>\n");
        for doc in &session.documents {
            let name = escape_html(&doc.name);
            page.push_str(&format!(
                "      <li><a href=\"/get_file/{}\">{}</a></li>\n",
                name, name
            ));
        }
        page.push_str("    </ul>\n");
    }
    page.push_str("  </div>\n");

    page.push_str(
        r#"  <div class="card">
    <h2>Ask a question</h2>
    <form action="/chat" method="post">
      <textarea name="question" rows="3" placeholder="e.g. Show the BMI distribution"></textarea>
      <button type="submit">Ask</button>
    </form>
  </div>
"#,
    );

    if let Some(response) = session.response.as_deref().filter(|r| !r.is_empty()) {
        // stored answers are escaped when they are formatted
        page.push_str(&format!(
            r#"  <div class="card">
    <h2>Response</h2>
    <div id="response">{}</div>
    <a href="/download_response">Download</a>
    <form action="/copy_response" method="post" style="display:inline">
      <button type="submit">Copy</button>
    </form>
  </div>
"#,
            response
        ));
    }

    if let Some(url) = session.chart_path.as_deref().and_then(|p| static_url(p, static_dir)) {
        let version = chrono::Utc::now().timestamp_millis();
        page.push_str(&format!(
            "  <div class=\"card\">\n    <h2>Chart</h2>\n    <img class=\"chart\" src=\"{}?v={}\" alt=\"Chart\" />\n  </div>\n",
            url, version
        ));
    }

    if let Some(url) = session.report_path.as_deref().and_then(|p| static_url(p, static_dir)) {
        page.push_str(&format!(
            "  <div class=\"card\">\n    <h2>Report</h2>\n    <a href=\"{}\">View report</a>\n  </div>\n",
            url
        ));
    }

    if !session.history.is_empty() {
        page.push_str("  <div class=\"card history\">\n    <h2>History</h2>\n    <dl>\n");
        for entry in &session.history {
            page.push_str(&format!(
                "      <dt>{}</dt>\n      <dd>{}</dd>\n",
                escape_html(&entry.question),
                entry.response
            ));
        }
        page.push_str("    </dl>\n  </div>\n");
    }

    page.push_str(&format!(
        "  <p><a href=\"/logout\">Logout</a></p>\n  <footer>&copy; {} DocuChat</footer>\n</body>\n</html>\n",
        chrono::Local::now().year()
    ));
    page
}
