// Session middleware: attaches the caller's session to every request

use axum::{
    extract::{Request, State},
    http::header::{HeaderValue, COOKIE, SET_COOKIE},
    middleware::Next,
    response::Response,
};
use tracing::warn;
use uuid::Uuid;

use crate::models::AppState;
use crate::session::{cookie, SessionHandle};

/// The session resolved for the current request
#[derive(Clone)]
pub struct CurrentSession {
    pub id: Uuid,
    pub handle: SessionHandle,
}

pub async fn session_layer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let presented = req
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|header| cookie::find_in_header(header).map(str::to_string));

    let (id, handle, created) = state.sessions.resolve(presented.as_deref()).await;
    req.extensions_mut().insert(CurrentSession { id, handle });

    let mut response = next.run(req).await;

    if created {
        let value = cookie::set_cookie_header(&state.sessions.cookie_value(id));
        match HeaderValue::from_str(&value) {
            Ok(header) => {
                response.headers_mut().append(SET_COOKIE, header);
            }
            Err(e) => warn!(error = %e, "Could not encode session cookie"),
        }
    }

    response
}
