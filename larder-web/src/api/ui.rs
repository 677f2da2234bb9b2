//! Embedded static assets

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::AppState;

const LARDER_CSS: &str = include_str!("../../ui/larder.css");
const NOTES_JS: &str = include_str!("../../ui/notes.js");

/// GET /static/larder.css
pub async fn serve_larder_css() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        LARDER_CSS,
    )
        .into_response()
}

/// GET /static/notes.js
pub async fn serve_notes_js() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/javascript")],
        NOTES_JS,
    )
        .into_response()
}

pub fn static_routes() -> Router<AppState> {
    Router::new()
        .route("/static/larder.css", get(serve_larder_css))
        .route("/static/notes.js", get(serve_notes_js))
}
