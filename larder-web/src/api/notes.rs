//! Notes page; the notes themselves live in the browser's local storage

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension,
};

use super::render;
use crate::session::{CurrentUser, SessionId};
use crate::AppState;

/// GET /notes
pub async fn notes_page(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Response {
    let body = r#"<h2>Notes</h2>
<section class="card">
    <form id="note-form">
        <label>Note <textarea id="note-input" rows="4" required></textarea></label>
        <button type="submit">Save note</button>
    </form>
</section>
<section id="notes-list"></section>
<script src="/static/notes.js"></script>"#;
    render(&state, &session, Some(&user), "Notes", body)
        .await
        .into_response()
}
