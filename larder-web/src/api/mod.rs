//! HTTP handlers for larder-web

pub mod auth;
pub mod health;
pub mod inventory;
pub mod notes;
pub mod recipe;
pub mod shopping;
pub mod ui;

use std::sync::Arc;

use axum::response::Html;
use larder_common::Pantry;

use crate::pages::layout;
use crate::session::SessionId;
use crate::{ApiResult, AppState};

pub use auth::{change_page, change_password, login, login_page, logout, signup, signup_page};
pub use health::health_routes;
pub use inventory::{add_ingredient, add_page, home, take_ingredient, taking_page};
pub use notes::notes_page;
pub use recipe::recipe_page;
pub use shopping::{remove_standard_item, shopping_page, update_standard_items};
pub use ui::static_routes;

/// Run a pantry operation on the blocking pool
pub(crate) async fn with_pantry<T, F>(state: &AppState, op: F) -> ApiResult<T>
where
    F: FnOnce(&Pantry) -> larder_common::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pantry = Arc::clone(&state.pantry);
    Ok(tokio::task::spawn_blocking(move || op(&pantry)).await??)
}

/// Render `body` inside the layout, consuming the session's flashes
pub(crate) async fn render(
    state: &AppState,
    session: &SessionId,
    user: Option<&str>,
    title: &str,
    body: &str,
) -> Html<String> {
    let flashes = state.sessions.take_flashes(session).await;
    Html(layout(title, user, &flashes, body))
}
