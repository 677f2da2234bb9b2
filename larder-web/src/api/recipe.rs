//! Recipe suggestions page

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Extension,
};

use super::{inventory::inventory_table, render, with_pantry};
use crate::pages::escape;
use crate::session::{CurrentUser, SessionId};
use crate::{ApiResult, AppState};

/// GET /recipe
///
/// Blocks on the advisor; its answer (or failure text) is shown verbatim.
pub async fn recipe_page(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    let inventory = with_pantry(&state, |p| p.inventory()).await?;
    let suggestions = state.advisor.suggest(&inventory).await;

    let body = format!(
        r#"<h2>Recipe suggestions</h2>
<section class="card"><h3>Your ingredients</h3>{table}</section>
<section class="card recipes"><pre>{suggestions}</pre></section>"#,
        table = inventory_table(&inventory),
        suggestions = escape(&suggestions),
    );
    Ok(render(&state, &session, Some(&user), "Recipes", &body)
        .await
        .into_response())
}
