//! Shopping list page and standard-item management

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use larder_common::pantry::StandardOutcome;
use larder_common::{time, Error, Ingredient, ShoppingItem};
use serde::Deserialize;

use super::{render, with_pantry};
use crate::pages::escape;
use crate::session::{CurrentUser, FlashLevel, SessionId};
use crate::{ApiError, ApiResult, AppState};

/// Either field selects the action; `name` wins when both are sent
#[derive(Debug, Deserialize)]
pub struct StandardForm {
    pub name: Option<String>,
    pub remove_name: Option<String>,
}

fn shopping_table(list: &[ShoppingItem]) -> String {
    if list.is_empty() {
        return r#"<p class="empty">Nothing to buy.</p>"#.to_string();
    }
    let rows: String = list
        .iter()
        .map(|item| {
            format!(
                r#"<tr class="priority-{priority}"><td>{name}</td><td>{details}</td><td>{reason}</td><td>{priority}</td><td>{kind}</td></tr>
"#,
                priority = item.priority,
                name = escape(&item.name),
                details = escape(&item.details),
                reason = escape(&item.reason),
                kind = item.kind,
            )
        })
        .collect();
    format!(
        r#"<table>
<thead><tr><th>Item</th><th>Details</th><th>Reason</th><th>Priority</th><th>Type</th></tr></thead>
<tbody>
{rows}</tbody>
</table>"#
    )
}

fn standard_items(standard: &[Ingredient]) -> String {
    if standard.is_empty() {
        return r#"<p class="empty">No standard items yet.</p>"#.to_string();
    }
    let rows: String = standard
        .iter()
        .map(|s| {
            format!(
                r#"<li>{name}
    <form method="post" action="/shoppinglist" class="inline">
        <input type="hidden" name="remove_name" value="{name}">
        <button type="submit" class="remove">Remove</button>
    </form>
    <a class="remove" href="/remove_singredient/{path}">x</a>
</li>
"#,
                name = escape(&s.name),
                path = urlencoding::encode(&s.name),
            )
        })
        .collect();
    format!("<ul>\n{}</ul>", rows)
}

/// GET /shoppinglist
pub async fn shopping_page(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Response> {
    let today = time::today();
    let (list, standard) = with_pantry(&state, move |p| {
        Ok((p.shopping_list(today)?, p.standard_items()?))
    })
    .await?;

    let body = format!(
        r#"<h2>Shopping list</h2>
<section class="card">{table}</section>
<section class="card">
    <h3>Standard items</h3>
    <form method="post" action="/shoppinglist">
        <label>Always keep <input type="text" name="name" required></label>
        <button type="submit">Add standard item</button>
    </form>
    {standard}
</section>"#,
        table = shopping_table(&list),
        standard = standard_items(&standard),
    );
    Ok(render(&state, &session, Some(&user), "Shopping list", &body)
        .await
        .into_response())
}

async fn remove_and_flash(state: &AppState, session: &SessionId, name: String) -> ApiResult<()> {
    let target = name.clone();
    let removed = with_pantry(state, move |p| p.remove_standard(&target)).await?;
    let (level, message) = if removed {
        (
            FlashLevel::Success,
            format!("Removed {} from standard ingredients", name),
        )
    } else {
        (
            FlashLevel::Error,
            format!("{} not found in standard ingredients", name),
        )
    };
    state.sessions.flash(session, level, message).await;
    Ok(())
}

/// POST /shoppinglist
pub async fn update_standard_items(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Form(form): Form<StandardForm>,
) -> ApiResult<Redirect> {
    if let Some(name) = form.name {
        let name = name.trim().to_string();
        if !name.is_empty() {
            let today = time::today();
            let target = name.clone();
            let (level, message) =
                match with_pantry(&state, move |p| p.add_standard(&target, today)).await {
                    Ok(StandardOutcome::Added(_)) => (
                        FlashLevel::Success,
                        format!("Added {} to standard ingredients", name),
                    ),
                    Ok(StandardOutcome::AlreadyPresent) => (
                        FlashLevel::Warning,
                        format!("{} is already a standard ingredient", name),
                    ),
                    Err(ApiError::Common(Error::InvalidInput(message))) => {
                        (FlashLevel::Error, message)
                    }
                    Err(e) => return Err(e),
                };
            state.sessions.flash(&session, level, message).await;
        }
    } else if let Some(name) = form.remove_name {
        remove_and_flash(&state, &session, name.trim().to_string()).await?;
    }

    Ok(Redirect::to("/shoppinglist"))
}

/// GET /remove_singredient/:name
pub async fn remove_standard_item(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(name): Path<String>,
) -> ApiResult<Redirect> {
    remove_and_flash(&state, &session, name.trim().to_string()).await?;
    Ok(Redirect::to("/shoppinglist"))
}
